/// 健康检查
pub mod health;
/// 照片存储与相关接口
pub mod photo;
