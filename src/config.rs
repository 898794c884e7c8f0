use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 默认配置文件路径（可通过 `APP_CONFIG` 覆盖）
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 照片保存目录（扁平目录，启动时自动创建）
    #[serde(default = "StorageConfig::default_upload_dir")]
    pub upload_dir: String,
    /// 静态文件目录（拍摄页面等）
    #[serde(default = "StorageConfig::default_static_dir")]
    pub static_dir: String,
    /// 上传请求体上限（字节）
    #[serde(default = "StorageConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    fn default_upload_dir() -> String {
        "uploads".to_string()
    }
    fn default_static_dir() -> String {
        "public".to_string()
    }
    fn default_max_upload_bytes() -> usize {
        20 * 1024 * 1024
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: Self::default_upload_dir(),
            static_dir: Self::default_static_dir(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 未设置时生效）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "photo_capture=info,tower_http=info".to_string(),
        }
    }
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// 是否启用 CORS
    #[serde(default = "CorsConfig::default_enabled")]
    pub enabled: bool,
    /// 允许的 Origin 列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_origins: Vec<String>,
    /// 允许的方法列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_methods: Vec<String>,
    /// 允许的请求头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub allowed_headers: Vec<String>,
    /// 暴露的响应头列表（支持 "*" 表示任意）
    #[serde(default)]
    pub expose_headers: Vec<String>,
    /// 是否允许携带凭证（Cookie/Authorization）
    #[serde(default)]
    pub allow_credentials: bool,
    /// 预检缓存时间（秒）
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

impl CorsConfig {
    fn default_enabled() -> bool {
        true
    }

    /// 拍摄页面可能由其它源（如本地文件）打开，默认放开所有来源。
    fn permissive() -> Self {
        Self {
            enabled: Self::default_enabled(),
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec!["*".to_string()],
            expose_headers: vec!["x-request-id".to_string()],
            allow_credentials: false,
            max_age_secs: Some(600),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::permissive()
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        10
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// CORS 配置
    #[serde(default)]
    pub cors: CorsConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 加载配置：内置默认值 < 配置文件（可缺省）< 环境变量
    ///
    /// 环境变量以 `APP_` 为前缀、`__` 分隔层级，例如 `APP_SERVER__PORT=8080`、
    /// `APP_STORAGE__UPLOAD_DIR=/data/photos`。
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path();

        tracing::info!("正在从 {:?} 加载配置文件（不存在时使用默认值）", config_path);

        let builder = ConfigBuilder::builder()
            .add_source(ConfigBuilder::try_from(&AppConfig::default())?)
            .add_source(File::from(config_path).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取配置文件路径
    fn get_config_path() -> PathBuf {
        std::env::var("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取照片保存目录
    pub fn upload_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.upload_dir)
    }

    /// 获取静态文件目录
    pub fn static_path(&self) -> PathBuf {
        PathBuf::from(&self.storage.static_dir)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
            },
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            shutdown: ShutdownConfig::default(),
        }
    }
}
