pub mod handler;
pub mod models;
pub mod page;
pub mod payload;
pub mod store;

pub use handler::create_photo_router;
pub use models::{DeleteResponse, PhotoEntry, PhotoListResponse, UploadResponse};
pub use store::PhotoStore;
