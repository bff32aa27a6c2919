pub mod document_ctx;
pub mod upload_client;

pub use document_ctx::DocumentCtx;
pub use upload_client::UploadClient;
