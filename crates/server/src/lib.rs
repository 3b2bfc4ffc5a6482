pub mod config;
pub mod error;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod upload;

pub use config::{LogFormat, ServerConfig};
pub use error::AppError;
pub use startup::{router, AppState};
pub use upload::UploadConfig;
