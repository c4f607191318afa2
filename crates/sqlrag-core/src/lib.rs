pub mod config;
pub mod error;
pub mod types;

pub use config::SqlRagConfig;
pub use error::{Result, SqlRagError};
pub use types::*;
