pub mod config;
pub mod error;
pub mod types;

pub use config::{StaticConfig, StaticConfigStore};
pub use error::{AnatomyError, Result};
