pub mod config;
pub mod error;
pub mod types;

pub use config::DictareConfig;
pub use error::{DictareError, Result};
pub use types::*;
