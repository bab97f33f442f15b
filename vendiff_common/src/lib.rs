pub mod config;
pub mod error;
pub mod patch_types;
pub mod types;

pub use config::*;
pub use error::*;
pub use patch_types::*;
pub use types::*;
