//! Import and store configuration

pub mod cleaning;
pub mod file_config;
pub mod settings;

pub use cleaning::*;
pub use file_config::*;
pub use settings::*;
