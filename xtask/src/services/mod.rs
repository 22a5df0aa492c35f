pub mod error;
pub mod executor;
pub mod fs;
pub mod host;
pub mod notice;
pub mod utils;
pub mod version;
