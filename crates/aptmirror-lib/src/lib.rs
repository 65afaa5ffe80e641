pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod fetch;
pub mod index;
pub mod repository;
pub mod sync;
pub mod utils;
pub mod verification;

pub use config::Config;
pub use error::AptMirrorError;
