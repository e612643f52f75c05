pub mod build;
pub mod config;
pub mod key;
pub mod sections;
