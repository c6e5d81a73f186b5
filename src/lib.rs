pub mod annotation;
pub mod audio;
pub mod config;
pub mod error;
pub mod io;
pub mod lang;
pub mod processing;
pub mod types;
