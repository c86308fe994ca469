pub mod config;
pub mod connector;
pub mod descriptor;
pub mod error;
pub mod format_record;
pub mod processing_mode;
pub mod resource;
pub mod wave_format;
