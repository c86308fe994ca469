pub mod device_directory;
pub mod resource_sink;
