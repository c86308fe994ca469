pub mod device_filter;
pub mod device_walker;
