pub mod device;
pub mod not_found;
pub mod visualization;
