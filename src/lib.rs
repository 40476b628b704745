pub mod config;
pub mod reconstruction;
pub mod records;
pub mod util;
