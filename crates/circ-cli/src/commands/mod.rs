pub mod config;
pub mod data;
pub mod stats;
pub mod timer;
