pub mod config;
pub mod piston;
pub mod types;
