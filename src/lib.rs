pub mod config;
pub mod controller;
pub mod mapping;
pub mod server;
