pub mod app;
pub mod config;
pub mod dates;
pub mod db;
pub mod digest;
pub mod filter;
pub mod logger;
pub mod models;
pub mod notion;
pub mod render;
pub mod sync;
