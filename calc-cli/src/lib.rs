pub mod app;
pub mod clipboard;
pub mod config;
pub mod logging;
pub mod remote;
pub mod render;
