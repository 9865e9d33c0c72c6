// Imagine - on-the-fly image resizing service

pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod handler;
pub mod imaging;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod proxy;
pub mod server;
