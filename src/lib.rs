// Shirushi: batch text watermarking library

pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod preview;
pub mod settings;
pub mod template;
pub mod watermark;
