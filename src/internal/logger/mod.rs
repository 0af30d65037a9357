// src/internal/logger/mod.rs

pub mod logger;

pub use logger::init_logger;
