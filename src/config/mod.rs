// src/config/mod.rs
pub mod enrich;

pub use enrich::EnrichConfig;
