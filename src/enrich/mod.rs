// src/enrich/mod.rs
//! Extraction, assembly, and the orchestrating pipeline.

pub mod assembler;
pub mod extractor;
pub mod pipeline;

pub use assembler::{assemble, Augmentations, ContextBuilder};
pub use extractor::{Extraction, Extractor};
pub use pipeline::{Enricher, PipelineSettings};
