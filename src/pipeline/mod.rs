//! Pipeline assembly
//!
//! Turns a validated session configuration plus collaborator handles into a
//! running capture -> encoder -> writer chain.

pub mod assembler;

pub use assembler::{ActivePipeline, PipelineAssembler};
