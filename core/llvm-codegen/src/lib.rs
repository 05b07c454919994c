#![warn(clippy::pedantic)]
pub mod generator;
pub mod ir;

pub use generator::{CodegenOptions, LlvmGenerator};
