//! Loader for probabilistic risk analysis models in the Open-PSA Model
//! Exchange Format.
//!
//! Loading is two-phased: a first pass over every input document registers
//! all named constructs (so references may point forward within a file and
//! across files), and a second pass defines the registered bodies now that
//! every name is known. Validation then rejects reference cycles and
//! contract violations before the model is set up for analysis.

mod builder;
mod error;
mod expression;
mod vocabulary;
mod xml;

use std::path::Path;

pub use builder::ModelBuilder;
pub use error::Error;
pub use pram_core;
pub use pram_core::{Model, Settings};

/// Loads and validates a model from the given MEF documents.
pub fn load<P: AsRef<Path>>(files: &[P], settings: Settings) -> anyhow::Result<Model> {
    ModelBuilder::load(files, settings)
}
