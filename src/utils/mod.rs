// file: src/utils/mod.rs
// description: utility functions module exports

pub mod logging;
pub mod validation;

pub use validation::Validator;
