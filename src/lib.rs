pub mod classifier;
pub mod config;
pub mod decision;
pub mod error;
pub mod handlers;
pub mod models;
pub mod scoring;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};
