//! Resume insight library

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod llm;
pub mod models;
pub mod ner;
pub mod output;
pub mod processing;

pub use analyzer::ResumeAnalyzer;
pub use config::Config;
pub use error::{InsightError, Result};
