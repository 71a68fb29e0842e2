//! Job matcher library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod processing;

pub use error::{Result, MatcherError};
pub use config::Config;
