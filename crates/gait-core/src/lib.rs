//! # Gait-Core
//!
//! Core types for analysing a single-channel force signal from a
//! foot-pressure (FSR) sensor: samples and signals, slopes, gait events,
//! filter and detection configuration, and the shared error taxonomy.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
