//! Terminal front-end for bucketdrop.
//!
//! The binary in `main.rs` parses arguments and wires the flow together;
//! configuration loading and the interactive terminal live here so they can
//! be tested.

pub mod config;
pub mod terminal;

pub use config::{AppConfig, ConfigError, Overrides};
pub use terminal::{parse_bucket_choice, BucketChoice, Goal, Terminal};
