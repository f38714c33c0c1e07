//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod render;
pub mod run;
pub mod stages;
pub mod version;
