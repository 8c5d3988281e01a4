//! onpm - Offline npm
//!
//! Installs npm packages from a local directory cache and falls back to
//! the real npm client on a miss, caching whatever npm installed.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod orchestration;
pub mod package;
pub mod ui;

pub use error::{OnpmError, OnpmResult};
