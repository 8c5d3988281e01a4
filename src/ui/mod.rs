//! UI module for consistent CLI output
//!
//! Uses `cliclack` for spinners and step logging in a terminal, with
//! automatic fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use onpm::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Installing left-pad");
//! // ... do work ...
//! spinner.clear();
//!
//! ui::step_ok_detail(&ctx, "left-pad installed from cache", "1.3.0");
//! ui::outro_success(&ctx, "Installed 1 package(s)");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{outro_success, step_error_detail, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
