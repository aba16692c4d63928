//! Terminal output for CLI commands
//!
//! Uses `cliclack` when attached to an interactive terminal and falls back
//! to plain prefixed lines in CI and when piped.

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, step_ok, step_ok_detail, step_warn_hint};
