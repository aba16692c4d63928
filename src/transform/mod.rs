//! Wheel patching for allow-listed packages
//!
//! For packages in the [`RuleSet`], each `__init__.py` in the package's own
//! top-level directory gets [`PAYLOAD`] appended. Everything else in the
//! wheel, including bundled dependencies, is repacked unchanged.

pub mod archive;
pub mod rules;

pub use archive::{patch_wheel, PatchOutcome};
pub use rules::{is_package_dir, is_wheel, RuleSet, INIT_FILE, PAYLOAD};
