//! Wheelmirror - caching mirror for Python package indexes
//!
//! Proxies a PEP 503 simple index, rewrites every artifact link to point
//! back at the mirror, and serves downloads from a local cache. Wheels of
//! configured packages are patched before being served.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod mirror;
pub mod origin;
pub mod server;
pub mod transform;
pub mod ui;

pub use error::{MirrorError, MirrorResult};
pub use mirror::{Mirror, Served};
