//! Simple-index handling: filename extraction, link rewriting and the
//! resolver table that routes local filenames back to the origin.

pub mod filename;
pub mod rewrite;
pub mod table;

pub use filename::{extract_filename, strip_metadata_suffix, METADATA_SUFFIX};
pub use rewrite::{rewrite_index, RewrittenIndex};
pub use table::{PackageLinks, ResolverTable};
