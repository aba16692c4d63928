//! Local filenames derived from origin URLs
//!
//! This is the only place where `#sha256=...` fragments and query strings
//! are dropped. Everything downstream works on bare filenames.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// Suffix of PEP 658 core-metadata sidecar files
pub const METADATA_SUFFIX: &str = ".metadata";

/// Characters escaped when a filename is placed back into a URL path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Derive the local filename for an origin URL
///
/// Works on absolute and relative references alike: the result is the final
/// path segment, percent-decoded, with fragment and query removed.
pub fn extract_filename(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => last_segment(parsed.path()),
        Err(_) => {
            let end = url.find(|c: char| c == '#' || c == '?').unwrap_or(url.len());
            last_segment(&url[..end])
        }
    }
}

/// Split a metadata filename into the artifact filename it describes
pub fn strip_metadata_suffix(filename: &str) -> Option<&str> {
    filename.strip_suffix(METADATA_SUFFIX)
}

/// Encode a filename for use inside a locally-routed href
pub fn encode_segment(filename: &str) -> String {
    utf8_percent_encode(filename, PATH_SEGMENT).to_string()
}

fn last_segment(path: &str) -> String {
    let segment = path.rsplit('/').next().unwrap_or_default();
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
