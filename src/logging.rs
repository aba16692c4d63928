//! Log destination and default verbosity

use crate::error::{MirrorError, MirrorResult};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// 0 = warn, 1 = info, 2+ = debug
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "wheelmirror=warn",
        1 => "wheelmirror=info",
        _ => "wheelmirror=debug",
    }
}

/// Writer for log lines: the given file in append mode, or stderr
///
/// Missing parent directories of the file are created.
pub fn log_writer(log_file: Option<&Path>) -> MirrorResult<BoxMakeWriter> {
    let Some(path) = log_file else {
        return Ok(BoxMakeWriter::new(std::io::stderr));
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            MirrorError::io(format!("creating log directory {}", parent.display()), e)
        })?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| MirrorError::io(format!("opening log file {}", path.display()), e))?;

    Ok(BoxMakeWriter::new(Mutex::new(file)))
}
