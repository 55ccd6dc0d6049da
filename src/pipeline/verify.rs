use std::io::{self, ErrorKind};
use std::path::Path;

use regex::Regex;

use super::types::Verdict;

/// Read the whole sink once and search it for `marker`. A missing sink is a
/// verdict, not an error.
pub fn verify_sink(path: &Path, marker: &Regex) -> io::Result<Verdict> {
    let content = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Verdict::SinkMissing),
        Err(e) => return Err(e),
    };

    if marker.is_match(&String::from_utf8_lossy(&content)) {
        Ok(Verdict::Matched)
    } else {
        Ok(Verdict::NotFound)
    }
}
