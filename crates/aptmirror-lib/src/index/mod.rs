//! Parsers for APT repository metadata.
//!
//! Two formats are handled here:
//! - the distribution index (`dists/<dist>/Release`), a list of header fields
//!   followed by indented checksum blocks, see [`release`];
//! - the per-component package indices (`Packages`), blank-line separated
//!   stanzas of `Key: value` fields, see [`packages`].
//!
//! Both produce a [`FileTable`] keyed by the path the metadata refers to.

pub mod packages;
pub mod release;

pub use packages::{open_packages_index, parse_packages, parse_packages_file};
pub use release::{ReleaseRequirements, ScanMode, ScannedLine, parse_release, parse_release_file, scan_line};

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use thiserror::Error;

/// A file listed by repository metadata together with its expected size and SHA-256.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileDescriptor {
    pub path: String,
    pub size: u64,
    pub sha256: String,
}

/// Files keyed by their path relative to the metadata root they were listed under.
///
/// Inserting an existing path replaces the previous descriptor (last write wins).
pub type FileTable = BTreeMap<String, FileDescriptor>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Repository doesn't support architecture {0}")]
    UnsupportedArchitecture(String),

    #[error("Repository doesn't have component {0}")]
    MissingComponent(String),

    #[error("Failed to read index: {0}")]
    Io(#[from] io::Error),
}

/// Merges `source` into `target`; descriptors from `source` replace existing ones.
pub fn merge_file_tables(target: &mut FileTable, source: FileTable) {
    target.extend(source);
}

/// Sizes that fail to parse are treated as zero rather than rejecting the index.
pub(crate) fn parse_size(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

/// Calls `f` for every line of `reader`, without the line terminator.
///
/// Metadata is not guaranteed to be valid UTF-8 (long descriptions in old
/// archives), so lines are decoded lossily.
pub(crate) fn for_each_line<R, F>(mut reader: R, mut f: F) -> Result<(), IndexError>
where
    R: BufRead,
    F: FnMut(&str) -> Result<(), IndexError>,
{
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        if reader.read_until(b'\n', &mut buffer)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buffer);
        f(line.trim_end_matches(['\n', '\r']))?;
    }
}
