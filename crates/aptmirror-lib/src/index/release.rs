use super::{FileDescriptor, FileTable, IndexError, for_each_line, parse_size};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Where the `Release` scanner is: reading header fields, or inside the
/// indented rows of a `SHA256` block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanMode {
    #[default]
    Header,
    HashBlock,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ScannedLine<'a> {
    Field { key: &'a str, value: &'a str },
    Entry(FileDescriptor),
    Malformed(&'a str),
    Skip,
}

/// Interprets one line of a `Release` file.
///
/// A non-indented line ends a hash block and is then read as a header line.
pub fn scan_line(mode: ScanMode, line: &str) -> (ScanMode, ScannedLine<'_>) {
    let indented = line.starts_with(' ');
    let mode = match mode {
        ScanMode::HashBlock if !indented => ScanMode::Header,
        mode => mode,
    };

    match mode {
        ScanMode::Header => {
            if indented {
                return (mode, ScannedLine::Skip);
            }
            let Some((key, value)) = line.split_once(':') else {
                return (mode, ScannedLine::Skip);
            };
            let next = if key == "SHA256" {
                ScanMode::HashBlock
            } else {
                ScanMode::Header
            };
            (
                next,
                ScannedLine::Field {
                    key,
                    value: value.trim(),
                },
            )
        }
        ScanMode::HashBlock => {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [sha256, size, path] => (
                    mode,
                    ScannedLine::Entry(FileDescriptor {
                        path: path.to_string(),
                        size: parse_size(size),
                        sha256: sha256.to_string(),
                    }),
                ),
                _ => (mode, ScannedLine::Malformed(line)),
            }
        }
    }
}

/// Architectures and components the mirrored distribution must provide.
#[derive(Clone, Debug, Default)]
pub struct ReleaseRequirements {
    pub architectures: Vec<String>,
    pub components: Vec<String>,
}

impl ReleaseRequirements {
    fn check_architectures(&self, listed: &str) -> Result<(), IndexError> {
        let listed: Vec<&str> = listed.split_whitespace().collect();
        match self
            .architectures
            .iter()
            .find(|arch| !listed.contains(&arch.as_str()))
        {
            Some(missing) => Err(IndexError::UnsupportedArchitecture(missing.clone())),
            None => Ok(()),
        }
    }

    fn check_components(&self, listed: &str) -> Result<(), IndexError> {
        let listed: Vec<&str> = listed.split_whitespace().collect();
        match self
            .components
            .iter()
            .find(|component| !listed.contains(&component.as_str()))
        {
            Some(missing) => Err(IndexError::MissingComponent(missing.clone())),
            None => Ok(()),
        }
    }
}

/// Parses a distribution `Release` file into the table of files it lists in
/// its `SHA256` block.
///
/// Fails if the `Architectures` or `Components` headers, when present, lack
/// something in `requirements`.
pub fn parse_release(
    reader: impl BufRead,
    requirements: &ReleaseRequirements,
) -> Result<FileTable, IndexError> {
    let mut files = FileTable::new();
    let mut mode = ScanMode::default();

    for_each_line(reader, |line| {
        let (next, scanned) = scan_line(mode, line);
        mode = next;

        match scanned {
            ScannedLine::Field {
                key: "Architectures",
                value,
            } => requirements.check_architectures(value)?,
            ScannedLine::Field {
                key: "Components",
                value,
            } => requirements.check_components(value)?,
            ScannedLine::Field { key: "SHA256", .. } => tracing::trace!("SHA256 hashes:"),
            ScannedLine::Entry(file) => {
                tracing::trace!(" {} -> {} -> {}", file.sha256, file.size, file.path);
                files.insert(file.path.clone(), file);
            }
            ScannedLine::Malformed(line) => {
                tracing::debug!("Skipping malformed hash row: {:?}", line);
            }
            ScannedLine::Field { .. } | ScannedLine::Skip => {}
        }
        Ok(())
    })?;

    Ok(files)
}

pub fn parse_release_file(
    path: &Path,
    requirements: &ReleaseRequirements,
) -> Result<FileTable, IndexError> {
    let file = File::open(path)?;
    parse_release(BufReader::new(file), requirements)
}
