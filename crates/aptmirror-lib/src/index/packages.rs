use super::{FileDescriptor, FileTable, IndexError, for_each_line, parse_size};
use crate::verification::Compression;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Default)]
struct PendingRecord {
    filename: String,
    file: FileDescriptor,
    has_fields: bool,
}

impl PendingRecord {
    fn commit(self, files: &mut FileTable) {
        let PendingRecord {
            filename, mut file, ..
        } = self;
        // A stanza without a Filename field lands under the empty key and is
        // replaced by the next such stanza.
        file.path = filename.clone();
        files.insert(filename, file);
    }
}

/// Parses a `Packages` index into the table of package files it references.
///
/// Stanzas are separated by blank lines. Indented lines continue the previous
/// field (long descriptions) and are ignored.
pub fn parse_packages(reader: impl BufRead) -> Result<FileTable, IndexError> {
    let mut files = FileTable::new();
    let mut record = PendingRecord::default();

    for_each_line(reader, |line| {
        if line.trim().is_empty() {
            std::mem::take(&mut record).commit(&mut files);
            return Ok(());
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            return Ok(());
        }

        let Some((key, value)) = line.split_once(':') else {
            tracing::trace!("Ignoring line without a field separator: {:?}", line);
            return Ok(());
        };
        record.has_fields = true;

        let value = value.trim();
        match key {
            "Filename" => {
                if value.contains(char::REPLACEMENT_CHARACTER) {
                    tracing::debug!("Filename is not valid UTF-8, it will not be found remotely: {:?}", value);
                }
                record.filename = value.to_string();
            }
            "Size" => record.file.size = parse_size(value),
            "SHA256" => record.file.sha256 = value.to_string(),
            _ => {}
        }
        Ok(())
    })?;

    if record.has_fields {
        record.commit(&mut files);
    }

    Ok(files)
}

/// Opens a stored `Packages` index, decoding it if it is compressed.
pub fn open_packages_index(
    path: &Path,
    compression: Compression,
) -> Result<Box<dyn BufRead + Send>, IndexError> {
    let file = File::open(path)?;
    Ok(match compression {
        Compression::None => Box::new(BufReader::new(file)),
        Compression::Gzip => Box::new(BufReader::new(GzDecoder::new(file))),
    })
}

pub fn parse_packages_file(path: &Path, compression: Compression) -> Result<FileTable, IndexError> {
    parse_packages(open_packages_index(path, compression)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression as GzLevel;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const TWO_PACKAGES: &str = "\
Package: a
Filename: pool/a.deb
Size: 100
SHA256: deadbeef
Description: first package
 a folded description line
 .
 Size: 999

Package: b
Filename: pool/b.deb
Size: 200
SHA256: feedface
";

    #[test]
    fn test_parse_two_stanzas() {
        let files = parse_packages(TWO_PACKAGES.as_bytes()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(
            files["pool/a.deb"],
            FileDescriptor {
                path: "pool/a.deb".into(),
                size: 100,
                sha256: "deadbeef".into(),
            }
        );
        assert_eq!(files["pool/b.deb"].size, 200);
        assert_eq!(files["pool/b.deb"].sha256, "feedface");
    }

    #[test]
    fn test_continuation_lines_do_not_alter_fields() {
        let input = "Filename: pool/a.deb\nSize: 100\n Size: 5\n SHA256: 00\nSHA256: deadbeef\n Filename: pool/z.deb\n\n";
        let files = parse_packages(input.as_bytes()).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files["pool/a.deb"].size, 100);
        assert_eq!(files["pool/a.deb"].sha256, "deadbeef");
    }

    #[test]
    fn test_trailing_blank_line_does_not_add_records() {
        let input = "Filename: pool/a.deb\nSize: 1\nSHA256: aa\n\n";
        let files = parse_packages(input.as_bytes()).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_invalid_size_is_zero() {
        let input = "Filename: pool/a.deb\nSize: huge\nSHA256:  aa  \n";
        let files = parse_packages(input.as_bytes()).unwrap();
        assert_eq!(files["pool/a.deb"].size, 0);
        assert_eq!(files["pool/a.deb"].sha256, "aa");
    }

    #[test]
    fn test_stanzas_without_filename_share_the_empty_key() {
        let input = "Package: x\nSize: 1\n\nPackage: y\nSize: 2\n\nFilename: pool/c.deb\nSize: 3\n";
        let files = parse_packages(input.as_bytes()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files[""].size, 2);
        assert_eq!(files["pool/c.deb"].size, 3);
    }

    #[test]
    fn test_duplicate_filenames_last_write_wins() {
        let input = "Filename: pool/a.deb\nSize: 1\n\nFilename: pool/a.deb\nSize: 2\n";
        let files = parse_packages(input.as_bytes()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files["pool/a.deb"].size, 2);
    }

    #[test]
    fn test_crlf_input() {
        let input = "Filename: pool/a.deb\r\nSize: 7\r\nSHA256: aa\r\n\r\nFilename: pool/b.deb\r\n";
        let files = parse_packages(input.as_bytes()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files["pool/a.deb"].size, 7);
    }

    #[test]
    fn test_parse_gzip_packages_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Packages.gz");
        let mut encoder = GzEncoder::new(Vec::new(), GzLevel::default());
        encoder.write_all(TWO_PACKAGES.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let files = parse_packages_file(&path, Compression::Gzip).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.contains_key("pool/a.deb"));
        assert!(files.contains_key("pool/b.deb"));
    }

    #[test]
    fn test_parse_plain_packages_file_matches_in_memory_parse() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("Packages");
        std::fs::write(&path, TWO_PACKAGES).unwrap();

        let from_file = parse_packages_file(&path, Compression::None).unwrap();
        let in_memory = parse_packages(TWO_PACKAGES.as_bytes()).unwrap();
        assert_eq!(from_file, in_memory);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = parse_packages_file(&temp_dir.path().join("Packages"), Compression::None)
            .unwrap_err();
        assert!(matches!(err, IndexError::Io(_)));
    }

    #[test]
    fn test_non_utf8_filename_is_kept_lossily() {
        let mut index = b"Package: a\nFilename: pool/caf".to_vec();
        index.extend_from_slice(&[0xe9]);
        index.extend_from_slice(b".deb\nSize: 3\n\nPackage: b\nFilename: pool/b.deb\nSize: 4\n");

        let files = parse_packages(index.as_slice()).unwrap();

        assert_eq!(files.len(), 2);
        assert_eq!(files["pool/caf\u{FFFD}.deb"].size, 3);
        assert_eq!(files["pool/b.deb"].size, 4);
    }
}
