use std::io::Write;
use std::path::Path;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

/// Zips every regular file directly inside `dir`, sorted by name.
/// JPEGs are stored as-is; everything else is deflated.
pub fn zip_directory(dir: &Path) -> Result<Vec<u8>, super::ServeError> {
    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .collect();
    entries.sort_by_key(|entry| entry.file_name());

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let method = if is_jpeg(&name) {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };

        zip.start_file(name.as_str(), SimpleFileOptions::default().compression_method(method))?;
        let data = std::fs::read(entry.path())?;
        zip.write_all(&data)?;
    }

    // 完成並取回底層 Vec<u8>
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

pub fn is_jpeg(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".jpg") || lower.ends_with(".jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_zip_directory_contains_all_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("gpsdata.s.csv"), "Date,Localtime\n").unwrap();
        std::fs::write(dir.path().join("s-1.jpg"), [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let bytes = zip_directory(dir.path()).unwrap();
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        let mut csv = String::new();
        archive
            .by_name("gpsdata.s.csv")
            .unwrap()
            .read_to_string(&mut csv)
            .unwrap();
        assert_eq!(csv, "Date,Localtime\n");
        assert_eq!(
            archive.by_name("s-1.jpg").unwrap().compression(),
            CompressionMethod::Stored
        );
    }

    #[test]
    fn test_is_jpeg() {
        assert!(is_jpeg("a-1.jpg"));
        assert!(is_jpeg("A-1.JPEG"));
        assert!(!is_jpeg("gpsdata.csv"));
    }
}
