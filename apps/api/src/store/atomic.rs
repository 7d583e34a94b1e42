use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::store::StoreError;

/// Writes `bytes` to `target` with write-to-temp-then-rename.
///
/// The temp file lives in the target's own directory so the final `persist` is a
/// same-filesystem rename. Readers see either the old file or the new one, never
/// a partial write. On any failure the temp file is dropped (and unlinked) and
/// the previous target content is left untouched.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let io_err = |source: std::io::Error| StoreError::Io {
        path: target.display().to_string(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(target).map_err(|e| io_err(e.error))?;

    Ok(())
}

/// Serializes `data` as 4-space-indented JSON and writes it atomically.
pub fn write_json_atomic<T: serde::Serialize + ?Sized>(
    target: &Path,
    data: &T,
) -> Result<(), StoreError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser)?;
    write_atomic(target, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_write_creates_file_with_indented_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        write_json_atomic(&path, &json!({"alice": "abc"})).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("    \"alice\""), "got {text}");
    }

    #[test]
    fn test_write_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile.json");
        write_atomic(&path, b"old").unwrap();
        write_atomic(&path, b"new").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        write_atomic(&path, b"{}").unwrap();
        write_atomic(&path, b"{\"a\": []}").unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        write_atomic(&path, b"{\"alice\": \"abc\"}").unwrap();

        // The target is now a non-empty directory, so the final rename must fail.
        let blocked = dir.path().join("blocked");
        std::fs::create_dir(&blocked).unwrap();
        std::fs::write(blocked.join("keep"), b"x").unwrap();
        assert!(write_atomic(&blocked, b"{}").is_err());

        assert_eq!(std::fs::read(&path).unwrap(), b"{\"alice\": \"abc\"}");
        assert!(blocked.join("keep").exists());
    }
}
