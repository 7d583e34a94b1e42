use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::store::{write_atomic, Collection, Persisted, RecordStore, StoreError};

const ACCEPTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const ACCEPTED_CONTENT_TYPES: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Unsupported image type; upload a png, jpg or jpeg file")]
    UnsupportedType,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("Could not store uploaded picture: {0}")]
    Write(#[from] StoreError),
}

pub fn picture_locator(store: &RecordStore, username: &str) -> Option<String> {
    store.get(Collection::ProfilePictures, username)
}

/// Registers `locator` as the user's only picture, superseding any previous one.
pub fn set_picture(store: &RecordStore, username: &str, locator: &str) -> Persisted<String> {
    store
        .modify(Collection::ProfilePictures, |records| {
            records.insert(username.to_string(), locator.into());
        })
        .map(|()| locator.to_string())
}

/// Registers the default picture only when the user has no picture ref at
/// all. An unreadable ref stays on disk and the default is used in memory.
pub fn get_or_bootstrap_picture(
    store: &RecordStore,
    username: &str,
    default_locator: &str,
) -> Persisted<String> {
    match store.load(Collection::ProfilePictures).remove(username) {
        Some(Value::String(locator)) => Persisted::clean(locator),
        Some(_) => Persisted::clean(default_locator.to_string()),
        None => store.modify(Collection::ProfilePictures, |records| {
            records
                .entry(username.to_string())
                .or_insert_with(|| default_locator.into())
                .as_str()
                .unwrap_or(default_locator)
                .to_string()
        }),
    }
}

pub fn is_accepted_image(file_name: Option<&str>, content_type: Option<&str>) -> bool {
    let by_extension = file_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    let by_content_type = content_type
        .map(|c| ACCEPTED_CONTENT_TYPES.contains(&c.to_ascii_lowercase().as_str()))
        .unwrap_or(false);
    by_extension || by_content_type
}

/// Where a user's uploaded picture lives: the hex of the username's bytes, so
/// every username gets its own file and none can leave the uploads directory.
pub fn upload_path(uploads_dir: &Path, username: &str) -> PathBuf {
    uploads_dir.join(format!("{}.png", hex::encode(username.as_bytes())))
}

/// Writes the uploaded bytes and points the user's picture ref at them.
pub fn store_upload(
    store: &RecordStore,
    uploads_dir: &Path,
    username: &str,
    file_name: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<Persisted<String>, UploadError> {
    if !is_accepted_image(file_name, content_type) {
        return Err(UploadError::UnsupportedType);
    }
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }

    let path = upload_path(uploads_dir, username);
    write_atomic(&path, bytes)?;
    info!("Stored profile picture for {username} at {}", path.display());

    Ok(set_picture(store, username, &path.to_string_lossy()))
}

/// Resolves the file to show for a user: their own picture if it exists on
/// disk, otherwise the default placeholder.
pub fn resolve_picture_path(
    store: &RecordStore,
    username: &str,
    default_locator: &str,
) -> Option<PathBuf> {
    let own = picture_locator(store, username)
        .map(PathBuf::from)
        .filter(|p| p.is_file());
    own.or_else(|| Some(PathBuf::from(default_locator)).filter(|p| p.is_file()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_known_extensions_and_types() {
        assert!(is_accepted_image(Some("me.PNG"), None));
        assert!(is_accepted_image(Some("me.jpeg"), None));
        assert!(is_accepted_image(None, Some("image/jpeg")));
        assert!(!is_accepted_image(Some("me.gif"), Some("image/gif")));
        assert!(!is_accepted_image(None, None));
    }

    #[test]
    fn test_upload_path_stays_in_uploads_dir() {
        let path = upload_path(Path::new("uploads"), "../etc/passwd");
        assert_eq!(path.parent(), Some(Path::new("uploads")));
        assert_eq!(path, PathBuf::from("uploads/2e2e2f6574632f706173737764.png"));
    }

    #[test]
    fn test_similar_usernames_get_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let uploads = dir.path().join("uploads");

        let first = store_upload(&store, &uploads, "bob_x", Some("a.png"), None, b"BOB_X").unwrap();
        let second = store_upload(&store, &uploads, "bob.x", Some("b.png"), None, b"BOB.X").unwrap();

        assert_ne!(first.value, second.value);
        assert_eq!(std::fs::read(&first.value).unwrap(), b"BOB_X");
        assert_eq!(std::fs::read(&second.value).unwrap(), b"BOB.X");
    }

    #[test]
    fn test_bootstrap_keeps_unreadable_picture_ref() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store
            .save(Collection::ProfilePictures, &serde_json::json!({"alice": 7}))
            .unwrap();

        let got = get_or_bootstrap_picture(&store, "alice", "default_photo.png");
        assert_eq!(got.value, "default_photo.png");
        assert_eq!(store.load(Collection::ProfilePictures)["alice"], 7);
    }

    #[test]
    fn test_bootstrap_registers_default_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        let first = get_or_bootstrap_picture(&store, "alice", "default_photo.png");
        assert_eq!(first.value, "default_photo.png");
        set_picture(&store, "alice", "uploads/alice.png");

        let second = get_or_bootstrap_picture(&store, "alice", "default_photo.png");
        assert_eq!(second.value, "uploads/alice.png");
    }

    #[test]
    fn test_upload_supersedes_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let uploads = dir.path().join("uploads");
        set_picture(&store, "alice", "default_photo.png");

        let stored =
            store_upload(&store, &uploads, "alice", Some("me.jpg"), None, b"\x89PNG").unwrap();

        assert_eq!(picture_locator(&store, "alice"), Some(stored.value.clone()));
        assert_eq!(std::fs::read(&stored.value).unwrap(), b"\x89PNG");
        assert_eq!(
            resolve_picture_path(&store, "alice", "missing.png"),
            Some(PathBuf::from(stored.value))
        );
    }

    #[test]
    fn test_rejected_upload_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let uploads = dir.path().join("uploads");

        let err = store_upload(&store, &uploads, "alice", Some("me.txt"), None, b"hi");
        assert!(matches!(err, Err(UploadError::UnsupportedType)));
        let err = store_upload(&store, &uploads, "alice", Some("me.png"), None, b"");
        assert!(matches!(err, Err(UploadError::Empty)));
        assert!(picture_locator(&store, "alice").is_none());
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let default = dir.path().join("default_photo.png");
        std::fs::write(&default, b"img").unwrap();
        set_picture(&store, "alice", "uploads/gone.png");

        let default_str = default.to_string_lossy().to_string();
        assert_eq!(resolve_picture_path(&store, "alice", &default_str), Some(default));
        assert_eq!(resolve_picture_path(&store, "bob", "nope.png"), None);
    }
}
