//! Implementation of session storage using files on disk: one file per key
//! inside a directory, the on-disk counterpart of browser local storage.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::fs;
use std::io;
use std::path::PathBuf;

use bytes::Bytes;
use gavlik_session_store::SessionStore;

/// Session store using files on disk.
#[derive(Clone, Debug)]
pub struct FsSessionStore {
    dir: PathBuf,
}

impl FsSessionStore {
    /// Creates a new `FsSessionStore` rooted at `dir`. The directory is
    /// created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Keys map to a single file name directly inside the directory.
    fn get_file_path(&self, key: &str) -> Result<PathBuf, Error> {
        if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\', '\0']) {
            return Err(Error::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(key))
    }
}

impl SessionStore for FsSessionStore {
    type Error = Error;

    fn del<K: Into<String>>(&self, key: K) -> Result<(), Self::Error> {
        match fs::remove_file(self.get_file_path(&key.into())?) {
            Ok(()) => Ok(()),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io("error deleting file", e)),
        }
    }

    fn get<K: Into<String>>(&self, key: K) -> Result<Option<Bytes>, Self::Error> {
        match fs::read(self.get_file_path(&key.into())?) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io("error reading file", e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, Self::Error> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io("error reading directory", e)),
        };

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::Io("error reading directory entry", e))?;
            if let Some(key) = entry.file_name().to_str() {
                keys.push(key.to_string());
            }
        }

        Ok(keys)
    }

    fn put<K: Into<String>>(&self, key: K, bytes: Bytes) -> Result<(), Self::Error> {
        let path = self.get_file_path(&key.into())?;
        fs::create_dir_all(&self.dir).map_err(|e| Error::Io("error creating directory", e))?;
        fs::write(path, &bytes)
            .map_err(|e| Error::Io("error writing file", e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use gavlik_session_store::{ADMIN_SESSION_KEY, AdminSession, SessionResolver};
    use tempfile::tempdir;

    #[test]
    fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let store = FsSessionStore::new(dir.path().join("sessions"));
        let value = Bytes::from_static(b"test_value");

        store.put("test_key", value.clone()).unwrap();

        assert_eq!(store.get("test_key").unwrap(), Some(value));
        assert_eq!(store.keys().unwrap(), vec!["test_key".to_string()]);
    }

    #[test]
    fn test_missing_directory_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FsSessionStore::new(dir.path().join("never-created"));

        assert_eq!(store.get("anything").unwrap(), None);
        assert!(store.keys().unwrap().is_empty());
        store.del("anything").unwrap();
    }

    #[test]
    fn test_del() {
        let dir = tempdir().unwrap();
        let store = FsSessionStore::new(dir.path());

        store.put("test_key", Bytes::from_static(b"v")).unwrap();
        store.del("test_key").unwrap();

        assert_eq!(store.get("test_key").unwrap(), None);
    }

    #[test]
    fn test_rejects_keys_outside_directory() {
        let dir = tempdir().unwrap();
        let store = FsSessionStore::new(dir.path().join("sessions"));

        for key in ["../escaped", "nested/key", "..", ".", "", "back\\slash"] {
            assert!(matches!(
                store.put(key, Bytes::from_static(b"v")),
                Err(Error::InvalidKey(_))
            ));
            assert!(matches!(store.get(key), Err(Error::InvalidKey(_))));
            assert!(matches!(store.del(key), Err(Error::InvalidKey(_))));
        }

        assert!(!dir.path().join("escaped").exists());
        assert!(!dir.path().join("sessions").exists());
    }

    #[test]
    fn test_records_survive_reopen() {
        let dir = tempdir().unwrap();
        let session = AdminSession {
            access_token: "admin".to_string(),
            user_id: Some("sub-1".to_string()),
            email: None,
        };

        FsSessionStore::new(dir.path())
            .put(
                ADMIN_SESSION_KEY,
                Bytes::from(serde_json::to_vec(&session).unwrap()),
            )
            .unwrap();

        let resolver = SessionResolver::new(FsSessionStore::new(dir.path()));
        assert_eq!(resolver.admin_session().unwrap(), Some(session));
        assert_eq!(resolver.access_token().unwrap().as_deref(), Some("admin"));
    }
}
