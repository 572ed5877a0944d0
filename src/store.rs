//! Key/value stores the batch converter reads from and writes to.
//!
//! [`ByteStore`] is the source side (key → document bytes), [`TextStore`] the
//! target side (key → Markdown). Both are implemented for the standard maps,
//! for ordered `Vec`s of pairs, and for [`DirStore`], a directory tree on
//! disk where keys are `/`-separated relative paths.

use crate::error::Doc2MdError;
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// A readable mapping from key to raw bytes.
///
/// `keys()` is walked lazily and each value is read on demand, so a store
/// backed by a large directory never has to be loaded into memory at once.
pub trait ByteStore {
    fn keys(&self) -> Box<dyn Iterator<Item = String> + '_>;

    fn read(&self, key: &str) -> Result<Cow<'_, [u8]>, Doc2MdError>;

    /// Number of entries, when known without walking the store.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// A writable mapping from key to text.
pub trait TextStore {
    /// Insert or replace the text stored under `key`.
    fn write(&mut self, key: &str, text: String) -> Result<(), Doc2MdError>;

    /// All entries in the store's natural order.
    fn entries(&self) -> Vec<(String, String)>;
}

fn missing(key: &str) -> Doc2MdError {
    Doc2MdError::KeyNotFound {
        key: key.to_string(),
    }
}

// ── In-memory stores ─────────────────────────────────────────────────────

impl ByteStore for HashMap<String, Vec<u8>> {
    fn keys(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(HashMap::keys(self).cloned())
    }

    fn read(&self, key: &str) -> Result<Cow<'_, [u8]>, Doc2MdError> {
        self.get(key)
            .map(|v| Cow::Borrowed(v.as_slice()))
            .ok_or_else(|| missing(key))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl ByteStore for BTreeMap<String, Vec<u8>> {
    fn keys(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(BTreeMap::keys(self).cloned())
    }

    fn read(&self, key: &str) -> Result<Cow<'_, [u8]>, Doc2MdError> {
        self.get(key)
            .map(|v| Cow::Borrowed(v.as_slice()))
            .ok_or_else(|| missing(key))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

/// Ordered pairs; on duplicate keys the first occurrence wins for `read`.
impl ByteStore for Vec<(String, Vec<u8>)> {
    fn keys(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.iter().map(|(k, _)| k.clone()))
    }

    fn read(&self, key: &str) -> Result<Cow<'_, [u8]>, Doc2MdError> {
        self.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| Cow::Borrowed(v.as_slice()))
            .ok_or_else(|| missing(key))
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl TextStore for HashMap<String, String> {
    fn write(&mut self, key: &str, text: String) -> Result<(), Doc2MdError> {
        self.insert(key.to_string(), text);
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl TextStore for BTreeMap<String, String> {
    fn write(&mut self, key: &str, text: String) -> Result<(), Doc2MdError> {
        self.insert(key.to_string(), text);
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

/// Insertion-ordered; writing an existing key replaces it in place.
impl TextStore for Vec<(String, String)> {
    fn write(&mut self, key: &str, text: String) -> Result<(), Doc2MdError> {
        match self.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = text,
            None => self.push((key.to_string(), text)),
        }
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.clone()
    }
}

// ── DirStore ─────────────────────────────────────────────────────────────

/// A store backed by a directory tree.
///
/// Keys are relative paths with `/` separators on every platform. Listing
/// walks the tree recursively in sorted order; writes create parent
/// directories and go through a temp file in the destination directory
/// followed by a rename, so readers never observe a half-written file.
///
/// # Example
/// ```rust
/// use edgequake_doc2md::{DirStore, TextStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut store = DirStore::create(dir.path()).unwrap();
/// store.write("notes/a.md", "# A\n".to_string()).unwrap();
/// assert_eq!(store.entries(), vec![("notes/a.md".to_string(), "# A\n".to_string())]);
/// ```
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open an existing directory.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, Doc2MdError> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(Doc2MdError::NotADirectory {
                path: root.to_path_buf(),
            });
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Open a directory, creating it (and its parents) if needed.
    pub fn create(root: impl AsRef<Path>) -> Result<Self, Doc2MdError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(|e| Doc2MdError::StoreWrite {
            key: root.display().to_string(),
            source: e,
        })?;
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to its path under the root, rejecting anything that could
    /// escape it.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, Doc2MdError> {
        let invalid = || Doc2MdError::InvalidKey {
            key: key.to_string(),
        };
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(invalid());
        }
        let mut path = self.root.clone();
        let mut pushed = false;
        for segment in key.split(['/', '\\']) {
            for component in Path::new(segment).components() {
                match component {
                    Component::Normal(part) => {
                        path.push(part);
                        pushed = true;
                    }
                    Component::CurDir => {}
                    _ => return Err(invalid()),
                }
            }
        }
        if !pushed {
            return Err(invalid());
        }
        Ok(path)
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = rel.components().map(|c| c.as_os_str().to_str()).collect();
        Some(parts?.join("/"))
    }

    fn walk(&self) -> impl Iterator<Item = (String, PathBuf)> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("Skipping unreadable store entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let key = self.key_for(e.path());
                if key.is_none() {
                    warn!("Skipping non-UTF-8 path {}", e.path().display());
                }
                Some((key?, e.into_path()))
            })
    }
}

impl ByteStore for DirStore {
    fn keys(&self) -> Box<dyn Iterator<Item = String> + '_> {
        Box::new(self.walk().map(|(key, _)| key))
    }

    fn read(&self, key: &str) -> Result<Cow<'_, [u8]>, Doc2MdError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Cow::Owned(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(missing(key)),
            Err(e) => Err(Doc2MdError::StoreRead {
                key: key.to_string(),
                source: e,
            }),
        }
    }
}

impl TextStore for DirStore {
    fn write(&mut self, key: &str, text: String) -> Result<(), Doc2MdError> {
        let path = self.path_for(key)?;
        let write_err = |source: io::Error| Doc2MdError::StoreWrite {
            key: key.to_string(),
            source,
        };
        let parent = path.parent().unwrap_or(&self.root);
        fs::create_dir_all(parent).map_err(write_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    fn entries(&self) -> Vec<(String, String)> {
        self.walk()
            .filter_map(|(key, path)| match fs::read(&path) {
                Ok(bytes) => Some((key, String::from_utf8_lossy(&bytes).into_owned())),
                Err(e) => {
                    warn!("Skipping unreadable store entry '{}': {}", key, e);
                    None
                }
            })
            .collect()
    }
}
