// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A directory-registered, blocking file loader.
//!
//! Asset paths are resolved against the registered directories in
//! registration order; the first hit wins. Absolute paths and paths
//! relative to the working directory are tried first.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// An error loading a file through the store.
#[derive(Debug)]
pub enum VfsError {
    /// The file was not found in any registered directory.
    NotFound {
        /// The requested path.
        path: String,
    },
    /// The file exists but could not be read.
    Io {
        /// The resolved path.
        path: String,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl fmt::Display for VfsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VfsError::NotFound { path } => {
                write!(f, "'{path}' not found in any registered directory")
            }
            VfsError::Io { path, source } => write!(f, "failed to read '{path}': {source}"),
        }
    }
}

impl std::error::Error for VfsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            VfsError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Resolves asset names against a list of registered directories and loads
/// them into memory.
#[derive(Debug, Default)]
pub struct FileStore {
    directories: Vec<PathBuf>,
}

impl FileStore {
    /// Creates a store with no registered directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a directory to search. Later registrations are searched
    /// after earlier ones.
    pub fn add_directory(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::debug!("file store: registered directory '{}'", path.display());
        self.directories.push(path);
    }

    /// Loads a file into a byte buffer, blocking until done.
    pub fn load(&self, name: impl AsRef<Path>) -> Result<Vec<u8>, VfsError> {
        let name = name.as_ref();

        if name.is_file() {
            return Self::read(name);
        }
        for directory in &self.directories {
            let candidate = directory.join(name);
            if candidate.is_file() {
                return Self::read(&candidate);
            }
        }
        Err(VfsError::NotFound {
            path: name.display().to_string(),
        })
    }

    fn read(path: &Path) -> Result<Vec<u8>, VfsError> {
        fs::read(path).map_err(|source| VfsError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("kestrel-vfs-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_from_a_registered_directory() {
        let dir = scratch_dir("load");
        fs::write(dir.join("hello.txt"), b"hi").unwrap();

        let mut store = FileStore::new();
        store.add_directory(&dir);
        assert_eq!(store.load("hello.txt").unwrap(), b"hi");
    }

    #[test]
    fn earlier_directories_win() {
        let first = scratch_dir("first");
        let second = scratch_dir("second");
        fs::write(first.join("a.txt"), b"first").unwrap();
        fs::write(second.join("a.txt"), b"second").unwrap();

        let mut store = FileStore::new();
        store.add_directory(&first);
        store.add_directory(&second);
        assert_eq!(store.load("a.txt").unwrap(), b"first");
    }

    #[test]
    fn missing_files_report_not_found() {
        let store = FileStore::new();
        assert!(matches!(
            store.load("definitely-not-here.bin"),
            Err(VfsError::NotFound { .. })
        ));
    }
}
