//! Byte-stream accessors for cached content

use crate::error::Result;
use std::fmt;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

/// A readable, seekable byte stream
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Something that can be opened for reading, possibly many times
pub trait Resource: fmt::Debug + Send + Sync {
    /// Open a fresh stream positioned at the start of the content
    fn open(&self) -> Result<Box<dyn ReadSeek>>;
}

/// A resource backed by a file on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Resource for FileResource {
    fn open(&self) -> Result<Box<dyn ReadSeek>> {
        let file = std::fs::File::open(&self.path)?;
        Ok(Box::new(file))
    }
}

impl fmt::Display for FileResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileResource[{}]", self.path.display())
    }
}
