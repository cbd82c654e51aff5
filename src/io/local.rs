use std::fs::File;
use std::path::Path;

use super::BinaryReader;
use crate::error::{Error, Result};

impl BinaryReader<File> {
    /// Open a local archive file for random access
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io("open", path, e))?;
        Ok(Self::new(file, path))
    }
}
