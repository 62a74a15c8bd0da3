
use std::{fmt::Debug, path::{Path, PathBuf}};

use anyhow::Result;
use path_absolutize::*;

/// An absolute path, resolved once against the current directory.
#[derive(Clone, PartialEq)]
pub struct CanonPath (PathBuf);
impl CanonPath {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> { Ok(Self((path.as_ref().absolutize()?).into_owned())) }
    pub fn path(&self) -> &Path { &self.0 }
    pub fn to_path_buf(&self) -> PathBuf { self.0.clone() }
}

impl AsRef<Path> for CanonPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Debug for CanonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
