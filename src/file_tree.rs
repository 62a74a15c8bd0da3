
use std::path::Path;

use anyhow::{bail, Result};
use log::{debug, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::lowercase::LwcString;

/// Whether a node takes part in extraction, packaging and size computation.
///
/// `Excluded` nodes stay in the tree until [`FolderNode::clean`] prunes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStatus {
    #[default]
    Included,
    Excluded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub file_name: String,
    /// Byte length; meaningless once the node is excluded.
    pub size: u64,
    pub status: NodeStatus,
}

impl FileNode {
    pub fn new(file_name: &str, size: u64) -> Self {
        FileNode { file_name: file_name.to_owned(), size, status: NodeStatus::Included }
    }

    pub fn is_excluded(&self) -> bool {
        self.status == NodeStatus::Excluded
    }

    pub fn exclude(&mut self) {
        self.status = NodeStatus::Excluded;
    }
}

/// In-memory mirror of a directory, as read from a manifest or scanned from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FolderNode {
    pub name: String,
    pub subfolders: Vec<FolderNode>,
    pub files: Vec<FileNode>,
    pub status: NodeStatus,
}

impl Default for FolderNode {
    fn default() -> Self {
        FolderNode::new(".")
    }
}

impl FolderNode {
    pub fn new(name: &str) -> Self {
        FolderNode {
            name: name.trim_start_matches(['\\', '/']).to_owned(),
            subfolders: vec![],
            files: vec![],
            status: NodeStatus::Included,
        }
    }

    pub fn is_excluded(&self) -> bool {
        self.status == NodeStatus::Excluded
    }

    pub fn exclude(&mut self) {
        self.status = NodeStatus::Excluded;
    }

    pub fn add_folder(&mut self, folder: FolderNode) {
        self.subfolders.push(folder);
    }

    pub fn add_file(&mut self, file: FileNode) {
        self.files.push(file);
    }

    /// Case-insensitive lookup among the direct subfolders; the last match wins.
    pub fn find_folder(&self, name: &str) -> Option<&FolderNode> {
        let name = LwcString::new(name);
        self.subfolders.iter().rev().find(|folder| name == folder.name)
    }

    pub fn find_folder_mut(&mut self, name: &str) -> Option<&mut FolderNode> {
        let name = LwcString::new(name);
        self.subfolders.iter_mut().rev().find(|folder| name == folder.name)
    }

    /// Case-insensitive lookup among the direct files; the last match wins.
    pub fn find_file(&self, name: &str) -> Option<&FileNode> {
        let name = LwcString::new(name);
        self.files.iter().rev().find(|file| name == file.file_name)
    }

    /// Number of folders in the tree, this one included.
    pub fn folder_count(&self) -> usize {
        1 + self.subfolders.iter().map(FolderNode::folder_count).sum::<usize>()
    }

    pub fn file_count(&self) -> usize {
        self.files.len() + self.subfolders.iter().map(FolderNode::file_count).sum::<usize>()
    }

    /// Sums the size of every file that is not excluded, skipping excluded
    /// subfolders entirely. Does not prune anything.
    pub fn folder_size(&self) -> u64 {
        let files: u64 = self.files.iter()
            .filter(|file| !file.is_excluded())
            .map(|file| file.size)
            .sum();
        let folders: u64 = self.subfolders.iter()
            .filter(|folder| !folder.is_excluded())
            .map(FolderNode::folder_size)
            .sum();
        files + folders
    }

    /// Drops excluded children, bottom-up.
    ///
    /// Returns `false` when this folder ended up with neither subfolders nor
    /// files, in which case its parent drops it as well.
    pub fn clean(&mut self) -> bool {
        let folders = std::mem::take(&mut self.subfolders);
        self.subfolders = folders.into_iter()
            .filter(|folder| !folder.is_excluded())
            .filter_map(|mut folder| if folder.clean() { Some(folder) } else { None })
            .collect();
        self.files.retain(|file| !file.is_excluded());

        !(self.subfolders.is_empty() && self.files.is_empty())
    }

    /// Size of the file at `path` (either slash style, case-insensitive).
    /// Zero when any segment is missing.
    pub fn file_size(&self, path: &str) -> u64 {
        let path = path.replace('\\', "/");
        match path.split_once('/') {
            Some((head, rest)) => match self.find_folder(head) {
                Some(folder) => folder.file_size(rest),
                None => 0,
            },
            None => self.find_file(&path).map(|file| file.size).unwrap_or(0),
        }
    }

    /// Recursively adds what is found under `dir` to this node.
    ///
    /// - `file_filter` only keeps files whose name matches.
    /// - `allowed_base_folders` (lowercase names) restricts which subfolders of
    ///   `dir` are entered, and whether the files directly in `dir` are added
    ///   (only when the name of `dir` itself is allowed). Deeper levels are
    ///   not restricted.
    ///
    /// Hidden entries are skipped.
    pub fn find_all_files(&mut self, dir: &Path, file_filter: Option<&Regex>,
                          allowed_base_folders: Option<&[LwcString]>) -> Result<()> {
        if !dir.is_dir() {
            debug!("find_all_files: {:?} is not a directory, nothing to add", dir);
            return Ok(());
        }
        let is_allowed = |name: &str| match allowed_base_folders {
            None => true,
            Some(allowed) => allowed.iter().any(|item| item == name),
        };

        let entries = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();
        let mut dirs = vec![];
        let mut files = vec![];
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => bail!("Could not list directory {:?}\n -> {:?}", dir, error),
            };
            let name = entry.file_name().to_string_lossy().to_string();
            if is_hidden(&name) {
                debug!("find_all_files: skip hidden {:?}", entry.path());
                continue;
            }
            if entry.file_type().is_dir() {
                dirs.push((name, entry.into_path()));
            } else if entry.file_type().is_file() {
                let size = match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(error) => {
                        warn!("find_all_files: could not get size of {:?} - {}", entry.path(), error);
                        0
                    }
                };
                files.push((name, size));
            }
        }

        for (name, path) in dirs {
            if is_allowed(&name) {
                let mut folder = FolderNode::new(&name);
                folder.find_all_files(&path, file_filter, None)?;
                self.add_folder(folder);
            }
        }

        let dir_name = match dir.file_name() {
            Some(name) => name.to_string_lossy().to_string(),
            None => ".".to_owned(),
        };
        if is_allowed(&dir_name) {
            for (name, size) in files {
                let matches = file_filter.map(|regex| regex.is_match(&name)).unwrap_or(true);
                if matches {
                    self.add_file(FileNode::new(&name, size));
                }
            }
        }
        Ok(())
    }
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
