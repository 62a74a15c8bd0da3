
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::debug;
use regex::{Regex, RegexBuilder};

use crate::file_tree::FolderNode;
use crate::lowercase::LwcString;

/// A path-like selector such as `Binaries/Win32/.*\.pdb` turned into
/// `["Binaries", "Win32"]` + a case-insensitive regex on the last segment.
///
/// Both slash styles are accepted; backslashes are read as separators
/// everywhere, including in the regex part (write `[.]` rather than `\.`).
#[derive(Debug, Clone)]
pub struct FileSpec {
    raw: String,
    folders: Vec<String>,
    leaf: Regex,
}

impl FileSpec {
    pub fn parse(spec: &str) -> Result<FileSpec> {
        let normalized = spec.replace('\\', "/");
        let (folders, leaf) = match normalized.rsplit_once('/') {
            None => (vec![], normalized.as_str()),
            Some((folders, leaf)) => (folders.split('/').map(str::to_owned).collect(), leaf),
        };
        let leaf = match RegexBuilder::new(leaf).case_insensitive(true).build() {
            Ok(regex) => regex,
            Err(error) => bail!("Invalid file spec {:?}, the last segment is not a valid regex\n -> {}", spec, error),
        };
        Ok(FileSpec { raw: spec.to_owned(), folders, leaf })
    }

    pub fn parse_all(specs: &[String]) -> Result<Vec<FileSpec>> {
        specs.iter().map(|spec| FileSpec::parse(spec)).collect()
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    pub fn folder_path(&self) -> PathBuf {
        self.folders.iter().filter(|segment| !segment.is_empty()).collect()
    }

    pub fn leaf(&self) -> &Regex {
        &self.leaf
    }
}

impl Display for FileSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Marks as excluded every direct child (folder or file) of the folder
/// designated by `spec` whose name matches the regex part.
///
/// Returns how many nodes were marked. When the folder part does not exist in
/// the tree nothing happens and 0 is returned.
pub fn filter_out_file_spec(folder: &mut FolderNode, spec: &FileSpec) -> usize {
    filter_out_segments(folder, spec.folders(), spec.leaf())
}

fn filter_out_segments(folder: &mut FolderNode, segments: &[String], leaf: &Regex) -> usize {
    match segments.split_first() {
        Some((head, rest)) => {
            let head = LwcString::new(head);
            match folder.subfolders.iter_mut().find(|sub| head == sub.name) {
                Some(sub) => filter_out_segments(sub, rest, leaf),
                None => {
                    debug!("filter_out_file_spec: no folder {} under {}", head, folder.name);
                    0
                }
            }
        }
        None => {
            let mut count = 0;
            for sub in folder.subfolders.iter_mut().filter(|sub| leaf.is_match(&sub.name)) {
                sub.exclude();
                count += 1;
            }
            for file in folder.files.iter_mut().filter(|file| leaf.is_match(&file.file_name)) {
                file.exclude();
                count += 1;
            }
            count
        }
    }
}

/// Applies every spec, returns the total count of marked nodes.
pub fn filter_out_file_specs(folder: &mut FolderNode, specs: &[FileSpec]) -> usize {
    specs.iter().map(|spec| {
        let count = filter_out_file_spec(folder, spec);
        debug!("file spec {} filtered {} node(s)", spec, count);
        count
    }).sum()
}

/// Walks `folder_path` from `folder`, creating the folders that don't exist yet.
/// Existing names are matched case-insensitively.
pub fn find_parent_folder<'a>(folder: &'a mut FolderNode, folder_path: &str) -> &'a mut FolderNode {
    let folder_path = folder_path.replace('\\', "/");
    let mut current = folder;
    for segment in folder_path.split('/').filter(|segment| !segment.is_empty()) {
        let name = LwcString::new(segment);
        let index = match current.subfolders.iter().rposition(|sub| name == sub.name) {
            Some(index) => index,
            None => {
                current.add_folder(FolderNode::new(segment));
                current.subfolders.len() - 1
            }
        };
        current = &mut current.subfolders[index];
    }
    current
}

/// Adds to the tree the files on disk (under `root_dir`) selected by `spec`:
/// the folder part is created in the tree if needed, then the matching
/// directory is scanned recursively for file names matching the regex part.
///
/// Returns the number of files added.
pub fn add_file_spec(tree: &mut FolderNode, root_dir: &Path, spec: &FileSpec) -> Result<usize> {
    let relative = spec.folder_path();
    let folder = find_parent_folder(tree, &spec.folders().join("/"));
    let before = folder.file_count();
    folder.find_all_files(&root_dir.join(&relative), Some(spec.leaf()), None)?;
    let added = folder.file_count() - before;
    debug!("add_file_spec {} added {} file(s) from {:?}", spec, added, relative);
    Ok(added)
}
