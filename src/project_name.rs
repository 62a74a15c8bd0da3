
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;

use anyhow::Result;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::file_tree::FolderNode;
use crate::lowercase::{lwc, LwcString};
use crate::manifest::read_manifest;

lazy_static! {
    static ref PROJECT_NAME_REGEX: Regex = Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]*$").unwrap();
}

const SOURCE_ROOT: [&str; 2] = ["Development", "Src"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameCheck {
    Valid,
    Empty,
    InvalidCharacters,
    AlreadyExists,
}

impl Display for NameCheck {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            NameCheck::Valid => "valid",
            NameCheck::Empty => "the name is empty",
            NameCheck::InvalidCharacters => "the name must start with a letter and contain only letters, digits and '_'",
            NameCheck::AlreadyExists => "a project with this name already exists under Development/Src",
        };
        write!(f, "{}", text)
    }
}

/// Names already taken by the reference install, read once from its manifest
/// and reused for every check.
#[derive(Debug, Clone, Default)]
pub struct NameValidation {
    existing_projects: HashSet<LwcString>,
}

impl NameValidation {
    pub fn from_manifest(manifest_path: &Path) -> Result<NameValidation> {
        Ok(NameValidation::from_tree(&read_manifest(manifest_path)?))
    }

    pub fn from_tree(tree: &FolderNode) -> NameValidation {
        let mut folder = Some(tree);
        for name in SOURCE_ROOT {
            folder = folder.and_then(|current| current.find_folder(name));
        }
        let existing_projects = match folder {
            None => HashSet::new(),
            Some(src) => src.subfolders.iter().map(|sub| lwc!(&sub.name)).collect(),
        };
        debug!("project names in use: {:?}", existing_projects);
        NameValidation { existing_projects }
    }

    pub fn check(&self, name: &str) -> NameCheck {
        if name.is_empty() {
            NameCheck::Empty
        } else if !PROJECT_NAME_REGEX.is_match(name) {
            NameCheck::InvalidCharacters
        } else if self.existing_projects.contains(&lwc!(name)) {
            NameCheck::AlreadyExists
        } else {
            NameCheck::Valid
        }
    }
}

pub fn validate_project_name(validation: &NameValidation, name: &str) -> bool {
    validation.check(name) == NameCheck::Valid
}
