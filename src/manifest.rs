
use std::fmt::{self, Display, Formatter};
use std::path::Path;

use anyhow::{bail, Result};
use log::{debug, info};
use roxmltree::Node;

use crate::file_tree::{FileNode, FolderNode, NodeStatus};
use crate::utils::pathext::force_remove_file;
use crate::utils::text::{read_text, write_text};

const FOLDER_ELEMENT: &str = "FolderProperties";
const FILE_ELEMENT: &str = "FileProperties";
const EXCLUDED_SIZE: i64 = -1;

/// Reads a manifest file (the `FolderProperties` XML document written by the
/// packaging step).
pub fn read_manifest(path: &Path) -> Result<FolderNode> {
    let content = match read_text(path) {
        Ok(content) => content,
        Err(error) => bail!("Could not read manifest {:?}\n -> {:?}", path, error),
    };
    match parse_manifest(&content) {
        Ok(tree) => {
            info!("manifest {:?} loaded: {} folders, {} files", path, tree.folder_count(), tree.file_count());
            Ok(tree)
        }
        Err(error) => bail!("Invalid manifest {:?}\n -> {:?}", path, error),
    }
}

pub fn parse_manifest(xml: &str) -> Result<FolderNode> {
    let document = match roxmltree::Document::parse(xml) {
        Ok(document) => document,
        Err(error) => bail!("XML error: {}", error),
    };
    let root = document.root_element();
    if root.tag_name().name() != FOLDER_ELEMENT {
        bail!("Expected a <{}> root element, found <{}>", FOLDER_ELEMENT, root.tag_name().name());
    }
    parse_folder(root)
}

fn parse_folder(node: Node) -> Result<FolderNode> {
    let mut folder = FolderNode::new(node.attribute("FolderName").unwrap_or("."));
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Folders" => {
                for item in child.children().filter(|item| item.has_tag_name(FOLDER_ELEMENT)) {
                    folder.add_folder(parse_folder(item)?);
                }
            }
            "Files" => {
                for item in child.children().filter(|item| item.has_tag_name(FILE_ELEMENT)) {
                    folder.add_file(parse_file(item)?);
                }
            }
            other => debug!("manifest: ignore unknown element <{}> in folder {}", other, folder.name),
        }
    }
    Ok(folder)
}

fn parse_file(node: Node) -> Result<FileNode> {
    let file_name = node.attribute("FileName").unwrap_or("");
    let size = match node.attribute("Size") {
        None => 0,
        Some(size) => match size.trim().parse::<i64>() {
            Ok(size) => size,
            Err(error) => bail!("Invalid Size {:?} for file {:?}\n -> {}", size, file_name, error),
        },
    };
    let mut file = FileNode::new(file_name, size.max(0) as u64);
    if size < 0 {
        file.status = NodeStatus::Excluded;
    }
    Ok(file)
}

/// Renders the tree in the manifest XML format.
///
/// Excluded files are kept with `Size="-1"`; excluded folders have no
/// representation in the format and are left out.
pub fn render_manifest(tree: &FolderNode) -> String {
    ManifestXml(tree).to_string()
}

struct ManifestXml<'a>(&'a FolderNode);

impl Display for ManifestXml<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "<?xml version=\"1.0\"?>")?;
        writeln!(f, "<{} xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
                     xmlns:xsd=\"http://www.w3.org/2001/XMLSchema\" FolderName=\"{}\">",
                 FOLDER_ELEMENT, escape(&self.0.name))?;
        render_children(self.0, 1, f)?;
        writeln!(f, "</{}>", FOLDER_ELEMENT)
    }
}

fn render_folder(folder: &FolderNode, depth: usize, f: &mut Formatter<'_>) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(f, "{}<{} FolderName=\"{}\">", indent, FOLDER_ELEMENT, escape(&folder.name))?;
    render_children(folder, depth + 1, f)?;
    writeln!(f, "{}</{}>", indent, FOLDER_ELEMENT)
}

fn render_children(folder: &FolderNode, depth: usize, f: &mut Formatter<'_>) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let folders = folder.subfolders.iter().filter(|sub| !sub.is_excluded()).collect::<Vec<_>>();
    if folders.is_empty() {
        writeln!(f, "{}<Folders />", indent)?;
    } else {
        writeln!(f, "{}<Folders>", indent)?;
        for sub in folders {
            render_folder(sub, depth + 1, f)?;
        }
        writeln!(f, "{}</Folders>", indent)?;
    }
    if folder.files.is_empty() {
        return writeln!(f, "{}<Files />", indent);
    }
    writeln!(f, "{}<Files>", indent)?;
    for file in &folder.files {
        let size = if file.is_excluded() { EXCLUDED_SIZE } else { file.size as i64 };
        writeln!(f, "{}  <{} FileName=\"{}\" Size=\"{}\" />",
                 indent, FILE_ELEMENT, escape(&file.file_name), size)?;
    }
    writeln!(f, "{}</Files>", indent)
}

/// Writes the manifest, replacing (even read-only) any previous file.
pub fn write_manifest(path: &Path, tree: &FolderNode) -> Result<()> {
    if path.exists() {
        if let Err(error) = force_remove_file(path) {
            bail!("Could not replace existing manifest {:?}\n -> {:?}", path, error);
        }
    }
    if let Some(parent) = path.parent() {
        if let Err(error) = std::fs::create_dir_all(parent) {
            bail!("Could not create manifest directory {:?}\n -> {:?}", parent, error);
        }
    }
    write_text(path, &render_manifest(tree))?;
    info!("manifest saved to {:?}", path);
    Ok(())
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}
