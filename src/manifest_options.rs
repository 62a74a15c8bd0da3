
use std::path::Path;

use anyhow::{bail, Result};
use log::{debug, info};
use roxmltree::Node;

use crate::file_spec::{add_file_spec, filter_out_file_specs, find_parent_folder, FileSpec};
use crate::file_tree::{FileNode, FolderNode};
use crate::lowercase::LwcString;
use crate::utils::text::read_text;

const GAME_NAME_WILDCARD: &str = "%GAMENAME%";
const PLATFORM_WILDCARD: &str = "%PLATFORM%";

/// Installer options, always shipped with the main manifest.
pub const MANIFEST_OPTIONS_FILE: &str = "Binaries/UnSetup.Manifests.xml";
/// Marks an install package as a game, always shipped with the game manifest.
pub const GAME_OPTIONS_FILE: &str = "Binaries/UnSetup.Game.xml";

/// What goes into the install packages (`UnSetup.Manifests.xml`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
    pub root_name: String,
    pub full_name: String,
    pub app_to_launch: String,
    pub main_files_to_exclude: Vec<String>,
    pub game_files_to_exclude: Vec<String>,
    pub required_folders: Vec<String>,
    pub game_files_to_include: Vec<String>,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        ManifestOptions {
            root_name: "UDK".to_string(),
            full_name: "Unreal Development Kit".to_string(),
            app_to_launch: "Win32\\UDK.exe".to_string(),
            main_files_to_exclude: vec![],
            game_files_to_exclude: vec![],
            required_folders: vec![],
            game_files_to_include: vec![],
        }
    }
}

impl ManifestOptions {
    pub fn read(path: &Path) -> Result<ManifestOptions> {
        let content = match read_text(path) {
            Ok(content) => content,
            Err(error) => bail!("Could not read manifest options {:?}\n -> {:?}", path, error),
        };
        match ManifestOptions::parse(&content) {
            Ok(options) => Ok(options),
            Err(error) => bail!("Invalid manifest options {:?}\n -> {:?}", path, error),
        }
    }

    /// Elements that are absent keep their default value.
    pub fn parse(xml: &str) -> Result<ManifestOptions> {
        let document = match roxmltree::Document::parse(xml) {
            Ok(document) => document,
            Err(error) => bail!("XML error: {}", error),
        };
        let mut options = ManifestOptions::default();
        for child in document.root_element().children().filter(Node::is_element) {
            let text = || child.text().unwrap_or("").trim().to_owned();
            match child.tag_name().name() {
                "RootName" => options.root_name = text(),
                "FullName" => options.full_name = text(),
                "AppToLaunch" => options.app_to_launch = text(),
                "MainFilesToExclude" => options.main_files_to_exclude = string_array(child),
                "GameFilesToExclude" => options.game_files_to_exclude = string_array(child),
                "RequiredFolders" => options.required_folders = string_array(child),
                "GameFilesToInclude" => options.game_files_to_include = string_array(child),
                other => debug!("manifest options: ignore element <{}>", other),
            }
        }
        Ok(options)
    }

    /// Replaces `%GAMENAME%` and `%PLATFORM%` everywhere.
    pub fn fixup_wildcards(&mut self, game_name: &str, platform: &str) {
        let fixup = |value: &mut String| {
            *value = value.replace(GAME_NAME_WILDCARD, game_name).replace(PLATFORM_WILDCARD, platform);
        };
        fixup(&mut self.root_name);
        fixup(&mut self.full_name);
        fixup(&mut self.app_to_launch);
        self.main_files_to_exclude.iter_mut()
            .chain(self.game_files_to_exclude.iter_mut())
            .chain(self.required_folders.iter_mut())
            .chain(self.game_files_to_include.iter_mut())
            .for_each(fixup);
    }
}

fn string_array(node: Node) -> Vec<String> {
    node.children()
        .filter(Node::is_element)
        .map(|item| item.text().unwrap_or("").trim().to_owned())
        .collect()
}

#[derive(Debug)]
pub struct ManifestSummary {
    pub tree: FolderNode,
    /// Nodes marked by the exclusion specs.
    pub filtered: usize,
}

/// Scans `root` and drops what `main_files_to_exclude` selects. The installer
/// options file is kept whatever the exclusions.
pub fn create_manifest(root: &Path, options: &ManifestOptions) -> Result<ManifestSummary> {
    let excludes = FileSpec::parse_all(&options.main_files_to_exclude)?;
    if !root.is_dir() {
        bail!("Could not create manifest, {:?} is not a directory", root);
    }
    let mut tree = FolderNode::default();
    tree.find_all_files(root, None, None)?;
    let filtered = filter_out_file_specs(&mut tree, &excludes);
    tree.clean();
    add_descriptor(&mut tree, root, MANIFEST_OPTIONS_FILE)?;
    info!("manifest created with {} folders and {} files ({} filtered out)",
        tree.folder_count(), tree.file_count(), filtered);
    Ok(ManifestSummary { tree, filtered })
}

/// Derives the game manifest from the main one: the required folders must
/// exist under `root`, `game_files_to_exclude` is dropped from `base_tree`,
/// then the files selected by `game_files_to_include` are scanned from `root`.
/// `root` must hold the game options file, which is always part of the result.
pub fn game_create_manifest(root: &Path, base_tree: FolderNode, options: &ManifestOptions) -> Result<ManifestSummary> {
    let excludes = FileSpec::parse_all(&options.game_files_to_exclude)?;
    let includes = FileSpec::parse_all(&options.game_files_to_include)?;
    if !root.join(GAME_OPTIONS_FILE).is_file() {
        bail!("Game needs the configuration file {} in {:?}", GAME_OPTIONS_FILE, root);
    }
    for required in &options.required_folders {
        if !root.join(required.replace('\\', "/")).is_dir() {
            bail!("Missing required folder '{}' in {:?}. Has data been cooked?", required, root);
        }
    }

    let mut tree = base_tree;
    let filtered = filter_out_file_specs(&mut tree, &excludes);
    tree.clean();
    info!("filtered out {} filespecs", filtered);

    for spec in &includes {
        add_file_spec(&mut tree, root, spec)?;
    }
    tree.clean();
    add_descriptor(&mut tree, root, GAME_OPTIONS_FILE)?;
    info!("game manifest created with {} folders and {} files", tree.folder_count(), tree.file_count());
    Ok(ManifestSummary { tree, filtered })
}

/// Puts `root/relative` in the tree (replacing any node of that name), after
/// the exclusions so nothing can drop it.
fn add_descriptor(tree: &mut FolderNode, root: &Path, relative: &str) -> Result<()> {
    let path = root.join(relative);
    let size = match std::fs::metadata(&path) {
        Ok(metadata) => metadata.len(),
        Err(error) => bail!("Could not read installer file {:?}\n -> {:?}", path, error),
    };
    let (folder_path, file_name) = relative.rsplit_once('/').unwrap_or(("", relative));
    let folder = find_parent_folder(tree, folder_path);
    let name = LwcString::new(file_name);
    folder.files.retain(|file| name != file.file_name);
    folder.add_file(FileNode::new(file_name, size));
    debug!("{} added to the manifest ({} bytes)", relative, size);
    Ok(())
}
