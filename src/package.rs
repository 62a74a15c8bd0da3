
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::{debug, info};
use zip::ZipArchive;

use crate::batch::BatchOutcome;
use crate::file_tree::FolderNode;
use crate::lowercase::{lwc, LwcString};
use crate::utils::pathext::force_remove_file;

/// An opened installer package (zip archive).
///
/// The archive stays open for as long as the value lives; `close` (or drop)
/// releases it.
pub struct Package {
    path: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    index: HashMap<LwcString, usize>,
}

impl Package {
    pub fn open(path: &Path) -> Result<Package> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) => bail!("Could not open package {:?}\n -> {:?}", path, error),
        };
        let archive = match ZipArchive::new(BufReader::new(file)) {
            Ok(archive) => archive,
            Err(error) => bail!("Could not read package {:?} as a zip archive\n -> {:?}", path, error),
        };
        let index = (0..archive.len())
            .filter_map(|index| archive.name_for_index(index).map(|name| (index, name)))
            .filter(|(_, name)| !name.ends_with('/'))
            .map(|(index, name)| (entry_key(name), index))
            .collect::<HashMap<_, _>>();
        info!("package {:?} opened, {} file(s)", path, index.len());
        Ok(Package { path: path.to_path_buf(), archive, index })
    }

    pub fn close(self) {
        debug!("package {:?} closed", self.path);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the files (not directories) in archive order.
    pub fn list_files(&self) -> Vec<String> {
        self.archive.file_names()
            .filter(|name| !name.ends_with('/'))
            .map(str::to_owned)
            .collect()
    }

    /// Looks `name` up ignoring case and slash style.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&entry_key(name))
    }

    pub fn total_uncompressed_size(&mut self) -> Result<u64> {
        let mut total = 0;
        for index in 0..self.archive.len() {
            let entry = self.archive.by_index(index)?;
            if entry.is_file() {
                total += entry.size();
            }
        }
        Ok(total)
    }

    /// Extracts one file under `dest_root`, at its path in the archive.
    /// An existing file is replaced (even read-only). Returns false when the
    /// package has no such file.
    pub fn extract_file(&mut self, name: &str, dest_root: &Path) -> Result<bool> {
        let index = match self.index.get(&entry_key(name)) {
            Some(index) => *index,
            None => {
                debug!("{} is not in package {:?}", name, self.path);
                return Ok(false);
            }
        };
        self.extract_index(index, dest_root)?;
        Ok(true)
    }

    fn extract_index(&mut self, index: usize, dest_root: &Path) -> Result<PathBuf> {
        let mut entry = self.archive.by_index(index)?;
        let relative = match entry.enclosed_name() {
            Some(relative) => relative,
            None => bail!("Unsafe path {:?} in package {:?}", entry.name(), self.path),
        };
        let target = dest_root.join(relative);
        if target.exists() {
            force_remove_file(&target)?;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        std::io::copy(&mut entry, &mut out)?;
        debug!("extracted {:?}", target);
        Ok(target)
    }

    /// Extracts every file of the package under `dest_root`.
    pub fn extract_all(&mut self, dest_root: &Path) -> BatchOutcome {
        let mut outcome = BatchOutcome::new();
        let mut indices = self.index.values().copied().collect::<Vec<_>>();
        indices.sort_unstable();
        for index in indices {
            match self.extract_index(index, dest_root) {
                Ok(_) => outcome.record_success(),
                Err(error) => {
                    let name = self.archive.name_for_index(index).unwrap_or("?").to_owned();
                    outcome.record_failure(Path::new(&name), error)
                }
            }
        }
        info!("package {:?} extracted to {:?}: {}", self.path, dest_root, outcome);
        outcome
    }
}

fn entry_key(name: &str) -> LwcString {
    lwc!(name.replace('\\', "/").trim_start_matches('/'))
}

/// Extracts the files of `tree` that are not excluded, calling `progress`
/// with each file path before extracting it.
pub fn extract_tree(package: &mut Package, tree: &FolderNode, dest_root: &Path,
                    mut progress: impl FnMut(&str)) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();
    extract_folder(package, tree, "", dest_root, &mut progress, &mut outcome);
    info!("{} extracted from {:?}", outcome, package.path());
    outcome
}

fn extract_folder(package: &mut Package, folder: &FolderNode, prefix: &str, dest_root: &Path,
                  progress: &mut dyn FnMut(&str), outcome: &mut BatchOutcome) {
    for file in folder.files.iter().filter(|file| !file.is_excluded()) {
        let name = format!("{}{}", prefix, file.file_name);
        progress(&name);
        match package.extract_file(&name, dest_root) {
            Ok(true) => outcome.record_success(),
            Ok(false) => outcome.record_failure(Path::new(&name), "not found in package"),
            Err(error) => outcome.record_failure(Path::new(&name), error),
        }
    }
    for sub in folder.subfolders.iter().filter(|sub| !sub.is_excluded()) {
        let sub_prefix = format!("{}{}/", prefix, sub.name);
        extract_folder(package, sub, &sub_prefix, dest_root, progress, outcome);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;

    use zip::write::SimpleFileOptions;

    use crate::file_tree::{FileNode, FolderNode};

    use super::{extract_tree, Package};

    fn write_package(path: &Path, entries: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(std::fs::File::create(path).unwrap());
        for (name, content) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, SimpleFileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap();
    }

    fn sample_package(dir: &Path) -> Package {
        let path = dir.join("UDKInstall.zip");
        write_package(&path, &[
            ("Binaries/", ""),
            ("Binaries/UDK.exe", "udk-binary"),
            ("Binaries/debug.log", "log"),
            ("UDKGame/Config/DefaultGame.ini", "[Engine.GameInfo]\r\n"),
            ("readme.txt", "hello"),
        ]);
        Package::open(&path).unwrap()
    }

    #[test]
    fn list_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let mut package = sample_package(dir.path());

        assert_eq!(package.list_files(), vec![
            "Binaries/UDK.exe", "Binaries/debug.log", "UDKGame/Config/DefaultGame.ini", "readme.txt",
        ]);
        assert!(package.contains("binaries\\udk.exe"));
        assert!(!package.contains("Binaries"));
        assert_eq!(package.total_uncompressed_size().unwrap(), 10 + 3 + 19 + 5);
    }

    #[test]
    fn extract_single_file_replacing_existing() {
        let dir = tempfile::tempdir().unwrap();
        let mut package = sample_package(dir.path());
        let dest = dir.path().join("install");
        let existing = dest.join("Binaries").join("UDK.exe");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, "old").unwrap();
        let mut permissions = std::fs::metadata(&existing).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&existing, permissions).unwrap();

        assert!(package.extract_file("Binaries/UDK.exe", &dest).unwrap());
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "udk-binary");
        assert!(!package.extract_file("Binaries/missing.exe", &dest).unwrap());
        package.close();
    }

    #[test]
    fn extract_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut package = sample_package(dir.path());
        let dest = dir.path().join("install");

        let outcome = package.extract_all(&dest);

        assert!(outcome.success());
        assert_eq!(outcome.processed, 4);
        assert_eq!(std::fs::read_to_string(dest.join("readme.txt")).unwrap(), "hello");
        assert!(dest.join("UDKGame/Config/DefaultGame.ini").is_file());
    }

    #[test]
    fn extract_tree_skips_excluded_nodes() {
        let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
        let dir = tempfile::tempdir().unwrap();
        let mut package = sample_package(dir.path());
        let dest = dir.path().join("install");

        let mut tree = FolderNode::default();
        let mut binaries = FolderNode::new("Binaries");
        binaries.add_file(FileNode::new("UDK.exe", 10));
        let mut debug_log = FileNode::new("debug.log", 3);
        debug_log.exclude();
        binaries.add_file(debug_log);
        tree.add_folder(binaries);
        let mut game = FolderNode::new("UDKGame");
        game.exclude();
        tree.add_folder(game);
        tree.add_file(FileNode::new("missing.txt", 1));

        let mut seen = vec![];
        let outcome = extract_tree(&mut package, &tree, &dest, |name| seen.push(name.to_string()));

        assert_eq!(seen, vec!["missing.txt", "Binaries/UDK.exe"]);
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failed_items.len(), 1);
        assert_eq!(outcome.failed_items[0].path, Path::new("missing.txt"));
        assert!(dest.join("Binaries/UDK.exe").is_file());
        assert!(!dest.join("Binaries/debug.log").exists());
        assert!(!dest.join("UDKGame").exists());
    }

    #[test]
    fn open_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not-a-zip.zip");
        std::fs::write(&path, "plain text").unwrap();
        assert!(Package::open(&path).is_err());
        assert!(Package::open(&dir.path().join("missing.zip")).is_err());
    }
}
