
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::batch::BatchOutcome;

pub const BACKUP_DIR: &str = "UDKGame/ProjectTemplates/BaseTemplate";
const BACKUP_BASE_DIRS: [&str; 3] = ["Binaries", "Development", "Engine"];
const GAME_DIR: &str = "UDKGame";
const GAME_DIRS_NOT_BACKED_UP: [&str; 2] = ["Content", "ProjectTemplates"];

/// Copies the content of `source` into `target`, creating directories as
/// needed. Existing files are only replaced when `overwrite` is set, otherwise
/// they are left alone.
///
/// A missing `source` gives a failed outcome. Files that can't be copied are
/// recorded and the copy goes on.
pub fn copy_directory(source: &Path, target: &Path, overwrite: bool) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();
    if !source.is_dir() {
        outcome.record_failure(source, "source directory does not exist");
        return outcome;
    }
    let copy_options = fs_extra::file::CopyOptions {
        overwrite,
        skip_exist: !overwrite,
        ..fs_extra::file::CopyOptions::new()
    };
    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| source.to_path_buf());
                outcome.record_failure(&path, error);
                continue;
            }
        };
        let destination = match entry.path().strip_prefix(source) {
            Ok(relative) => target.join(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            if let Err(error) = std::fs::create_dir_all(&destination) {
                outcome.record_failure(&destination, error);
            }
            continue;
        }
        match fs_extra::file::copy(entry.path(), &destination, &copy_options) {
            Ok(0) if destination.exists() && !overwrite => {
                debug!("keep existing {:?}", destination);
                outcome.record_success();
            }
            Ok(_) => outcome.record_success(),
            Err(error) => outcome.record_failure(entry.path(), error),
        }
    }
    debug!("copy {:?} -> {:?}: {}", source, target, outcome);
    outcome
}

/// Folders of `install_dir` saved into the base template.
///
/// A game folder that can't be listed is recorded in `outcome`; a missing one
/// just has nothing to back up.
pub fn backup_directories(install_dir: &Path, outcome: &mut BatchOutcome) -> Vec<PathBuf> {
    let mut dirs = BACKUP_BASE_DIRS.iter().map(PathBuf::from).collect::<Vec<_>>();
    let game_dir = install_dir.join(GAME_DIR);
    if !game_dir.is_dir() {
        return dirs;
    }
    for entry in WalkDir::new(&game_dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| game_dir.clone());
                outcome.record_failure(&path, error);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.file_type().is_dir() && !GAME_DIRS_NOT_BACKED_UP.contains(&name.as_str()) {
            dirs.push(Path::new(GAME_DIR).join(name));
        }
    }
    dirs
}

/// Saves a pristine copy of the install into its base project template, when
/// that template folder exists. Nothing already there is overwritten.
///
/// `progress` gets the folder being copied, its index and the folder count.
pub fn copy_backup_files(install_dir: &Path, mut progress: impl FnMut(&Path, usize, usize)) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();
    let backup_dir = install_dir.join(BACKUP_DIR);
    if !backup_dir.is_dir() {
        info!("no base template in {:?}, no backup made", install_dir);
        return outcome;
    }
    let dirs = backup_directories(install_dir, &mut outcome);
    for (index, relative) in dirs.iter().enumerate() {
        progress(relative, index, dirs.len());
        let source = install_dir.join(relative);
        if !source.is_dir() {
            warn!("nothing to back up in {:?}", source);
            continue;
        }
        outcome.merge(copy_directory(&source, &backup_dir.join(relative), false));
    }
    info!("backup into {:?}: {}", backup_dir, outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::batch::BatchOutcome;

    use super::{backup_directories, copy_backup_files, copy_directory, BACKUP_DIR};

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn copy_keeps_existing_files_unless_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        write(&source.join("a.txt"), "new a");
        write(&source.join("sub/b.txt"), "new b");
        std::fs::create_dir_all(source.join("empty")).unwrap();
        write(&target.join("a.txt"), "old a");

        let outcome = copy_directory(&source, &target, false);
        assert!(outcome.success(), "{}", outcome);
        assert_eq!(std::fs::read_to_string(target.join("a.txt")).unwrap(), "old a");
        assert_eq!(std::fs::read_to_string(target.join("sub/b.txt")).unwrap(), "new b");
        assert!(target.join("empty").is_dir());

        let outcome = copy_directory(&source, &target, true);
        assert!(outcome.success(), "{}", outcome);
        assert_eq!(std::fs::read_to_string(target.join("a.txt")).unwrap(), "new a");
    }

    #[test]
    fn copy_from_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = copy_directory(&dir.path().join("missing"), &dir.path().join("target"), false);
        assert!(!outcome.success());
        assert!(!dir.path().join("target").exists());
    }

    #[test]
    fn backup_into_base_template() {
        let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();
        let install = tempfile::tempdir().unwrap();
        let root = install.path();
        write(&root.join("Binaries/Win32/UDK.exe"), "exe");
        write(&root.join("Development/Src/Core/Core.uc"), "core");
        write(&root.join("UDKGame/Config/DefaultGame.ini"), "[A]\nB=C\n");
        write(&root.join("UDKGame/Content/Huge.upk"), "content");
        write(&root.join("UDKGame/ProjectTemplates/BaseTemplate/Binaries/Win32/UDK.exe"), "already there");

        let mut listing = BatchOutcome::new();
        assert_eq!(backup_directories(root, &mut listing), vec![
            PathBuf::from("Binaries"), PathBuf::from("Development"), PathBuf::from("Engine"),
            PathBuf::from("UDKGame/Config"),
        ]);
        assert!(listing.success());

        let mut steps = vec![];
        let outcome = copy_backup_files(root, |dir, index, count| steps.push((dir.to_path_buf(), index, count)));

        assert!(outcome.success(), "{}", outcome);
        assert_eq!(steps.len(), 4);
        assert_eq!(steps[3], (PathBuf::from("UDKGame/Config"), 3, 4));
        let backup = root.join(BACKUP_DIR);
        assert_eq!(std::fs::read_to_string(backup.join("Binaries/Win32/UDK.exe")).unwrap(), "already there");
        assert!(backup.join("Development/Src/Core/Core.uc").is_file());
        assert!(backup.join("UDKGame/Config/DefaultGame.ini").is_file());
        assert!(!backup.join("UDKGame/Content").exists());
    }

    #[test]
    fn no_base_template_no_backup() {
        let install = tempfile::tempdir().unwrap();
        write(&install.path().join("Binaries/UDK.exe"), "exe");
        let outcome = copy_backup_files(install.path(), |_, _, _| {});
        assert!(outcome.success());
        assert_eq!(outcome.processed, 0);
        assert!(!install.path().join(BACKUP_DIR).exists());
    }

    #[test]
    fn failing_file_does_not_stop_the_copy() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source");
        let target = dir.path().join("target");
        write(&source.join("a.txt"), "a");
        write(&source.join("b.txt"), "b");
        // a directory where a.txt should be written
        std::fs::create_dir_all(target.join("a.txt").join("content")).unwrap();

        let outcome = copy_directory(&source, &target, true);

        assert!(!outcome.success());
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failed_items.len(), 1);
        assert_eq!(outcome.failed_items[0].path, source.join("a.txt"));
        assert_eq!(std::fs::read_to_string(target.join("b.txt")).unwrap(), "b");
    }

    #[test]
    fn missing_game_dir_is_not_a_failure() {
        let install = tempfile::tempdir().unwrap();
        let mut listing = BatchOutcome::new();
        assert_eq!(backup_directories(install.path(), &mut listing).len(), 3);
        assert!(listing.success());
    }
}
