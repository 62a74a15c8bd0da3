
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::batch::BatchOutcome;
use crate::utils::pathext::{force_remove_file, to_slash_string};
use crate::utils::text::{read_text, write_text};

const TEMPLATE_GAME_DIR: &str = "Src/TemplateGame";
const CONFIG_DIR: &str = "UDKGame/Config";
const FILE_NAME_PREFIX: &str = "Template";
const FULL_NAME_TOKEN: &str = "TEMPLATE_FULL_NAME";
const SHORT_NAME_TOKEN: &str = "TEMPLATE_SHORT_NAME";

/// Copies the template unpacked in `target_dir/template_relative` into
/// `target_dir`, renaming `TemplateGame` after `short_name` and substituting
/// the name tokens in config and script files.
///
/// Files directly in the template root are not copied. A missing target or
/// template dir is reported as a failed outcome without copying anything.
pub fn copy_template_files(target_dir: &Path, template_relative: &Path, short_name: &str) -> BatchOutcome {
    let mut outcome = BatchOutcome::new();
    if !target_dir.is_dir() {
        outcome.record_failure(target_dir, "target directory does not exist");
        return outcome;
    }
    let source_dir = target_dir.join(template_relative);
    if !source_dir.is_dir() {
        outcome.record_failure(&source_dir, "template directory does not exist");
        return outcome;
    }
    let renamed_game_dir = format!("Src/{}Game", short_name);

    for entry in WalkDir::new(&source_dir).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.clone());
                outcome.record_failure(&path, error);
                continue;
            }
        };
        let relative = match entry.path().strip_prefix(&source_dir) {
            Ok(relative) => to_slash_string(relative),
            Err(_) => continue,
        };
        if entry.file_type().is_dir() {
            let target = target_dir.join(relative.replace(TEMPLATE_GAME_DIR, &renamed_game_dir));
            match std::fs::create_dir_all(&target) {
                Ok(()) => debug!("template dir {:?}", target),
                Err(error) => outcome.record_failure(&target, error),
            }
            continue;
        }
        if !relative.contains('/') {
            debug!("skip template root file {}", relative);
            continue;
        }
        let target = target_dir.join(destination_path(&relative, short_name));
        match copy_template_file(entry.path(), &relative, &target, short_name) {
            Ok(()) => outcome.record_success(),
            Err(error) => outcome.record_failure(entry.path(), error),
        }
    }
    info!("template {:?} copied for {}: {}", template_relative, short_name, outcome);
    outcome
}

/// Relative destination of a template file (slash separated).
pub fn destination_path(relative: &str, short_name: &str) -> PathBuf {
    let renamed = relative.replace(TEMPLATE_GAME_DIR, &format!("Src/{}Game", short_name));
    let (parent, file_name) = match renamed.rsplit_once('/') {
        Some((parent, file_name)) => (Some(parent), file_name),
        None => (None, renamed.as_str()),
    };
    let file_name = match file_name.strip_prefix(FILE_NAME_PREFIX) {
        Some(rest) => format!("{}{}", short_name, rest),
        None => file_name.to_owned(),
    };
    match parent {
        Some(parent) => Path::new(parent).join(file_name),
        None => PathBuf::from(file_name),
    }
}

fn needs_substitution(relative: &str) -> bool {
    let extension = Path::new(relative).extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "ini" => relative.contains(CONFIG_DIR),
        "uc" => relative.contains(TEMPLATE_GAME_DIR),
        _ => false,
    }
}

fn copy_template_file(source: &Path, relative: &str, target: &Path, short_name: &str) -> Result<()> {
    if target.exists() {
        force_remove_file(target)?;
    }
    if let Some(parent) = target.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if needs_substitution(relative) {
        let content = read_text(source)?;
        let content = content
            .replace(FULL_NAME_TOKEN, short_name)
            .replace(SHORT_NAME_TOKEN, short_name);
        write_text(target, &content)?;
        debug!("template file {} rewritten to {:?}", relative, target);
    } else {
        let mut copy_options = fs_extra::file::CopyOptions::new();
        copy_options.overwrite = true;
        if let Err(error) = fs_extra::file::copy(source, target, &copy_options) {
            warn!("could not copy template file {} to {:?}", relative, target);
            bail!("Could not copy {:?} to {:?}\n -> {}", source, target, error);
        }
        debug!("template file {} copied to {:?}", relative, target);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{copy_template_files, destination_path};

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn destination_renames_game_dir_and_prefix() {
        assert_eq!(destination_path("Development/Src/TemplateGame/Classes/TemplateGameInfo.uc", "Foo"),
                   PathBuf::from("Development/Src/FooGame/Classes/FooGameInfo.uc"));
        assert_eq!(destination_path("UDKGame/Config/DefaultGame.ini", "Foo"),
                   PathBuf::from("UDKGame/Config/DefaultGame.ini"));
        assert_eq!(destination_path("UDKGame/Content/TemplateMap.udk", "Foo"),
                   PathBuf::from("UDKGame/Content/FooMap.udk"));
    }

    #[test]
    fn copy_renames_and_substitutes() {
        let _ = env_logger::builder().is_test(true).filter_level(log::LevelFilter::Debug).try_init();

        let target = tempfile::tempdir().unwrap();
        let template = Path::new("UDKGame/ProjectTemplates/Empty");
        let source = target.path().join(template);
        write(&source.join("Src/TemplateGame/TemplateGameClasses.uc"), "class TEMPLATE_SHORT_NAME extends Object;");
        write(&source.join("UDKGame/Config/DefaultGame.ini"),
              "[Engine.GameInfo]\r\nDefaultGame=TEMPLATE_SHORT_NAME.TEMPLATE_FULL_NAMEInfo\r\n");
        write(&source.join("UDKGame/Content/TEMPLATE_SHORT_NAME.txt"), "TEMPLATE_SHORT_NAME");
        write(&source.join("ConfigInfo.xml"), "<ConfigOptions />");
        std::fs::create_dir_all(source.join("Src/TemplateGame/Empty")).unwrap();

        let outcome = copy_template_files(target.path(), template, "Foo");

        assert!(outcome.success(), "{}", outcome);
        assert_eq!(outcome.processed, 3);
        assert_eq!(std::fs::read_to_string(target.path().join("Src/FooGame/FooGameClasses.uc")).unwrap(),
                   "class Foo extends Object;");
        assert_eq!(std::fs::read_to_string(target.path().join("UDKGame/Config/DefaultGame.ini")).unwrap(),
                   "[Engine.GameInfo]\r\nDefaultGame=Foo.FooInfo\r\n");
        // not a config or script file: copied as is
        assert_eq!(std::fs::read_to_string(target.path().join("UDKGame/Content/TEMPLATE_SHORT_NAME.txt")).unwrap(),
                   "TEMPLATE_SHORT_NAME");
        assert!(target.path().join("Src/FooGame/Empty").is_dir());
        assert!(!target.path().join("ConfigInfo.xml").exists());
        assert!(!target.path().join("Src/TemplateGame").exists());
    }

    #[test]
    fn copy_replaces_read_only_destination() {
        let target = tempfile::tempdir().unwrap();
        let template = Path::new("Templates/Base");
        write(&target.path().join(template).join("Binaries/readme.txt"), "new");
        let existing = target.path().join("Binaries/readme.txt");
        write(&existing, "old");
        let mut permissions = std::fs::metadata(&existing).unwrap().permissions();
        permissions.set_readonly(true);
        std::fs::set_permissions(&existing, permissions).unwrap();

        let outcome = copy_template_files(target.path(), template, "Foo");

        assert!(outcome.success(), "{}", outcome);
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "new");
    }

    #[test]
    fn missing_directories_fail_without_copying() {
        let target = tempfile::tempdir().unwrap();
        let outcome = copy_template_files(&target.path().join("missing"), Path::new("T"), "Foo");
        assert!(!outcome.success());

        let outcome = copy_template_files(target.path(), Path::new("NoTemplate"), "Foo");
        assert!(!outcome.success());
        assert_eq!(outcome.processed, 0);
        assert_eq!(std::fs::read_dir(target.path()).unwrap().count(), 0);
    }

    #[test]
    fn failing_file_does_not_stop_the_copy() {
        let target = tempfile::tempdir().unwrap();
        let template = Path::new("Templates/Base");
        write(&target.path().join(template).join("Binaries/a.txt"), "a");
        write(&target.path().join(template).join("Binaries/b.txt"), "b");
        // a directory where a.txt should be written
        std::fs::create_dir_all(target.path().join("Binaries/a.txt/content")).unwrap();

        let outcome = copy_template_files(target.path(), template, "Foo");

        assert!(!outcome.success());
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.failed_items.len(), 1);
        assert_eq!(outcome.failed_items[0].path, target.path().join(template).join("Binaries/a.txt"));
        assert_eq!(std::fs::read_to_string(target.path().join("Binaries/b.txt")).unwrap(), "b");
    }
}
