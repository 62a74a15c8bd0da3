
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use globwalk::GlobWalkerBuilder;
use log::{debug, info};
use walkdir::WalkDir;

use crate::batch::BatchOutcome;
use crate::canon_path::CanonPath;
use crate::config_file::{ConfigEntry, ConfigFile, SaveOptions};
use crate::config_options::ConfigOptions;

/// Rewrites every `*.ini` under `source_dir` with the template rules and saves
/// it at the same relative path under `dest_dir` (which may be `source_dir`).
///
/// A missing `source_dir` is a no-op. A file that can't be loaded or saved is
/// recorded in the outcome and the next file is processed.
pub fn process_game_config_files(options: &ConfigOptions, source_dir: &Path, dest_dir: &Path,
                                 game_name: &str, save_options: &SaveOptions) -> Result<BatchOutcome> {
    let mut outcome = BatchOutcome::new();
    if !source_dir.is_dir() {
        debug!("process_game_config_files: no source dir {:?}, nothing to do", source_dir);
        return Ok(outcome);
    }
    if CanonPath::new(source_dir)? != CanonPath::new(dest_dir)? {
        mirror_directories(source_dir, dest_dir, &mut outcome);
    }

    for ini_file in find_ini_files(source_dir, &mut outcome)? {
        let relative = match ini_file.strip_prefix(source_dir) {
            Ok(relative) => relative.to_path_buf(),
            Err(error) => {
                outcome.record_failure(&ini_file, error);
                continue;
            }
        };
        let dest_file = dest_dir.join(&relative);
        match process_config_file(options, &ini_file, &dest_file, game_name, save_options) {
            Ok(()) => {
                debug!("config {:?} written to {:?}", relative, dest_file);
                outcome.record_success();
            }
            Err(error) => outcome.record_failure(&ini_file, error),
        }
    }
    info!("processed config files from {:?} into {:?}: {}", source_dir, dest_dir, outcome);
    Ok(outcome)
}

fn mirror_directories(source_dir: &Path, dest_dir: &Path, outcome: &mut BatchOutcome) {
    for entry in WalkDir::new(source_dir).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.to_path_buf());
                outcome.record_failure(&path, error);
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(source_dir) {
            let target = dest_dir.join(relative);
            if let Err(error) = std::fs::create_dir_all(&target) {
                outcome.record_failure(&target, error);
            }
        }
    }
}

/// Directories the walk can't read are recorded as failures.
fn find_ini_files(source_dir: &Path, outcome: &mut BatchOutcome) -> Result<Vec<PathBuf>> {
    let walker = GlobWalkerBuilder::from_patterns(source_dir, &["**/*.ini"])
        .case_insensitive(true)
        .file_type(globwalk::FileType::FILE)
        .sort_by(|left, right| left.file_name().cmp(right.file_name()));
    let walker = match walker.build() {
        Ok(walker) => walker,
        Err(error) => bail!("Could not look for config files in {:?}\n -> {:?}", source_dir, error),
    };
    let mut ini_files = vec![];
    for entry in walker {
        match entry {
            Ok(entry) => ini_files.push(entry.into_path()),
            Err(error) => {
                let path = error.path().map(Path::to_path_buf).unwrap_or_else(|| source_dir.to_path_buf());
                outcome.record_failure(&path, error);
            }
        }
    }
    Ok(ini_files)
}

fn process_config_file(options: &ConfigOptions, source: &Path, dest: &Path,
                       game_name: &str, save_options: &SaveOptions) -> Result<()> {
    let mut config = ConfigFile::load(source)?;
    transform_config(&mut config, options, game_name);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    config.save(dest, save_options)
}

/// Applies the exclusion and addition rules to one parsed file.
pub fn transform_config(config: &mut ConfigFile, options: &ConfigOptions, game_name: &str) {
    let sections_to_remove = config.sections().iter()
        .filter(|section| options.section_excluded(&section.name))
        .map(|section| section.name.clone())
        .collect::<Vec<_>>();

    for section in config.sections_mut() {
        if sections_to_remove.contains(&section.name) {
            continue;
        }
        // removal by index, walk backwards
        for index in (0..section.lines.len()).rev() {
            let remove = match section.lines[index].entry() {
                None => false,
                Some(entry) => options.key_excluded(&entry.key) || options.value_excluded(&entry.value),
            };
            if remove {
                debug!("[{}] remove {:?}", section.name, section.lines[index].as_string());
                section.lines.remove(index);
            }
        }
    }

    for name in &sections_to_remove {
        debug!("remove section [{}]", name);
        config.remove_section(name);
    }

    for add in &options.key_values_to_add {
        let section = match config.section_mut(&add.section_name) {
            Some(section) => section,
            None => {
                debug!("no section [{}], {} not added", add.section_name, add.key_name);
                continue;
            }
        };
        let value = add.resolve_value(game_name);
        if add.is_array_directive() {
            section.insert_front(ConfigEntry::new(&add.key_name, &value));
            continue;
        }
        match section.find_entry_mut(&add.key_name) {
            Some(entry) => entry.value = value,
            None => section.insert_front(ConfigEntry::new(&add.key_name, &value)),
        }
    }
}
