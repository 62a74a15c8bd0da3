
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::canon_path::CanonPath;
use crate::config_file::SaveOptions;
use crate::progname::PROGNAME;

pub const GAME_NAME_ENV_VAR: &str = "UNSETUP_GAME_NAME";
pub const PLATFORM_ENV_VAR: &str = "UNSETUP_PLATFORM";
pub const KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR: &str = "UNSETUP_KEEP_COMMENT_ONLY_SECTIONS";
pub const MANIFEST_ENV_VAR: &str = "UNSETUP_MANIFEST";

const DEFAULT_GAME_NAME: &str = "UDK";
const DEFAULT_PLATFORM: &str = "PC";
const DEFAULT_MANIFEST_FILE: &str = "Binaries/InstallData/Manifest.xml";
const DEFAULT_GAME_MANIFEST_FILE: &str = "Binaries/InstallData/GameManifest.xml";

#[skip_serializing_none]
#[derive(Deserialize, Serialize, Debug, Default, Clone, PartialEq)]
pub struct Config {
    /// Replaces `%GAMENAME%` in the manifest options.
    pub game_name: Option<String>,

    /// Replaces `%PLATFORM%` in the manifest options.
    pub platform: Option<String>,

    /// When rewriting INI files, sections that only hold comments are dropped
    /// unless this is set.
    pub keep_comment_only_sections: Option<bool>,

    /// Main manifest, relative to the install directory unless absolute.
    /// Supports expansion:
    /// - first environment variables are expanded (for example `$UDK_ROOT/Manifest.xml`)
    /// - then `~` is (if present) is expanded to the user home directory
    pub manifest_file: Option<String>,

    /// Game manifest, same rules as `manifest_file`.
    pub game_manifest_file: Option<String>,
}

impl Config {
    pub fn game_name(&self) -> &str {
        self.game_name.as_deref().unwrap_or(DEFAULT_GAME_NAME)
    }

    pub fn platform(&self) -> &str {
        self.platform.as_deref().unwrap_or(DEFAULT_PLATFORM)
    }

    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            keep_comment_only_sections: self.keep_comment_only_sections.unwrap_or(false),
        }
    }

    pub fn manifest_path(&self, install_dir: &Path) -> Result<PathBuf> {
        expand_path(self.manifest_file.as_deref().unwrap_or(DEFAULT_MANIFEST_FILE), install_dir)
    }

    pub fn game_manifest_path(&self, install_dir: &Path) -> Result<PathBuf> {
        expand_path(self.game_manifest_file.as_deref().unwrap_or(DEFAULT_GAME_MANIFEST_FILE), install_dir)
    }
}

fn expand_path(path: &str, install_dir: &Path) -> Result<PathBuf> {
    let expanded = match shellexpand::full(path) {
        Err(error) => bail!("Path expansion failed for {}\n  {error}", path),
        Ok(expanded) => expanded,
    };
    Ok(install_dir.join(&*expanded))
}

pub fn global_conf_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", PROGNAME)
        .map(|proj_dir| proj_dir.config_dir().to_path_buf())
}

#[derive(Debug, Default, Clone)]
pub struct Settings {
    pub global: Option<ConfigSource>,
    pub local: Option<ConfigSource>,
    pub env_config: ConfigSource,
    pub combined: Config,
}

#[derive(Debug, Default, Clone)]
pub struct ConfigSource {
    pub id: String,
    pub config: Option<Config>,
}

impl ConfigSource {
    fn into_config(self) -> Option<Config> {
        self.config
    }
}

impl Settings {
    pub fn read_settings(work_dir: &CanonPath) -> Result<Settings> {
        let global = match global_conf_dir() {
            Some(path_buf) => match Self::read_config_in_dir(&path_buf) {
                Ok(source) => source,
                Err(error) => bail!("Error reading app global config\n  {error}"),
            },
            None => None,
        };
        let local = match Self::read_config_in_dir(work_dir.path()) {
            Ok(source) => source,
            Err(error) => bail!("Error reading app local config\n  {error}"),
        };
        let env_config = Self::read_env_config()?;

        Ok(Settings {
            global: global.clone(),
            local: local.clone(),
            env_config: env_config.clone(),
            combined: combine(
                global.and_then(ConfigSource::into_config),
                local.and_then(ConfigSource::into_config),
                env_config.into_config(),
            ),
        })
    }

    pub fn find_config_in_dir(dir: &Path) -> Result<Option<PathBuf>> {
        let yml_name = format!("{prog_name}.yml", prog_name = PROGNAME);
        let yaml_name = format!("{prog_name}.yaml", prog_name = PROGNAME);
        let yml_path = dir.join(&yml_name);
        let yaml_path = dir.join(&yaml_name);
        match (yml_path.exists(), yaml_path.exists()) {
            (false, false) => Ok(None),
            (true, false) => Ok(Some(yml_path)),
            (false, true) => Ok(Some(yaml_path)),
            (true, true) =>
                bail!("Both {yml_name} and {yaml_name} files are present in {dir:?} and I can't choose.\nPlease delete one of those.")
        }
    }

    pub fn read_config_in_dir(dir: &Path) -> Result<Option<ConfigSource>> {
        let path = match Settings::find_config_in_dir(dir)? {
            None => return Ok(None),
            Some(path) => path,
        };
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(error) => bail!("Could not open config file at {:?}\n  {error}", path),
        };
        let path_as_str = path.as_os_str().to_string_lossy().to_string();
        debug!("found config file at {path_as_str}");

        let deserializer = serde_yaml::Deserializer::from_reader(BufReader::new(file));
        let config: Option<Config> = match serde_path_to_error::deserialize(deserializer) {
            Ok(config) => config,
            Err(error) => bail!("Could not read config file at {path_as_str}\n -> {}\npath: {}", error, error.path()),
        };
        debug!("Config read at {path_as_str}: {config:?}");
        Ok(Some(ConfigSource {
            id: path_as_str,
            config,
        }))
    }

    fn read_env_config() -> Result<ConfigSource> {
        let keep_comment_only_sections = match std::env::var(KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR) {
            Err(_) => None,
            Ok(s) if s == "true" => Some(true),
            Ok(s) if s == "false" => Some(false),
            _ => bail!("Incorrect value for {KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR} env var")
        };
        Ok(ConfigSource {
            id: "environment".to_string(),
            config: Some(Config {
                game_name: std::env::var(GAME_NAME_ENV_VAR).ok(),
                platform: std::env::var(PLATFORM_ENV_VAR).ok(),
                keep_comment_only_sections,
                manifest_file: std::env::var(MANIFEST_ENV_VAR).ok(),
                // no env var for this one
                game_manifest_file: None,
            }),
        })
    }
}

fn combine(global: Option<Config>, local: Option<Config>, env_config: Option<Config>) -> Config {
    let global = global.unwrap_or_default();
    let local = local.unwrap_or_default();
    let env_config = env_config.unwrap_or_default();
    Config {
        game_name: env_config.game_name.or(local.game_name).or(global.game_name),
        platform: env_config.platform.or(local.platform).or(global.platform),
        keep_comment_only_sections: env_config.keep_comment_only_sections
            .or(local.keep_comment_only_sections)
            .or(global.keep_comment_only_sections),
        manifest_file: env_config.manifest_file.or(local.manifest_file).or(global.manifest_file),
        game_manifest_file: env_config.game_manifest_file.or(local.game_manifest_file).or(global.game_manifest_file),
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use indoc::indoc;

    use super::{combine, Config, Settings, KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR, PLATFORM_ENV_VAR};

    #[test]
    fn read_local_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("unsetup.yml"), indoc! {"
            game_name: MyGame
            keep_comment_only_sections: true
        "}).unwrap();

        let source = Settings::read_config_in_dir(dir.path()).unwrap().unwrap();
        assert_eq!(source.config, Some(Config {
            game_name: Some("MyGame".to_string()),
            keep_comment_only_sections: Some(true),
            ..Default::default()
        }));
    }

    #[test]
    fn no_config_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::read_config_in_dir(dir.path()).unwrap().is_none());
    }

    #[test]
    fn both_yml_and_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("unsetup.yml"), "platform: PC\n").unwrap();
        std::fs::write(dir.path().join("unsetup.yaml"), "platform: PC\n").unwrap();
        assert!(Settings::read_config_in_dir(dir.path()).is_err());
    }

    #[test]
    fn malformed_config_reports_the_field() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("unsetup.yaml"), "keep_comment_only_sections: maybe\n").unwrap();
        let error = Settings::read_config_in_dir(dir.path()).unwrap_err();
        assert!(error.to_string().contains("keep_comment_only_sections"), "{}", error);
    }

    #[test]
    fn environment_wins_over_local_over_global() {
        let global = Config {
            game_name: Some("GlobalGame".to_string()),
            platform: Some("Global".to_string()),
            manifest_file: Some("global.xml".to_string()),
            ..Default::default()
        };
        let local = Config {
            game_name: Some("LocalGame".to_string()),
            platform: Some("Local".to_string()),
            ..Default::default()
        };
        let env = Config { platform: Some("Env".to_string()), ..Default::default() };

        let combined = combine(Some(global), Some(local), Some(env));

        assert_eq!(combined.game_name(), "LocalGame");
        assert_eq!(combined.platform(), "Env");
        assert_eq!(combined.manifest_file.as_deref(), Some("global.xml"));
        assert!(!combined.save_options().keep_comment_only_sections);
    }

    #[test]
    fn defaults() {
        let config = combine(None, None, None);
        assert_eq!(config.game_name(), "UDK");
        assert_eq!(config.platform(), "PC");
        assert_eq!(config.manifest_path(Path::new("/udk")).unwrap(),
                   PathBuf::from("/udk/Binaries/InstallData/Manifest.xml"));
        assert_eq!(config.game_manifest_path(Path::new("/udk")).unwrap(),
                   PathBuf::from("/udk/Binaries/InstallData/GameManifest.xml"));
    }

    #[test]
    fn manifest_path_expansion() {
        temp_env::with_var("UNSETUP_TEST_ROOT", Some("/data/udk"), || {
            let config = Config { manifest_file: Some("$UNSETUP_TEST_ROOT/Manifest.xml".to_string()), ..Default::default() };
            assert_eq!(config.manifest_path(Path::new("/elsewhere")).unwrap(),
                       PathBuf::from("/data/udk/Manifest.xml"));
        });
    }

    #[test]
    fn read_environment() {
        temp_env::with_vars([
            (PLATFORM_ENV_VAR, Some("PS3")),
            (KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR, Some("true")),
        ], || {
            let source = Settings::read_env_config().unwrap();
            let config = source.config.unwrap();
            assert_eq!(config.platform(), "PS3");
            assert!(config.save_options().keep_comment_only_sections);
        });
        temp_env::with_var(KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR, Some("yes"), || {
            assert!(Settings::read_env_config().is_err());
        });
    }
}
