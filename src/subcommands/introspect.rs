use std::path::PathBuf;

use anyhow::Result;
use handlebars::Handlebars;
use serde_json::json;

use unsetup::canon_path::CanonPath;
use unsetup::settings::{ConfigSource, Settings, GAME_NAME_ENV_VAR, KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR,
                        MANIFEST_ENV_VAR, PLATFORM_ENV_VAR};

use crate::log_settings::LogSettings;


static TEMPLATE : &str =
r#"
Global config directory: {{global_config_dir}}
Found global config file: {{global_config_file}}

Current dir: {{current_dir}}
Found local config file: {{local_config_file}}

Config options from environment variables:
{{environment}}

Concrete config:
{{concrete_config}}
Game name: {{game_name}}
Platform: {{platform}}
Manifest: {{manifest}}

Log settings:
max level: {{max_level}}
{{log_var_name}}="{{log_var_value}}"
{{log_style_name}}="{{log_style_value}}"
"#;

pub fn introspect(settings: &Settings, current_dir: &CanonPath,
                  global_conf_dir: &Option<PathBuf>, log_settings: &LogSettings) -> Result<()> {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);

    let config = &settings.combined;
    let context = &json!({
        "current_dir": current_dir.to_path_buf().as_os_str().to_string_lossy(),
        "global_config_dir": match global_conf_dir {
            None => "undetermined".to_string(),
            Some(value) => value.as_os_str().to_string_lossy().to_string(),
        },
        "global_config_file": match &settings.global {
            None => "no".to_string(),
            Some(file_name) => file_name.id.clone(),
        },
        "local_config_file": match &settings.local {
            None => "no".to_string(),
            Some(file_name) => file_name.id.clone(),
        },
        "environment": display_environment(&settings.env_config)
            .iter()
            .map(|(key, value)| format!(r#"{key} = "{value}""#))
            .collect::<Vec<_>>()
            .join("\n"),
        "concrete_config": match serde_yaml::to_string(config) {
            Ok(value) => value,
            Err(error) => format!("[error, could not serialize configuration:\n{error}]")
        },
        "game_name": config.game_name(),
        "platform": config.platform(),
        "manifest": match config.manifest_path(current_dir.path()) {
            Ok(path) => path.as_os_str().to_string_lossy().to_string(),
            Err(error) => format!("[error: {error}]"),
        },
        "max_level": log_settings.max_level.to_string(),
        "log_var_name": log_settings.log_var_name,
        "log_var_value": log_settings.log_var_value,
        "log_style_name": log_settings.log_style_name,
        "log_style_value": log_settings.log_style_value,
    });
    println!("{}", registry.render_template(TEMPLATE, context)?);
    Ok(())
}

const TRUE: &str = "true";
const FALSE: &str = "false";

fn display_environment(env_config: &ConfigSource) -> Vec<(String, String)> {
    let config = env_config.config.as_ref();
    vec![
        (GAME_NAME_ENV_VAR, config.and_then(|value| value.game_name.to_owned())),
        (PLATFORM_ENV_VAR, config.and_then(|value| value.platform.to_owned())),
        (MANIFEST_ENV_VAR, config.and_then(|value| value.manifest_file.to_owned())),
        (KEEP_COMMENT_ONLY_SECTIONS_ENV_VAR, config
            .and_then(|value|
                value.keep_comment_only_sections.map(|value|
                    (if value { TRUE } else { FALSE }).to_owned()
                )
            )
        ),
    ].into_iter()
    .filter_map(|(key, value)|
        match value {
            None => None,
            Some(s) if s.trim().is_empty() => None,
            Some(value) => Some((key.to_owned(), value))
        }
    ).collect()
}
