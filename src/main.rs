
mod log_settings;
mod subcommands;

use anyhow::Result;
use clap::Parser;
use env_logger::{Env, Target};

use log_settings::LogSettings;
use unsetup::args::{Cli, Commands};
use unsetup::canon_path::CanonPath;
use unsetup::settings::{global_conf_dir, Settings};
use subcommands::backup::backup;
use subcommands::config::process_config;
use subcommands::extract::extract;
use subcommands::introspect::introspect;
use subcommands::manifest::{create_manifest, filter, game_manifest};
use subcommands::template::{copy_template, validate_name};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
                            .target(Target::Stdout)
                            .init();

    let log_settings = LogSettings {
        max_level: log::max_level(),
        log_var_name: "RUST_LOG".to_string(),
        log_var_value: std::env::var("RUST_LOG").unwrap_or("<not present>".to_string()),
        log_style_name: "RUST_LOG_STYLE".to_string(),
        log_style_value: std::env::var("RUST_LOG_STYLE").unwrap_or("<not present>".to_string()),
    };

    let cli = Cli::parse();

    let current_dir = std::env::current_dir()?;
    let current_dir = CanonPath::new(current_dir)?;

    let settings = Settings::read_settings(&current_dir)?;
    let config = &settings.combined;

    match cli.command {
        Commands::CreateManifest(ref params) => create_manifest(params, config),
        Commands::GameManifest(ref params) => game_manifest(params, config),
        Commands::Filter(ref params) => filter(params),
        Commands::ProcessConfig(ref params) => process_config(params, config),
        Commands::CopyTemplate(ref params) => copy_template(params, config),
        Commands::ValidateName(ref params) => validate_name(params, config, &current_dir),
        Commands::Extract(ref params) => extract(params),
        Commands::Backup(ref params) => backup(params),
        Commands::Introspect => introspect(&settings, &current_dir, &global_conf_dir(), &log_settings),
    }
}
