
use anyhow::{bail, Result};

use unsetup::args::ProcessConfig;
use unsetup::config_file::SaveOptions;
use unsetup::config_options::ConfigOptions;
use unsetup::process_config::process_game_config_files;
use unsetup::project_name::{NameCheck, NameValidation};
use unsetup::settings::Config;

use crate::subcommands::report::report;

pub fn process_config(params: &ProcessConfig, config: &Config) -> Result<()> {
    match NameValidation::default().check(&params.game_name) {
        NameCheck::Valid => {}
        problem => bail!("Invalid game name {:?}: {}", params.game_name, problem),
    }
    let options = ConfigOptions::read(&params.template_config)?;
    let dest = params.dest.as_ref().unwrap_or(&params.source);
    let save_options = SaveOptions {
        keep_comment_only_sections: params.keep_comment_only_sections
            || config.save_options().keep_comment_only_sections,
    };
    let outcome = process_game_config_files(&options, &params.source, dest, &params.game_name, &save_options)?;
    report("config processing", &outcome)
}
