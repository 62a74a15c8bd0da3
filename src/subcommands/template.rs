
use anyhow::{bail, Result};
use log::{debug, info};
use nu_ansi_term::Color::{Green, Red};

use unsetup::args::{CopyTemplate, ValidateName};
use unsetup::canon_path::CanonPath;
use unsetup::project_name::{NameCheck, NameValidation};
use unsetup::settings::Config;
use unsetup::template::copy_template_files;

use crate::subcommands::report::report;

fn name_validation(manifest: &std::path::Path) -> Result<NameValidation> {
    if manifest.exists() {
        NameValidation::from_manifest(manifest)
    } else {
        debug!("no manifest at {:?}, only checking the name syntax", manifest);
        Ok(NameValidation::default())
    }
}

pub fn copy_template(params: &CopyTemplate, config: &Config) -> Result<()> {
    let validation = name_validation(&config.manifest_path(&params.target)?)?;
    match validation.check(&params.name) {
        NameCheck::Valid => {}
        problem => bail!("Can't use {:?} as project name: {}", params.name, problem),
    }
    let outcome = copy_template_files(&params.target, &params.template, &params.name);
    report("template copy", &outcome)
}

pub fn validate_name(params: &ValidateName, config: &Config, current_dir: &CanonPath) -> Result<()> {
    let manifest = match &params.manifest {
        Some(manifest) => manifest.clone(),
        None => config.manifest_path(current_dir.path())?,
    };
    let validation = name_validation(&manifest)?;
    match validation.check(&params.name) {
        NameCheck::Valid => {
            info!("{}", Green.bold().paint(format!("{} is a valid project name", params.name)));
            Ok(())
        }
        problem => {
            info!("{}", Red.bold().paint(format!("{} can't be used: {}", params.name, problem)));
            bail!("Invalid project name {:?}", params.name)
        }
    }
}
