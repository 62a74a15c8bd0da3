
use anyhow::Result;
use bytesize::ByteSize;

use unsetup::args::{CreateManifest, Filter, GameManifest};
use unsetup::file_spec::{filter_out_file_specs, FileSpec};
use unsetup::manifest::{read_manifest, write_manifest};
use unsetup::manifest_options::{self, ManifestOptions};
use unsetup::settings::Config;

use crate::subcommands::report::report_success;

fn read_options(path: &std::path::Path, config: &Config) -> Result<ManifestOptions> {
    let mut options = ManifestOptions::read(path)?;
    options.fixup_wildcards(config.game_name(), config.platform());
    Ok(options)
}

pub fn create_manifest(params: &CreateManifest, config: &Config) -> Result<()> {
    let options = read_options(&params.options, config)?;
    let summary = manifest_options::create_manifest(&params.root, &options)?;
    let output = match &params.output {
        Some(output) => output.clone(),
        None => config.manifest_path(&params.root)?,
    };
    write_manifest(&output, &summary.tree)?;
    report_success(&format!("{} manifest saved to {:?}: {} folders, {} files ({}), {} filtered out",
        options.root_name, output, summary.tree.folder_count(), summary.tree.file_count(),
        ByteSize::b(summary.tree.folder_size()), summary.filtered));
    Ok(())
}

pub fn game_manifest(params: &GameManifest, config: &Config) -> Result<()> {
    let options = read_options(&params.options, config)?;
    let base_path = match &params.base {
        Some(base) => base.clone(),
        None => config.manifest_path(&params.root)?,
    };
    let base = read_manifest(&base_path)?;
    let summary = manifest_options::game_create_manifest(&params.root, base, &options)?;
    let output = match &params.output {
        Some(output) => output.clone(),
        None => config.game_manifest_path(&params.root)?,
    };
    write_manifest(&output, &summary.tree)?;
    report_success(&format!("game manifest saved to {:?}: {} folders, {} files ({})",
        output, summary.tree.folder_count(), summary.tree.file_count(), ByteSize::b(summary.tree.folder_size())));
    Ok(())
}

pub fn filter(params: &Filter) -> Result<()> {
    let specs = FileSpec::parse_all(&params.spec)?;
    let mut tree = read_manifest(&params.manifest)?;
    let marked = filter_out_file_specs(&mut tree, &specs);
    if params.clean {
        tree.clean();
    }
    let output = params.output.as_ref().unwrap_or(&params.manifest);
    write_manifest(output, &tree)?;
    report_success(&format!("{} entries excluded, {} files left ({}) in {:?}",
        marked, tree.file_count(), ByteSize::b(tree.folder_size()), output));
    Ok(())
}
