
use anyhow::Result;
use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use unsetup::args::Extract;
use unsetup::manifest::read_manifest;
use unsetup::package::{extract_tree, Package};

use crate::subcommands::report::report;

pub fn extract(params: &Extract) -> Result<()> {
    let mut package = Package::open(&params.package)?;
    info!("{} file(s), {} uncompressed", package.list_files().len(),
          ByteSize::b(package.total_uncompressed_size()?));

    let outcome = match &params.manifest {
        None => package.extract_all(&params.dest),
        Some(manifest) => {
            let tree = read_manifest(manifest)?;
            let progress_bar = ProgressBar::new(tree.file_count() as u64);
            progress_bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")?);
            let outcome = extract_tree(&mut package, &tree, &params.dest, |name| {
                progress_bar.set_message(name.to_string());
                progress_bar.inc(1);
            });
            progress_bar.finish_and_clear();
            outcome
        }
    };
    package.close();
    report("extraction", &outcome)
}
