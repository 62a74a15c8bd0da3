
use anyhow::Result;
use log::info;

use unsetup::args::Backup;
use unsetup::backup::copy_backup_files;

use crate::subcommands::report::report;

pub fn backup(params: &Backup) -> Result<()> {
    let outcome = copy_backup_files(&params.install_dir, |dir, index, count| {
        info!("[{}/{}] backing up {:?}", index + 1, count, dir);
    });
    report("backup", &outcome)
}
