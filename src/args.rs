
use std::path::PathBuf;

use clap_derive::{Args, Parser, Subcommand};

use crate::progname::PROGNAME;

#[derive(Parser, Debug)]
#[command(name = PROGNAME)]
#[command(author, version)]
#[command(about = "Install manifest and project template tooling", long_about = None)]
pub struct Cli {

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan an install and write its manifest.
    CreateManifest(CreateManifest),
    /// Derive the game manifest from the main manifest.
    GameManifest(GameManifest),
    /// Mark manifest entries as excluded with file specs (and optionally prune them).
    Filter(Filter),
    /// Rewrite the INI files of a directory with the rules of a template.
    ProcessConfig(ProcessConfig),
    /// Copy a project template into an install, renamed after the project.
    CopyTemplate(CopyTemplate),
    /// Check that a project name is usable.
    ValidateName(ValidateName),
    /// Extract a package, or only the files of a manifest.
    Extract(Extract),
    /// Save a pristine copy of the install into its base template.
    Backup(Backup),
    /// Show configuration/settings information.
    Introspect,
}

#[derive(Args, Debug)]
pub struct CreateManifest {
    /// Root of the install to scan.
    #[arg(long, short)]
    pub root: PathBuf,

    /// Manifest options file (`UnSetup.Manifests.xml`).
    #[arg(long, short)]
    pub options: PathBuf,

    /// Where the manifest is written (default from settings, relative to the root).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct GameManifest {
    /// Root of the install.
    #[arg(long, short)]
    pub root: PathBuf,

    /// Manifest options file (`UnSetup.Manifests.xml`).
    #[arg(long, short)]
    pub options: PathBuf,

    /// Main manifest the game manifest is derived from (default from settings).
    #[arg(long, short)]
    pub base: Option<PathBuf>,

    /// Where the game manifest is written (default from settings).
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct Filter {
    /// Manifest to filter.
    #[arg(long, short)]
    pub manifest: PathBuf,

    /// File spec (`folder/sub/regex`), may be repeated.
    #[arg(long, short, required = true)]
    pub spec: Vec<String>,

    /// Prune the excluded entries instead of keeping them marked.
    #[arg(long, short)]
    pub clean: bool,

    /// Where the result is written (the manifest itself if not set).
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProcessConfig {
    /// Template rules (`ConfigInfo.xml`).
    #[arg(long, short)]
    pub template_config: PathBuf,

    /// Directory holding the INI files.
    #[arg(long, short)]
    pub source: PathBuf,

    /// Where the rewritten files go (in place if not set).
    #[arg(long, short)]
    pub dest: Option<PathBuf>,

    /// Project short name, replaces `$(GameName)`.
    #[arg(long, short)]
    pub game_name: String,

    /// Keep sections that only hold comments.
    #[arg(long)]
    pub keep_comment_only_sections: bool,
}

#[derive(Args, Debug)]
pub struct CopyTemplate {
    /// Install directory, the template must already be unpacked in it.
    #[arg(long, short)]
    pub target: PathBuf,

    /// Template folder, relative to the target.
    #[arg(long = "template", short = 'p')]
    pub template: PathBuf,

    /// Project short name.
    #[arg(long, short)]
    pub name: String,
}

#[derive(Args, Debug)]
pub struct ValidateName {
    /// Reference manifest (default from settings, relative to the current directory).
    #[arg(long, short)]
    pub manifest: Option<PathBuf>,

    /// Candidate project name.
    pub name: String,
}

#[derive(Args, Debug)]
pub struct Extract {
    /// The package (zip archive).
    #[arg(long, short)]
    pub package: PathBuf,

    /// Destination directory.
    #[arg(long, short)]
    pub dest: PathBuf,

    /// Only extract the files (not excluded) of this manifest.
    #[arg(long, short)]
    pub manifest: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct Backup {
    /// Install directory.
    #[arg(long, short)]
    pub install_dir: PathBuf,
}
