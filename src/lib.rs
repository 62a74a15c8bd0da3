
pub mod args;
pub mod backup;
pub mod batch;
pub mod canon_path;
pub mod config_file;
pub mod config_options;
pub mod file_spec;
pub mod file_tree;
pub mod lowercase;
pub mod manifest;
pub mod manifest_options;
pub mod package;
pub mod process_config;
pub mod progname;
pub mod project_name;
pub mod settings;
pub mod template;
pub mod utils;
