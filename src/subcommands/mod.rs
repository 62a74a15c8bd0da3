
pub mod backup;
pub mod config;
pub mod extract;
pub mod introspect;
pub mod manifest;
pub mod report;
pub mod template;
