//! CLI command implementations.

pub mod build;
pub mod dev;
pub mod init;
pub mod publications;
pub mod verify;

pub use build::build_site;
pub use dev::dev_server;
pub use init::init_project;
pub use publications::{list_publications, PublicationsOptions};
pub use verify::verify_site;
