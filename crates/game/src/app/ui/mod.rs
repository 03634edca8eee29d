//! The native UI layer: application state and the shell that drives it.

mod shell;
mod store;

pub(crate) use shell::{CampusShell, ShellSettings};
pub(crate) use store::WorldStore;
