pub mod config;
pub mod launcher;
pub mod plugin;

mod error;

#[cfg(test)]
mod tests;

pub use error::{Error, Result};
pub use launcher::{Launcher, LauncherState};

pub use flint_types::*;
