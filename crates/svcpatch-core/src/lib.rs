pub mod document;
mod emit;
pub mod error;
pub mod file_patch;
pub mod paths;
pub mod redeploy;
pub mod remote;
pub mod run;
pub mod runner;
pub mod settings;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PatchError, Result};
