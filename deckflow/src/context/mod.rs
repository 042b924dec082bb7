//! The shared context handed to every stage of a run.
//!
//! Stages receive the working directory, publish destination and template
//! variables explicitly instead of reading the process's current directory
//! or environment.

mod identity;
mod run;

pub use identity::RunIdentity;
pub use run::{RunContext, UnresolvedPlaceholder, DEST_VAR, WORKDIR_VAR};
