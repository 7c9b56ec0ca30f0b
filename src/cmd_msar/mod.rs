//! Subcommand modules for the `msar` binary.

pub mod maf2fas;
pub mod refine;
