//! Command line generator of the quality dashboard.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
