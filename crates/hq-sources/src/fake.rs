//! In-memory [`UrlRead`] and [`CommandRun`] implementations for tests and
//! offline runs.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use crate::error::{Result, SourceError};
use crate::git::CommandRun;
use crate::opener::UrlRead;

/// Serves canned bodies by url; unknown urls answer with HTTP 404.
#[derive(Debug, Default)]
pub struct FakeOpener {
    responses: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the body served for `url`.
    #[must_use]
    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }

    /// Urls requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl UrlRead for FakeOpener {
    fn url_read(&self, url: &str) -> Result<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Status {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Answers `git` commands with canned output.
///
/// A command gets the output registered for the longest prefix of its
/// arguments joined by spaces. Other commands fail.
#[derive(Debug, Default)]
pub struct FakeCommands {
    outputs: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl FakeCommands {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the output of commands starting with `command`.
    #[must_use]
    pub fn with(mut self, command: impl Into<String>, output: impl Into<String>) -> Self {
        self.outputs.insert(command.into(), output.into());
        self
    }

    /// Commands run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CommandRun for FakeCommands {
    fn run(&self, args: &[&str], _folder: &Path) -> Result<String> {
        let command = args.join(" ");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command.clone());
        self.outputs
            .iter()
            .filter(|(prefix, _)| command.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, output)| output.clone())
            .ok_or_else(|| SourceError::Command(format!("git {command}: unknown command")))
    }
}
