// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Source-control revision lookup.

use crate::record::COMMIT_SENTINEL;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, warn};

/// Source of the current revision identifier.
///
/// Resolution never fails: implementations return [`COMMIT_SENTINEL`] when
/// the revision cannot be determined.
#[cfg_attr(test, mockall::automock)]
pub trait CommitResolver {
    /// Current revision, or the sentinel.
    fn resolve(&self) -> String;
}

/// Resolves `HEAD` with `git rev-parse`.
#[derive(Debug, Default, Clone)]
pub struct GitCommitResolver {
    repo_dir: Option<PathBuf>,
}

impl GitCommitResolver {
    /// Resolve in the current working directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve in `dir` instead of the current working directory.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: Some(dir.into()),
        }
    }

    fn rev_parse_head(&self) -> Option<String> {
        let mut cmd = Command::new("git");
        cmd.args(["rev-parse", "HEAD"]);
        if let Some(dir) = &self.repo_dir {
            cmd.current_dir(dir);
        }

        let output = match cmd.output() {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "Failed to run git; recording commit as {}", COMMIT_SENTINEL);
                return None;
            }
        };
        if !output.status.success() {
            warn!(
                status = %output.status,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git rev-parse failed; recording commit as {}",
                COMMIT_SENTINEL
            );
            return None;
        }

        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!hash.is_empty()).then_some(hash)
    }
}

impl CommitResolver for GitCommitResolver {
    fn resolve(&self) -> String {
        match self.rev_parse_head() {
            Some(hash) => {
                debug!(commit = %hash, "Resolved commit");
                hash
            }
            None => COMMIT_SENTINEL.to_string(),
        }
    }
}

/// Always returns the same revision.
#[derive(Debug, Clone)]
pub struct FixedCommit(pub String);

impl CommitResolver for FixedCommit {
    fn resolve(&self) -> String {
        self.0.clone()
    }
}
