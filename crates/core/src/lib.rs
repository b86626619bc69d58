// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for the perfledger baseline pipeline.
//!
//! This crate holds the record schema shared by every pipeline stage and the
//! narrow provider interfaces through which the pipeline reaches the outside
//! world:
//!
//! - [`metric`] - the fixed metric set and per-metric values
//! - [`record`] - the baseline record and its ledger row layout
//! - [`host`] - host identification ([`SystemInfoProvider`])
//! - [`vcs`] - revision lookup ([`CommitResolver`])
//! - [`clock`] - date stamping ([`DateSource`])
//! - [`config`] - layered pipeline configuration

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod host;
pub mod metric;
pub mod record;
pub mod vcs;

pub use clock::{DateSource, FixedDate, SystemClock};
pub use config::{ConfigError, PipelineConfig};
pub use host::{HostError, SysinfoProvider, SystemInfo, SystemInfoProvider};
pub use metric::{Metric, MetricReadings, MetricValue, NOT_AVAILABLE};
pub use record::{BaselineRecord, RecordError, COMMIT_SENTINEL};
pub use vcs::{CommitResolver, FixedCommit, GitCommitResolver};

/// The providers consulted when stamping a new record.
#[derive(Clone, Copy)]
pub struct RunEnvironment<'a> {
    /// Host identity.
    pub system: &'a dyn SystemInfoProvider,
    /// Current revision.
    pub commit: &'a dyn CommitResolver,
    /// Record date.
    pub clock: &'a dyn DateSource,
}

impl<'a> RunEnvironment<'a> {
    /// Bundle the three providers.
    pub fn new(
        system: &'a dyn SystemInfoProvider,
        commit: &'a dyn CommitResolver,
        clock: &'a dyn DateSource,
    ) -> Self {
        Self {
            system,
            commit,
            clock,
        }
    }

    /// Build a record from `metrics` and the current environment.
    ///
    /// # Errors
    ///
    /// Fails only if the host cannot be identified; an unresolvable commit
    /// degrades to [`COMMIT_SENTINEL`].
    pub fn stamp(
        &self,
        metrics: MetricReadings,
        build_config: &str,
    ) -> Result<BaselineRecord, HostError> {
        let system = self.system.system_info()?;
        let commit = self.commit.resolve();
        Ok(BaselineRecord::stamp(
            metrics,
            build_config,
            self.clock.today(),
            commit,
            system,
        ))
    }
}

impl std::fmt::Debug for RunEnvironment<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunEnvironment").finish_non_exhaustive()
    }
}
