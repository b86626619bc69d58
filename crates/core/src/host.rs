// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host identification.
//!
//! System identity is mandatory metadata for a baseline: unlike the commit
//! hash there is no fallback, and a failed query aborts the append.

use sysinfo::System;
use thiserror::Error;
use tracing::debug;

const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Errors raised while identifying the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// No CPU brand string could be read
    #[error("host query failed: CPU model unavailable")]
    CpuUnavailable,

    /// Total memory reported as zero
    #[error("host query failed: total memory unavailable")]
    MemoryUnavailable,

    /// OS release could not be determined
    #[error("host query failed: OS release unavailable")]
    OsUnavailable,
}

/// Result type for host queries.
pub type Result<T> = std::result::Result<T, HostError>;

/// Identity of the machine a baseline was recorded on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    /// CPU model, e.g. `Intel(R) Core(TM) i7-9700K CPU @ 3.60GHz`.
    pub cpu_model: String,
    /// Whole gibibytes of RAM, e.g. `32GB`.
    pub ram: String,
    /// OS family and release, e.g. `Linux 6.8.0`.
    pub os: String,
}

/// Source of host identity.
#[cfg_attr(test, mockall::automock)]
pub trait SystemInfoProvider {
    /// Query the host.
    fn system_info(&self) -> Result<SystemInfo>;
}

/// Format a byte count as whole gibibytes (`<n>GB`), rounding down.
pub fn format_ram(total_bytes: u64) -> String {
    format!("{}GB", total_bytes / BYTES_PER_GIB)
}

/// [`SystemInfoProvider`] backed by the `sysinfo` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SysinfoProvider;

impl SysinfoProvider {
    /// Create a new provider.
    pub fn new() -> Self {
        Self
    }
}

impl SystemInfoProvider for SysinfoProvider {
    fn system_info(&self) -> Result<SystemInfo> {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        let cpu_model = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .ok_or(HostError::CpuUnavailable)?;

        let total = system.total_memory();
        if total == 0 {
            return Err(HostError::MemoryUnavailable);
        }

        let os = format!("{} {}", os_family(), os_release()?);
        debug!(cpu = %cpu_model, total_bytes = total, os = %os, "Host identified");

        Ok(SystemInfo {
            cpu_model,
            ram: format_ram(total),
            os,
        })
    }
}

fn os_family() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

#[cfg(windows)]
fn os_release() -> Result<String> {
    // Product version (`10`, `11`), not the kernel build number.
    System::os_version().ok_or(HostError::OsUnavailable)
}

#[cfg(not(windows))]
fn os_release() -> Result<String> {
    System::kernel_version().ok_or(HostError::OsUnavailable)
}
