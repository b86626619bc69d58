// Copyright 2025 Perfledger Contributors
// SPDX-License-Identifier: Apache-2.0

//! Date source for new baselines.

use chrono::{Local, NaiveDate};

/// Supplies the calendar date stamped on a new record.
pub trait DateSource {
    /// Today's date.
    fn today(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl DateSource for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedDate(pub NaiveDate);

impl DateSource for FixedDate {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
