//! Append-only baseline ledger.
//!
//! The ledger is a CSV file with a fixed header (see
//! [`perfledger_core::record::ledger_header`]) followed by one row per run.
//! Rows are only ever appended; the header is written exactly once, when the
//! file is first created.
//!
//! There is no locking. Concurrent writers against the same file are not
//! supported and must be serialized by the caller.

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use perfledger_core::record::{ledger_header, COLUMN_COUNT};
use perfledger_core::{BaselineRecord, HostError, MetricReadings, RecordError, RunEnvironment};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by ledger operations. All are fatal to the current invocation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file could not be opened or created
    #[error("failed to open ledger {}", .path.display())]
    Open {
        /// Ledger path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Writing the new row failed
    #[error("failed to write ledger {}", .path.display())]
    Write {
        /// Ledger path
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// CSV decoding failed
    #[error("failed to read ledger {}", .path.display())]
    Read {
        /// Ledger path
        path: PathBuf,
        /// Underlying CSV error
        source: csv::Error,
    },

    /// CSV encoding failed
    #[error("failed to encode ledger row for {}", .path.display())]
    Encode {
        /// Ledger path
        path: PathBuf,
        /// Underlying CSV error
        source: csv::Error,
    },

    /// The header row is not the fixed ledger header
    #[error("unexpected ledger header in {}: {found}", .path.display())]
    SchemaMismatch {
        /// Ledger path
        path: PathBuf,
        /// Header as found, comma-joined
        found: String,
    },

    /// A data row does not fit the schema
    #[error("malformed ledger row in {} at line {line}", .path.display())]
    MalformedRow {
        /// Ledger path
        path: PathBuf,
        /// 1-based line number
        line: u64,
        /// Row conversion error
        source: RecordError,
    },

    /// Host identification failed while stamping the record
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Handle to a ledger file.
#[derive(Debug, Clone)]
pub struct BaselineLedger {
    path: PathBuf,
}

impl BaselineLedger {
    /// Ledger backed by `path`. The file is not touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stamp `metrics` with the run environment and append the resulting record.
    ///
    /// Returns the record as written.
    pub fn append(
        &self,
        metrics: MetricReadings,
        build_config: &str,
        env: &RunEnvironment<'_>,
    ) -> Result<BaselineRecord> {
        let record = env.stamp(metrics, build_config)?;
        self.append_record(&record)?;
        Ok(record)
    }

    /// Append an already stamped record.
    ///
    /// A missing or zero-length file gets the header first. An existing file
    /// whose last line is unterminated gets a line break before the row. The
    /// header (if any) and the row go out in a single write, so a row is never
    /// split.
    pub fn append_record(&self, record: &BaselineRecord) -> Result<()> {
        let needs_header = self.is_empty()?;
        let mut buf = Vec::new();
        if !needs_header {
            self.verify_header()?;
            if !self.ends_with_newline()? {
                debug!(ledger = %self.path.display(), "Terminating unterminated last line");
                buf.push(b'\n');
            }
        }
        buf.extend(self.encode(record, needs_header)?);

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| self.open_error(source))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.open_error(source))?;
        file.write_all(&buf)
            .and_then(|()| file.sync_data())
            .map_err(|source| LedgerError::Write {
                path: self.path.clone(),
                source,
            })?;

        info!(
            ledger = %self.path.display(),
            date = %record.date,
            commit = %record.commit_hash,
            build_config = %record.build_config,
            header_written = needs_header,
            "Appended baseline"
        );
        Ok(())
    }

    /// Read every record in file order.
    ///
    /// A zero-length file is an empty ledger. A missing file, a foreign
    /// header, or any row with the wrong column count is an error.
    pub fn load_all(&self) -> Result<Vec<BaselineRecord>> {
        let file = fs::File::open(&self.path).map_err(|source| self.open_error(source))?;
        let len = file
            .metadata()
            .map_err(|source| self.open_error(source))?
            .len();
        if len == 0 {
            debug!(ledger = %self.path.display(), "Ledger is empty");
            return Ok(Vec::new());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let header = reader.headers().map_err(|source| self.read_error(source))?;
        self.check_header(header)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|source| self.read_error(source))?;
            let line = row.position().map_or(0, |p| p.line());
            let record =
                BaselineRecord::from_row(row.iter()).map_err(|source| LedgerError::MalformedRow {
                    path: self.path.clone(),
                    line,
                    source,
                })?;
            records.push(record);
        }

        debug!(ledger = %self.path.display(), rows = records.len(), "Loaded ledger");
        Ok(records)
    }

    fn is_empty(&self) -> Result<bool> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.len() == 0),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(true),
            Err(source) => Err(self.open_error(source)),
        }
    }

    fn ends_with_newline(&self) -> Result<bool> {
        let mut file = fs::File::open(&self.path).map_err(|source| self.open_error(source))?;
        let mut last = [0u8; 1];
        file.seek(SeekFrom::End(-1))
            .and_then(|_| file.read_exact(&mut last))
            .map_err(|source| self.open_error(source))?;
        Ok(last[0] == b'\n')
    }

    fn verify_header(&self) -> Result<()> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.read_error(source))?;
        let mut header = StringRecord::new();
        reader
            .read_record(&mut header)
            .map_err(|source| self.read_error(source))?;
        self.check_header(&header)
    }

    fn check_header(&self, header: &StringRecord) -> Result<()> {
        if header.len() == COLUMN_COUNT && header.iter().eq(ledger_header()) {
            return Ok(());
        }
        Err(LedgerError::SchemaMismatch {
            path: self.path.clone(),
            found: header.iter().collect::<Vec<_>>().join(","),
        })
    }

    fn encode(&self, record: &BaselineRecord, with_header: bool) -> Result<Vec<u8>> {
        let encode_error = |source| LedgerError::Encode {
            path: self.path.clone(),
            source,
        };
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        if with_header {
            writer.write_record(ledger_header()).map_err(encode_error)?;
        }
        writer.write_record(record.to_row()).map_err(encode_error)?;
        writer
            .into_inner()
            .map_err(|err| self.open_error(err.into_error()))
    }

    fn open_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Open {
            path: self.path.clone(),
            source,
        }
    }

    fn read_error(&self, source: csv::Error) -> LedgerError {
        LedgerError::Read {
            path: self.path.clone(),
            source,
        }
    }
}
