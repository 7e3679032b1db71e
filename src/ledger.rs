use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;

use crate::models::user::AuthenticatedUser;

/// UTF-8 byte-order marker, written once at file creation so spreadsheet
/// tools auto-detect the encoding.
pub const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Fixed 5-column header, written exactly once when the file is created.
pub const CSV_HEADER: &str = "timestamp_utc,id,email,name,picture";

/// Append-only CSV log of first-time sign-ins.
///
/// Rows are never rewritten or deleted. The same identity signing in from
/// two different sessions produces two rows; this is an event log, not a
/// user registry.
pub struct SignupLedger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Ledger write lock poisoned")]
    LockPoisoned,
}

impl SignupLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SignupLedger {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append one signup row, creating the file with BOM + header on first
    /// use.
    ///
    /// Appends are serialized by an internal mutex; `create_new` keeps the
    /// create race safe across processes. Callers in the login path log and
    /// swallow the error so a full disk never blocks sign-in.
    pub fn record(&self, user: &AuthenticatedUser) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().map_err(|_| LedgerError::LockPoisoned)?;

        let row = Self::encode_row(user);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(mut file) => {
                file.write_all(UTF8_BOM)?;
                write!(file, "{}\r\n{}\r\n", CSV_HEADER, row)?;
                file.flush()?;
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                // Plain UTF-8 on append: the marker appears once, at the
                // very start of the file.
                let mut file = OpenOptions::new().append(true).open(&self.path)?;
                write!(file, "{}\r\n", row)?;
                file.flush()?;
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    fn encode_row(user: &AuthenticatedUser) -> String {
        let timestamp = Utc::now().to_rfc3339();
        [
            timestamp.as_str(),
            user.id.as_str(),
            user.email.as_deref().unwrap_or(""),
            user.name.as_deref().unwrap_or(""),
            user.picture.as_deref().unwrap_or(""),
        ]
        .iter()
        .map(|cell| Self::escape_cell(cell))
        .collect::<Vec<_>>()
        .join(",")
    }

    fn escape_cell(cell: &str) -> String {
        if cell.contains([',', '"', '\r', '\n']) {
            format!("\"{}\"", cell.replace('"', "\"\""))
        } else {
            cell.to_string()
        }
    }
}
