//! JSON import/export of session history.
//!
//! The wire format is a JSON array of
//! `{date, startTimeOfDay, durationMinutes}` objects. Import parses the
//! whole payload before touching the store: malformed or empty input is
//! a reported failure with no partial writes, and a successful import
//! is one upsert batch, so re-importing an export is idempotent.

use std::io::{Read, Write};

use crate::error::TransferError;
use crate::storage::Database;
use crate::timer::CompletedSession;

/// Serialize the full session history to `writer`. Returns the number
/// of sessions exported.
pub fn export<W: Write>(db: &Database, mut writer: W) -> Result<usize, TransferError> {
    let sessions = db.all_sessions()?;
    let json = serde_json::to_string_pretty(&sessions)
        .map_err(|e| TransferError::Malformed(e.to_string()))?;
    writer.write_all(json.as_bytes())?;
    Ok(sessions.len())
}

/// Parse a session array from `reader` and upsert it in one batch.
/// Returns the number of sessions imported.
pub fn import<R: Read>(db: &mut Database, mut reader: R) -> Result<usize, TransferError> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;

    let sessions: Vec<CompletedSession> =
        serde_json::from_str(&raw).map_err(|e| TransferError::Malformed(e.to_string()))?;
    if sessions.is_empty() {
        return Err(TransferError::Empty);
    }

    db.append_batch(&sessions)?;
    Ok(sessions.len())
}
