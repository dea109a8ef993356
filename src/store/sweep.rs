//! Bulk scan-and-delete, used by table drop.

use crate::connection::{Command, ConnResult, KvConnection};

/// Keys requested per scan page.
const SCAN_PAGE: usize = 128;

/// Delete every key matching `pattern`.
///
/// Drives the cursor to completion, issuing each page's deletions as one
/// pipelined batch before requesting the next page; a failed deletion batch
/// aborts the sweep with its error instead of being silently dropped. Empty
/// pages are tolerated (a no-op), so sweeping an empty keyspace is safe and
/// the operation is idempotent. Returns the number of deletions issued.
pub(crate) fn delete_matching(conn: &dyn KvConnection, pattern: &str) -> ConnResult<usize> {
    let mut cursor = 0;
    let mut deleted = 0;

    loop {
        let page = conn.scan(pattern, cursor, SCAN_PAGE)?;

        if !page.keys.is_empty() {
            let deletions: Vec<Command> = page
                .keys
                .into_iter()
                .map(|key| Command::Del { key })
                .collect();
            deleted += deletions.len();
            conn.pipeline(&deletions)?;
        }

        match page.cursor {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(deleted)
}
