//! The key-value connection contract.

use std::collections::BTreeMap;

use super::command::{Command, Reply, ScanPage};
use super::error::{ConnResult, ConnectionError};

/// The minimum primitive set the record store needs from a backing store:
/// hash maps, sets, key existence, pattern scanning, and command batching
/// with an atomic variant.
///
/// Implementations are shared behind one `Arc<dyn KvConnection>` by every
/// table store registered on a datastore; they must tolerate concurrent
/// calls from many threads (hence `Send + Sync`).
///
/// Atomicity contract: [`exec_multi`](Self::exec_multi) applies the whole
/// batch as one indivisible unit relative to any other caller of the same
/// connection. That is the guarantee every per-record mutation in the
/// engine is built on. Plain [`pipeline`](Self::pipeline) only saves round
/// trips and guarantees nothing about interleaving.
pub trait KvConnection: Send + Sync {
    /// All fields of a hash; empty map when the key is absent.
    fn hget_all(&self, key: &str) -> ConnResult<BTreeMap<String, String>>;

    /// How many of the given keys currently exist.
    fn exists(&self, keys: &[String]) -> ConnResult<usize>;

    /// All members of a set; empty when the key is absent.
    fn smembers(&self, key: &str) -> ConnResult<Vec<String>>;

    /// Set membership test.
    fn sismember(&self, key: &str, member: &str) -> ConnResult<bool>;

    /// Deduplicated union of the given sets.
    fn sunion(&self, keys: &[String]) -> ConnResult<Vec<String>>;

    /// One page of a pattern key scan (`*` wildcards). Pages may be empty
    /// mid-scan; the scan is complete when the returned cursor is `None`.
    fn scan(&self, pattern: &str, cursor: u64, count: usize) -> ConnResult<ScanPage>;

    /// Issue a batch of commands in one round trip. Not atomic.
    fn pipeline(&self, commands: &[Command]) -> ConnResult<Vec<Reply>>;

    /// Issue a batch of commands as one atomic unit relative to every other
    /// caller of this connection (all-or-nothing, no interleaving).
    fn exec_multi(&self, commands: &[Command]) -> ConnResult<Vec<Reply>>;

    /// One field of a hash.
    fn hget(&self, key: &str, field: &str) -> ConnResult<Option<String>> {
        let fields = self.hmget(key, std::slice::from_ref(&field.to_string()))?;
        Ok(fields.into_iter().next().flatten())
    }

    /// Several fields of a hash, in request order.
    fn hmget(&self, key: &str, fields: &[String]) -> ConnResult<Vec<Option<String>>> {
        let command = Command::HmGet {
            key: key.to_string(),
            fields: fields.to_vec(),
        };
        let mut replies = self.pipeline(std::slice::from_ref(&command))?;
        match replies.pop().and_then(Reply::into_fields) {
            Some(values) if replies.is_empty() => Ok(values),
            _ => Err(ConnectionError::Protocol(
                "expected a single fields reply to HMGET".to_string(),
            )),
        }
    }

    /// A pipelined sequence of *independently* atomic batches: each inner
    /// batch gets the [`exec_multi`](Self::exec_multi) guarantee, but no
    /// atomicity holds across batches, and a later batch failing does not
    /// roll back an earlier one. This is the multi-record update/destroy
    /// shape.
    fn exec_multi_pipeline(&self, batches: &[Vec<Command>]) -> ConnResult<()> {
        for batch in batches {
            self.exec_multi(batch)?;
        }
        Ok(())
    }
}
