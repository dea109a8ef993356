//! In-memory backend implementing the connection contract.
//!
//! Stands in for a networked store in tests and embedded use. Semantics
//! follow the real thing where the engine depends on them: hashes and sets
//! live in one keyspace, type mismatches report `WRONGTYPE`, and a hash or
//! set whose last field/member is removed disappears as a key.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;

use super::command::{Command, Reply, ScanPage};
use super::error::{ConnResult, ConnectionError};
use super::kv::KvConnection;

#[derive(Debug, Clone)]
enum Entry {
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

/// A process-local key-value store guarded by a single lock.
///
/// `exec_multi` holds the write lock for the whole batch, which gives every
/// batch the required indivisibility relative to other callers.
#[derive(Default)]
pub struct MemoryConnection {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys (test helper).
    pub fn key_count(&self) -> usize {
        self.entries.read().len()
    }

    fn apply(entries: &mut HashMap<String, Entry>, command: &Command) -> ConnResult<Reply> {
        match command {
            Command::HSet { key, fields } => {
                let entry = entries
                    .entry(key.clone())
                    .or_insert_with(|| Entry::Hash(BTreeMap::new()));
                match entry {
                    Entry::Hash(hash) => {
                        for (field, value) in fields {
                            hash.insert(field.clone(), value.clone());
                        }
                        Ok(Reply::Unit)
                    }
                    Entry::Set(_) => Err(wrong_type(key)),
                }
            }
            Command::HDel { key, fields } => {
                let Some(entry) = entries.get_mut(key) else {
                    return Ok(Reply::Int(0));
                };
                match entry {
                    Entry::Hash(hash) => {
                        let mut removed = 0;
                        for field in fields {
                            if hash.remove(field).is_some() {
                                removed += 1;
                            }
                        }
                        if hash.is_empty() {
                            entries.remove(key);
                        }
                        Ok(Reply::Int(removed))
                    }
                    Entry::Set(_) => Err(wrong_type(key)),
                }
            }
            Command::HmGet { key, fields } => match entries.get(key) {
                None => Ok(Reply::Fields(vec![None; fields.len()])),
                Some(Entry::Hash(hash)) => Ok(Reply::Fields(
                    fields.iter().map(|f| hash.get(f).cloned()).collect(),
                )),
                Some(Entry::Set(_)) => Err(wrong_type(key)),
            },
            Command::Del { key } => {
                let removed = entries.remove(key).is_some();
                Ok(Reply::Int(removed as usize))
            }
            Command::SAdd { key, members } => {
                let entry = entries
                    .entry(key.clone())
                    .or_insert_with(|| Entry::Set(BTreeSet::new()));
                match entry {
                    Entry::Set(set) => {
                        let mut added = 0;
                        for member in members {
                            if set.insert(member.clone()) {
                                added += 1;
                            }
                        }
                        Ok(Reply::Int(added))
                    }
                    Entry::Hash(_) => Err(wrong_type(key)),
                }
            }
            Command::SRem { key, members } => {
                let Some(entry) = entries.get_mut(key) else {
                    return Ok(Reply::Int(0));
                };
                match entry {
                    Entry::Set(set) => {
                        let mut removed = 0;
                        for member in members {
                            if set.remove(member) {
                                removed += 1;
                            }
                        }
                        if set.is_empty() {
                            entries.remove(key);
                        }
                        Ok(Reply::Int(removed))
                    }
                    Entry::Hash(_) => Err(wrong_type(key)),
                }
            }
        }
    }
}

impl KvConnection for MemoryConnection {
    fn hget_all(&self, key: &str) -> ConnResult<BTreeMap<String, String>> {
        match self.entries.read().get(key) {
            None => Ok(BTreeMap::new()),
            Some(Entry::Hash(hash)) => Ok(hash.clone()),
            Some(Entry::Set(_)) => Err(wrong_type(key)),
        }
    }

    fn exists(&self, keys: &[String]) -> ConnResult<usize> {
        let entries = self.entries.read();
        Ok(keys.iter().filter(|k| entries.contains_key(*k)).count())
    }

    fn smembers(&self, key: &str) -> ConnResult<Vec<String>> {
        match self.entries.read().get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(set)) => Ok(set.iter().cloned().collect()),
            Some(Entry::Hash(_)) => Err(wrong_type(key)),
        }
    }

    fn sismember(&self, key: &str, member: &str) -> ConnResult<bool> {
        match self.entries.read().get(key) {
            None => Ok(false),
            Some(Entry::Set(set)) => Ok(set.contains(member)),
            Some(Entry::Hash(_)) => Err(wrong_type(key)),
        }
    }

    fn sunion(&self, keys: &[String]) -> ConnResult<Vec<String>> {
        let entries = self.entries.read();
        let mut union = BTreeSet::new();
        for key in keys {
            match entries.get(key) {
                None => {}
                Some(Entry::Set(set)) => union.extend(set.iter().cloned()),
                Some(Entry::Hash(_)) => return Err(wrong_type(key)),
            }
        }
        Ok(union.into_iter().collect())
    }

    fn scan(&self, pattern: &str, cursor: u64, count: usize) -> ConnResult<ScanPage> {
        let entries = self.entries.read();
        // sorted snapshot so offset cursors stay meaningful across pages
        let mut matching: Vec<String> = entries
            .keys()
            .filter(|k| glob_match(pattern, k))
            .cloned()
            .collect();
        matching.sort();

        let offset = cursor as usize;
        if offset >= matching.len() {
            return Ok(ScanPage::done());
        }

        let end = (offset + count.max(1)).min(matching.len());
        let keys = matching[offset..end].to_vec();
        let next = if end < matching.len() { Some(end as u64) } else { None };

        Ok(ScanPage { keys, cursor: next })
    }

    fn pipeline(&self, commands: &[Command]) -> ConnResult<Vec<Reply>> {
        let mut entries = self.entries.write();
        commands
            .iter()
            .map(|c| Self::apply(&mut entries, c))
            .collect()
    }

    fn exec_multi(&self, commands: &[Command]) -> ConnResult<Vec<Reply>> {
        // one write lock across the batch: indivisible relative to any
        // other caller of this connection
        let mut entries = self.entries.write();
        commands
            .iter()
            .map(|c| Self::apply(&mut entries, c))
            .collect()
    }
}

fn wrong_type(key: &str) -> ConnectionError {
    ConnectionError::WrongType { key: key.to_string() }
}

/// Minimal glob matching: `*` matches any run of characters, everything
/// else is literal. The only patterns the store generates are literal keys
/// with `*` segments.
fn glob_match(pattern: &str, key: &str) -> bool {
    let mut parts = pattern.split('*');

    let first = parts.next().unwrap_or("");
    if !key.starts_with(first) {
        return false;
    }
    if !pattern.contains('*') {
        return key == pattern;
    }

    let mut rest = &key[first.len()..];
    let mut last: Option<&str> = None;

    for part in parts {
        last = Some(part);
        if part.is_empty() {
            continue;
        }
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    // a trailing literal must sit at the very end of the key
    match last {
        Some(part) if !part.is_empty() => key.ends_with(part),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hset(key: &str, fields: &[(&str, &str)]) -> Command {
        Command::HSet {
            key: key.to_string(),
            fields: fields
                .iter()
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect(),
        }
    }

    fn sadd(key: &str, members: &[&str]) -> Command {
        Command::SAdd {
            key: key.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    #[test]
    fn test_hash_round_trip() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[hset("users:1", &[("name", "Ada"), ("age", "36")])])
            .unwrap();

        let all = conn.hget_all("users:1").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["name"], "Ada");

        let values = conn
            .hmget("users:1", &["age".to_string(), "missing".to_string()])
            .unwrap();
        assert_eq!(values, vec![Some("36".to_string()), None]);
    }

    #[test]
    fn test_hdel_removes_empty_hash() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[hset("users:1", &[("name", "Ada")])]).unwrap();

        conn.exec_multi(&[Command::HDel {
            key: "users:1".to_string(),
            fields: vec!["name".to_string()],
        }])
        .unwrap();

        assert_eq!(conn.exists(&["users:1".to_string()]).unwrap(), 0);
    }

    #[test]
    fn test_set_operations() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[sadd("idx:a", &["1", "2"]), sadd("idx:b", &["2", "3"])])
            .unwrap();

        assert!(conn.sismember("idx:a", "1").unwrap());
        assert!(!conn.sismember("idx:a", "3").unwrap());

        let union = conn
            .sunion(&["idx:a".to_string(), "idx:b".to_string(), "idx:none".to_string()])
            .unwrap();
        assert_eq!(union, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_srem_removes_empty_set() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[sadd("idx:a", &["only"])]).unwrap();
        conn.exec_multi(&[Command::SRem {
            key: "idx:a".to_string(),
            members: vec!["only".to_string()],
        }])
        .unwrap();

        assert_eq!(conn.key_count(), 0);
        assert_eq!(conn.smembers("idx:a").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_wrong_type() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[hset("users:1", &[("name", "Ada")])]).unwrap();

        let err = conn.smembers("users:1").unwrap_err();
        assert!(matches!(err, ConnectionError::WrongType { .. }));

        let err = conn.exec_multi(&[sadd("users:1", &["x"])]).unwrap_err();
        assert!(matches!(err, ConnectionError::WrongType { .. }));
    }

    #[test]
    fn test_exists_counts_keys() {
        let conn = MemoryConnection::new();
        conn.exec_multi(&[hset("a", &[("f", "1")]), hset("b", &[("f", "2")])])
            .unwrap();

        let count = conn
            .exists(&["a".to_string(), "b".to_string(), "c".to_string()])
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_scan_pages_through_matches() {
        let conn = MemoryConnection::new();
        let mut batch = Vec::new();
        for i in 0..25 {
            batch.push(hset(&format!("users:{i:02}"), &[("f", "v")]));
        }
        batch.push(hset("other:1", &[("f", "v")]));
        conn.exec_multi(&batch).unwrap();

        let mut seen = Vec::new();
        let mut cursor = 0;
        loop {
            let page = conn.scan("users:*", cursor, 10).unwrap();
            seen.extend(page.keys);
            match page.cursor {
                Some(next) => cursor = next,
                None => break,
            }
        }

        assert_eq!(seen.len(), 25);
        assert!(!seen.contains(&"other:1".to_string()));
    }

    #[test]
    fn test_scan_empty_keyspace() {
        let conn = MemoryConnection::new();
        let page = conn.scan("users:*", 0, 10).unwrap();
        assert!(page.keys.is_empty());
        assert_eq!(page.cursor, None);
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("users:*", "users:1"));
        assert!(glob_match("users:*", "users:"));
        assert!(!glob_match("users:*", "users"));
        assert!(!glob_match("users:*", "users.index:a:b"));
        assert!(glob_match("users.index:*", "users.index:name:abc"));
        assert!(glob_match("*", "anything"));
        assert!(glob_match("a*c", "abc"));
        assert!(glob_match("a*c", "ac"));
        assert!(!glob_match("a*c", "acx"));
        assert!(glob_match("exact", "exact"));
        assert!(!glob_match("exact", "exactly"));
    }
}
