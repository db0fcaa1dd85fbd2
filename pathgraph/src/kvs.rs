// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Ordered key-value substrate on sled
//!
//! The storage engine talks to an ordered byte-key store through three
//! primitives: `view` (snapshot read with `get` and ascending prefix
//! iteration), `update` (read-write transaction that commits atomically or
//! not at all), and `backup` (point-in-time logical stream).
//!
//! sled provides neither MVCC read snapshots nor prefix scans inside its
//! transactional API, so the contract is built from three pieces:
//!
//! - a readers-writer lock: views hold the read side, updates the write
//!   side, which makes every view a consistent snapshot;
//! - write staging: an update buffers its mutations in an ordered overlay
//!   that its own reads and prefix scans observe, and commits the buffer
//!   through a multi-tree sled transaction on success;
//! - a deadline sidecar tree for `set_with_ttl`: entries past their
//!   deadline are invisible to reads and physically dropped on the next
//!   write that touches the key.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use parking_lot::{RwLock, RwLockReadGuard};
use sled::transaction::{ConflictableTransactionResult, TransactionError, TransactionalTree};
use sled::Transactional;

use crate::error::{GraphError, Result};

const DATA_TREE: &str = "data";
const EXPIRY_TREE: &str = "expirations";

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn decode_deadline(raw: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    if raw.len() == 8 {
        buf.copy_from_slice(raw);
    }
    i64::from_be_bytes(buf)
}

/// Embedded ordered key-value store
pub struct Kvs {
    db: sled::Db,
    data: sled::Tree,
    expiry: sled::Tree,
    lock: RwLock<()>,
    open: AtomicBool,
}

impl Kvs {
    /// Open or create the store at the given directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        let data = db.open_tree(DATA_TREE)?;
        let expiry = db.open_tree(EXPIRY_TREE)?;
        info!("kv store opened at {}", path.display());
        Ok(Self {
            db,
            data,
            expiry,
            lock: RwLock::new(()),
            open: AtomicBool::new(true),
        })
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn check_open(&self) -> Result<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(GraphError::NotOpen)
        }
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.check_open()?;
        self.db.flush()?;
        Ok(())
    }

    /// Flush and mark the store closed; later operations fail with `NotOpen`
    pub fn close(&self) -> Result<()> {
        if self.open.swap(false, Ordering::AcqRel) {
            self.db.flush()?;
            info!("kv store closed");
        }
        Ok(())
    }

    /// Take a read snapshot. Held snapshots exclude writers.
    pub fn snapshot(&self) -> Result<Snapshot<'_>> {
        self.check_open()?;
        Ok(Snapshot {
            kvs: self,
            _guard: self.lock.read(),
        })
    }

    /// Snapshot read: invoke `f` against a consistent view of the store
    pub fn view<T>(&self, f: impl FnOnce(&Snapshot<'_>) -> Result<T>) -> Result<T> {
        let snap = self.snapshot()?;
        f(&snap)
    }

    /// Read-write transaction: on `Ok` every staged write commits
    /// atomically; on error nothing persists.
    pub fn update<T>(&self, f: impl FnOnce(&mut WriteTxn<'_>) -> Result<T>) -> Result<T> {
        self.check_open()?;
        let _guard = self.lock.write();
        let mut txn = WriteTxn {
            kvs: self,
            staged: BTreeMap::new(),
        };
        let out = f(&mut txn)?;
        txn.commit()?;
        Ok(out)
    }

    /// Stream a point-in-time logical backup, returning bytes written.
    ///
    /// Format: repeated `u32 key-len, key, u32 value-len, value` records in
    /// key order. Expired entries are not included.
    pub fn backup<W: Write>(&self, writer: &mut W) -> Result<u64> {
        self.check_open()?;
        let _guard = self.lock.read();
        let mut written = 0u64;
        for entry in self.data.iter() {
            let (key, value) = entry?;
            if self.expired(&key)? {
                continue;
            }
            writer.write_all(&(key.len() as u32).to_be_bytes())?;
            writer.write_all(&key)?;
            writer.write_all(&(value.len() as u32).to_be_bytes())?;
            writer.write_all(&value)?;
            written += 8 + key.len() as u64 + value.len() as u64;
        }
        writer.flush()?;
        debug!("backup stream complete: {} bytes", written);
        Ok(written)
    }

    fn expired(&self, key: &[u8]) -> Result<bool> {
        if let Some(deadline) = self.expiry.get(key)? {
            return Ok(decode_deadline(&deadline) <= now_millis());
        }
        Ok(false)
    }

    fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let value = match self.data.get(key)? {
            Some(v) => v,
            None => return Ok(None),
        };
        if self.expired(key)? {
            return Ok(None);
        }
        Ok(Some(value.to_vec()))
    }

    fn scan_raw<'a>(
        &'a self,
        prefix: &[u8],
    ) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 'a {
        let check_expiry = !self.expiry.is_empty();
        self.data.scan_prefix(prefix).filter_map(move |entry| {
            let (key, value) = match entry {
                Ok(kv) => kv,
                Err(e) => return Some(Err(e.into())),
            };
            if check_expiry {
                match self.expired(&key) {
                    Ok(true) => return None,
                    Ok(false) => {}
                    Err(e) => return Some(Err(e)),
                }
            }
            Some(Ok((key.to_vec(), value.to_vec())))
        })
    }
}

/// Consistent read view of the store
pub struct Snapshot<'a> {
    kvs: &'a Kvs,
    _guard: RwLockReadGuard<'a, ()>,
}

impl Snapshot<'_> {
    /// Point lookup; absent and expired keys read as `None`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.kvs.get_raw(key)
    }

    /// Ascending lexicographic iteration over a key prefix
    pub fn seek_prefix<'s>(
        &'s self,
        prefix: &[u8],
    ) -> impl Iterator<Item = Result<(Vec<u8>, Vec<u8>)>> + 's {
        self.kvs.scan_raw(prefix)
    }

    /// Count keys under a prefix without materializing values
    pub fn count_prefix(&self, prefix: &[u8]) -> Result<usize> {
        let check_expiry = !self.kvs.expiry.is_empty();
        let mut count = 0usize;
        for key in self.kvs.data.scan_prefix(prefix).keys() {
            let key = key?;
            if check_expiry && self.kvs.expired(&key)? {
                continue;
            }
            count += 1;
        }
        Ok(count)
    }
}

enum Staged {
    Put(Vec<u8>),
    PutWithTtl(Vec<u8>, i64),
    Delete,
}

/// Read-write transaction over the store
///
/// Reads and prefix scans observe the transaction's own staged writes
/// overlaid on the committed state.
pub struct WriteTxn<'a> {
    kvs: &'a Kvs,
    staged: BTreeMap<Vec<u8>, Staged>,
}

impl WriteTxn<'_> {
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(Staged::Put(value)) => Ok(Some(value.clone())),
            Some(Staged::PutWithTtl(value, deadline)) => {
                if *deadline <= now_millis() {
                    Ok(None)
                } else {
                    Ok(Some(value.clone()))
                }
            }
            Some(Staged::Delete) => Ok(None),
            None => self.kvs.get_raw(key),
        }
    }

    pub fn set(&mut self, key: &[u8], value: &[u8]) {
        self.staged.insert(key.to_vec(), Staged::Put(value.to_vec()));
    }

    /// Store a value that the engine itself expires after `ttl`
    pub fn set_with_ttl(&mut self, key: &[u8], value: &[u8], ttl: Duration) {
        let deadline = now_millis() + ttl.as_millis() as i64;
        self.staged
            .insert(key.to_vec(), Staged::PutWithTtl(value.to_vec(), deadline));
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.staged.insert(key.to_vec(), Staged::Delete);
    }

    /// Ascending prefix scan merging committed state with staged writes
    pub fn seek_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> = BTreeMap::new();
        for entry in self.kvs.scan_raw(prefix) {
            let (key, value) = entry?;
            merged.insert(key, value);
        }
        for (key, op) in self.staged.range(prefix.to_vec()..) {
            if !key.starts_with(prefix) {
                break;
            }
            match op {
                Staged::Put(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                Staged::PutWithTtl(value, deadline) => {
                    if *deadline > now_millis() {
                        merged.insert(key.clone(), value.clone());
                    } else {
                        merged.remove(key);
                    }
                }
                Staged::Delete => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn commit(self) -> Result<()> {
        if self.staged.is_empty() {
            return Ok(());
        }
        let staged = &self.staged;
        (&self.kvs.data, &self.kvs.expiry)
            .transaction(
                |(data, expiry): &(TransactionalTree, TransactionalTree)|
                 -> ConflictableTransactionResult<(), ()> {
                    for (key, op) in staged {
                        match op {
                            Staged::Put(value) => {
                                data.insert(key.as_slice(), value.as_slice())?;
                                expiry.remove(key.as_slice())?;
                            }
                            Staged::PutWithTtl(value, deadline) => {
                                data.insert(key.as_slice(), value.as_slice())?;
                                expiry.insert(key.as_slice(), deadline.to_be_bytes().to_vec())?;
                            }
                            Staged::Delete => {
                                data.remove(key.as_slice())?;
                                expiry.remove(key.as_slice())?;
                            }
                        }
                    }
                    Ok(())
                },
            )
            .map_err(|e: TransactionError<()>| match e {
                TransactionError::Abort(()) => {
                    GraphError::IndexInconsistency("write transaction aborted".to_string())
                }
                TransactionError::Storage(e) => GraphError::Kv(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Kvs) {
        let dir = tempfile::tempdir().expect("tempdir");
        let kvs = Kvs::open(dir.path().join("kv")).expect("open");
        (dir, kvs)
    }

    #[test]
    fn update_commits_atomically_and_rolls_back_on_error() {
        let (_dir, kvs) = open_temp();

        kvs.update(|txn| {
            txn.set(b"a", b"1");
            txn.set(b"b", b"2");
            Ok(())
        })
        .unwrap();

        let failed: Result<()> = kvs.update(|txn| {
            txn.set(b"c", b"3");
            Err(GraphError::BadArgument("boom".to_string()))
        });
        assert!(failed.is_err());

        kvs.view(|snap| {
            assert_eq!(snap.get(b"a")?, Some(b"1".to_vec()));
            assert_eq!(snap.get(b"c")?, None);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn txn_reads_observe_staged_writes() {
        let (_dir, kvs) = open_temp();
        kvs.update(|txn| {
            txn.set(b"k:1", b"one");
            Ok(())
        })
        .unwrap();

        kvs.update(|txn| {
            txn.set(b"k:2", b"two");
            txn.delete(b"k:1");
            assert_eq!(txn.get(b"k:1")?, None);
            assert_eq!(txn.get(b"k:2")?, Some(b"two".to_vec()));
            let scanned = txn.seek_prefix(b"k:")?;
            assert_eq!(scanned.len(), 1);
            assert_eq!(scanned[0].0, b"k:2");
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn seek_prefix_is_lexicographically_ordered() {
        let (_dir, kvs) = open_temp();
        kvs.update(|txn| {
            txn.set(b"p:b", b"2");
            txn.set(b"p:a", b"1");
            txn.set(b"p:c", b"3");
            txn.set(b"q:a", b"other");
            Ok(())
        })
        .unwrap();

        kvs.view(|snap| {
            let keys: Vec<Vec<u8>> = snap
                .seek_prefix(b"p:")
                .map(|e| e.map(|(k, _)| k))
                .collect::<Result<_>>()?;
            assert_eq!(keys, vec![b"p:a".to_vec(), b"p:b".to_vec(), b"p:c".to_vec()]);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn ttl_entries_expire_lazily() {
        let (_dir, kvs) = open_temp();
        kvs.update(|txn| {
            txn.set_with_ttl(b"gone", b"x", Duration::from_millis(20));
            txn.set_with_ttl(b"kept", b"y", Duration::from_secs(60));
            Ok(())
        })
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));

        kvs.view(|snap| {
            assert_eq!(snap.get(b"gone")?, None);
            assert_eq!(snap.get(b"kept")?, Some(b"y".to_vec()));
            assert_eq!(snap.count_prefix(b"")?, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn closed_store_rejects_operations() {
        let (_dir, kvs) = open_temp();
        kvs.close().unwrap();
        let err = kvs.view(|_| Ok(())).unwrap_err();
        assert!(matches!(err, GraphError::NotOpen));
        let err = kvs.update(|_| Ok(())).unwrap_err();
        assert!(matches!(err, GraphError::NotOpen));
    }

    #[test]
    fn backup_streams_live_entries() {
        let (_dir, kvs) = open_temp();
        kvs.update(|txn| {
            txn.set(b"k", b"value");
            Ok(())
        })
        .unwrap();

        let mut out = Vec::new();
        let written = kvs.backup(&mut out).unwrap();
        assert_eq!(written as usize, out.len());
        assert_eq!(written, 8 + 1 + 5);
    }
}
