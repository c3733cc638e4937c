//! Read-modify-write of a single `(seller, store)` line.
//!
//! Every commit reads the whole file, drops the lines owned by the target
//! `(seller, store)`, appends one freshly encoded line for it and replaces
//! the file. Lines owned by anyone else come back byte-for-byte in their
//! original order. The target's line always ends up last, so line position
//! is not stable across edits.
//!
//! A target line that reads as both legacy and current format is never
//! replaced: the commit fails with [`CatalogError::AmbiguousLine`] and the
//! file is left alone.

use crate::codec;
use crate::file;
use crate::{CatalogError, CatalogResult};
use marketstack_model::StoreRecord;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Whether `line` holds data for `(seller_id, store_name)`.
///
/// The first field must equal the seller identifier and the second must
/// equal the store name, ignoring case. Prefix matches do not count:
/// `Nike` does not own a `NikeOutlet` line.
#[must_use]
pub fn belongs_to(line: &str, seller_id: &str, store_name: &str) -> bool {
    match codec::header(line) {
        Some(header) => {
            header.seller == seller_id.trim()
                && header
                    .store
                    .is_some_and(|s| s.eq_ignore_ascii_case(store_name.trim()))
        }
        None => false,
    }
}

/// Counts from one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerCommit {
    /// Unrelated lines written back unchanged.
    pub preserved: usize,
    /// Lines for the target that were dropped before appending the new one.
    pub replaced: usize,
}

/// Serialises commits to one catalog file within this process.
#[derive(Debug)]
pub struct LedgerWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl LedgerWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrites the file so that `store` is represented by exactly one line.
    ///
    /// The caller applies its mutation to `store` first. On error the file is
    /// left as it was and the caller's in-memory state is ahead of it.
    pub fn commit(&self, seller_id: &str, store: &StoreRecord) -> CatalogResult<LedgerCommit> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let lines = file::read_lines(&self.path)?;
        let crlf = file::uses_crlf(&lines);
        let (owned, mut kept): (Vec<String>, Vec<String>) = lines
            .into_iter()
            .partition(|line| belongs_to(line, seller_id, store.name()));
        if owned.iter().any(|line| codec::ambiguity(line).is_some()) {
            return Err(ambiguous(seller_id, store.name()));
        }
        let commit = LedgerCommit {
            preserved: kept.len(),
            replaced: owned.len(),
        };

        let mut line = codec::encode_store_line(seller_id, store);
        if crlf {
            line.push('\r');
        }
        kept.push(line);
        file::write_lines(&self.path, &kept)?;

        debug!(
            "Committed {}/{} ({} products, replaced {} lines)",
            seller_id,
            store.name(),
            store.products().len(),
            commit.replaced
        );
        Ok(commit)
    }

    /// Appends a seller-only line unless some line already starts with the
    /// seller. Returns whether the file changed.
    pub fn register_seller(&self, seller_id: &str) -> CatalogResult<bool> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut lines = file::read_lines(&self.path)?;
        let seller_id = seller_id.trim();
        if lines
            .iter()
            .filter_map(|l| codec::header(l))
            .any(|h| h.seller == seller_id)
        {
            return Ok(false);
        }
        let mut line = codec::encode_seller_line(seller_id);
        if file::uses_crlf(&lines) {
            line.push('\r');
        }
        lines.push(line);
        file::write_lines(&self.path, &lines)?;
        debug!("Registered seller {}", seller_id);
        Ok(true)
    }

    /// Fails with [`CatalogError::AmbiguousLine`] when the line for
    /// `(seller_id, store_name)` cannot be safely replaced.
    pub fn ensure_replaceable(&self, seller_id: &str, store_name: &str) -> CatalogResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let lines = file::read_lines(&self.path)?;
        if lines
            .iter()
            .any(|l| belongs_to(l, seller_id, store_name) && codec::ambiguity(l).is_some())
        {
            return Err(ambiguous(seller_id, store_name));
        }
        Ok(())
    }

    /// Replaces the whole file with `lines`. Refused while the current file
    /// holds an ambiguous line.
    pub fn rewrite_all<S: AsRef<str>>(&self, lines: &[S]) -> CatalogResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = file::read_lines(&self.path)?;
        if let Some(line) = current.iter().find(|l| codec::ambiguity(l).is_some()) {
            let (seller, store) = codec::header(line)
                .map(|h| (h.seller, h.store.unwrap_or_default()))
                .unwrap_or_default();
            return Err(ambiguous(&seller, &store));
        }
        file::write_lines(&self.path, lines)?;
        Ok(())
    }
}

fn ambiguous(seller_id: &str, store_name: &str) -> CatalogError {
    CatalogError::AmbiguousLine {
        seller: seller_id.trim().to_string(),
        store: store_name.trim().to_string(),
    }
}
