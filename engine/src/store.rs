//! Ordered transaction collection backing the rendered list.
//!
//! Single source of truth for the list and the balance: newest first
//! (date desc, then id desc, matching the server's ordering), unique by id,
//! with an `offset`/`is_all_loaded` cursor for incremental pagination.

use chrono::NaiveDate;
use shared::{Transaction, TransactionId};

#[derive(Debug, Default)]
pub struct TransactionStore {
    items: Vec<Transaction>,
    offset: usize,
    is_all_loaded: bool,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.items.iter()
    }

    pub fn get(&self, id: TransactionId) -> Option<&Transaction> {
        self.items.iter().find(|tx| tx.id == id)
    }

    pub fn contains(&self, id: TransactionId) -> bool {
        self.get(id).is_some()
    }

    /// Pagination cursor: how many rows the server has already handed out.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn is_all_loaded(&self) -> bool {
        self.is_all_loaded
    }

    /// Inserts keeping newest-first order. An existing row with the same id
    /// is replaced instead (the list is unique by id).
    pub fn insert_sorted(&mut self, tx: Transaction) {
        if let Some(pos) = self.position(tx.id) {
            self.items[pos] = tx;
            return;
        }
        let at = self
            .items
            .iter()
            .position(|existing| Self::sorts_before(&tx, existing))
            .unwrap_or(self.items.len());
        self.items.insert(at, tx);
    }

    /// Replaces the record stored under `old_id` with `tx`, keeping the slot
    /// when the sort key is unchanged. When the date (or id, for a
    /// placeholder being confirmed) moved, the row is re-inserted at its
    /// correct position instead so the newest-first invariant holds.
    pub fn replace(&mut self, old_id: TransactionId, tx: Transaction) -> bool {
        let Some(pos) = self.position(old_id) else {
            return false;
        };
        let same_key = self.items[pos].date == tx.date && self.items[pos].id == tx.id;
        if same_key {
            self.items[pos] = tx;
        } else {
            self.items.remove(pos);
            self.insert_sorted(tx);
        }
        true
    }

    pub fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let pos = self.position(id)?;
        Some(self.items.remove(pos))
    }

    /// Appends one server page, skipping rows already present (an optimistic
    /// add may have been confirmed into an id the next page still contains).
    /// Advances the cursor and latches `is_all_loaded` on a short page.
    pub fn append_page(&mut self, page: Vec<Transaction>, limit: usize) {
        self.offset += page.len();
        self.is_all_loaded = page.len() < limit;
        for tx in page {
            if !self.contains(tx.id) {
                // Server pages arrive oldest-last; keep the global order.
                self.insert_sorted(tx);
            }
        }
    }

    /// Cold load / full refresh: replaces everything and restarts the cursor.
    pub fn reset(&mut self, items: Vec<Transaction>, limit: usize) {
        self.offset = items.len();
        self.is_all_loaded = items.len() < limit;
        self.items = items;
        self.items
            .sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    }

    /// Full recomputation of the balance. Only used on cold load and in
    /// verification; every per-mutation update goes through signed deltas.
    pub fn signed_total(&self) -> f64 {
        self.items.iter().map(Transaction::signed_amount).sum()
    }

    pub fn transactions_on(&self, day: NaiveDate) -> Vec<&Transaction> {
        self.items.iter().filter(|tx| tx.day() == day).collect()
    }

    fn position(&self, id: TransactionId) -> Option<usize> {
        self.items.iter().position(|tx| tx.id == id)
    }

    fn sorts_before(tx: &Transaction, other: &Transaction) -> bool {
        (tx.date, tx.id) > (other.date, other.id)
    }
}
