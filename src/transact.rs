//! The transactional/speculative machinery of §4.H.
//!
//! Two different techniques are used, each where it fits best, and both
//! sanctioned directly by the design notes: the solver's graph (nodes,
//! edges, metavariables) uses a flat undo log in the style of
//! [`chalk`]'s `InferenceTable::snapshot`/`commit`/`rollback_to` - a
//! snapshot is just "the log's current length", commit is a no-op (the
//! log keeps growing so an *outer* snapshot can still unwind through
//! this work), and revert truncates the underlying containers back and
//! discards the log entries. Memo caches instead use "a cache per
//! shadow, queried bottom-up": a child cache holds only its own local
//! insertions and answers misses by asking its parent, so committing is
//! a cheap merge and reverting is just dropping the child.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

/// One entry in the solver's undo log. Every variant names a container
/// and the length (or value) to restore it to.
#[derive(Debug, Clone, Copy)]
pub enum UndoEntry {
    Nodes(usize),
    ConstrainEdges(usize),
    LeftCallEdges(usize),
    RightCallEdges(usize),
    Metavariables(usize),
    BlockLevel(u32),
}

/// A flat, append-only undo log shared by every snapshot taken against
/// the structure it journals. `speculate` is built out of `mark` +
/// either dropping the mark (commit) or `revert_to` (revert).
#[derive(Default)]
pub struct Journal {
    entries: Vec<UndoEntry>,
    open_snapshots: u32,
}

impl Journal {
    pub fn new() -> Journal {
        Journal::default()
    }

    pub fn record(&mut self, entry: UndoEntry) {
        self.entries.push(entry);
    }

    /// Takes a snapshot; returns the log position to later pass to
    /// `entries_since` or `truncate`.
    pub fn mark(&mut self) -> usize {
        self.open_snapshots += 1;
        self.entries.len()
    }

    /// Entries recorded since `mark`, most recent first (the order a
    /// revert must undo them in).
    pub fn entries_since(&self, mark: usize) -> impl Iterator<Item = UndoEntry> + '_ {
        self.entries[mark..].iter().rev().copied()
    }

    /// Drops the log entries back to `mark` once they have been applied
    /// by the caller. Closes the snapshot.
    pub fn truncate(&mut self, mark: usize) {
        self.entries.truncate(mark);
        self.open_snapshots -= 1;
    }

    /// Closes a snapshot without discarding its entries - a commit. An
    /// enclosing speculation may still need them to unwind further back.
    pub fn close(&mut self) {
        self.open_snapshots -= 1;
    }

    pub fn depth(&self) -> u32 {
        self.open_snapshots
    }
}

/// A cache keyed by `K`, chained to an optional parent so a shadow can
/// be taken by pushing a fresh, empty child: `get` climbs the chain on a
/// local miss; `commit` merges local entries into the parent; `revert`
/// just drops the child. While a child is alive the parent is locked -
/// writing to it directly is a bug, caught by a debug assertion (§4.H).
pub struct MemoCache<K, V> {
    parent: Option<Rc<MemoCache<K, V>>>,
    local: RefCell<HashMap<K, V>>,
    locked: Cell<bool>,
}

impl<K, V> Default for MemoCache<K, V> {
    fn default() -> Self {
        MemoCache {
            parent: None,
            local: RefCell::new(HashMap::new()),
            locked: Cell::new(false),
        }
    }
}

impl<K: Eq + Hash + Clone, V: Clone> MemoCache<K, V> {
    pub fn new() -> Rc<MemoCache<K, V>> {
        Rc::new(MemoCache::default())
    }

    pub fn get(&self, key: &K) -> Option<V> {
        if let Some(v) = self.local.borrow().get(key) {
            return Some(v.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(key))
    }

    pub fn insert(&self, key: K, value: V) {
        debug_assert!(!self.locked.get(), "write to a shadowed (locked) memo cache");
        self.local.borrow_mut().insert(key, value);
    }

    pub fn shadow(self: &Rc<Self>) -> Rc<MemoCache<K, V>> {
        self.locked.set(true);
        Rc::new(MemoCache {
            parent: Some(self.clone()),
            local: RefCell::new(HashMap::new()),
            locked: Cell::new(false),
        })
    }

    /// Folds this shadow's local entries into its parent and returns the
    /// parent, unlocked. Panics if called on a cache with no parent (the
    /// root is never itself a shadow of anything).
    pub fn commit(self: Rc<Self>) -> Rc<MemoCache<K, V>> {
        let parent = self.parent.clone().expect("commit on a non-shadow cache");
        parent.locked.set(false);
        for (k, v) in self.local.borrow_mut().drain() {
            parent.local.borrow_mut().insert(k, v);
        }
        parent
    }

    /// Discards this shadow's local entries and returns the parent,
    /// unlocked.
    pub fn revert(self: Rc<Self>) -> Rc<MemoCache<K, V>> {
        let parent = self.parent.clone().expect("revert on a non-shadow cache");
        parent.locked.set(false);
        parent
    }
}
