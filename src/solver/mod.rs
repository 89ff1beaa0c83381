//! The constraint solver (§4.F, §4.G): the node table, the three edge
//! families, the LIFO work queue, and metavariable storage, plus the
//! transactional journal that lets [`crate::transact`] unwind all of it
//! on a failed speculation.

pub mod cause;
pub mod constrain;
pub mod graph;
pub mod node;
pub mod queue;
pub mod slice;

use crate::metavariable::{MetaVarId, Metavariable};
use crate::transact::{Journal, UndoEntry};
use crate::value::Flex;

use graph::EdgeSet;
use node::{NodeId, NodeKind, NodeTable};
use queue::WorkQueue;

pub use constrain::constrain;

pub struct Solver {
    pub nodes: NodeTable,
    pub edges: EdgeSet,
    pub queue: WorkQueue,
    metavariables: Vec<Metavariable>,
    block_level: u32,
    journal: Journal,
}

impl Solver {
    pub fn new() -> Solver {
        Solver {
            nodes: NodeTable::new(),
            edges: EdgeSet::new(),
            queue: WorkQueue::new(),
            metavariables: Vec::new(),
            block_level: 0,
            journal: Journal::new(),
        }
    }

    pub fn block_level(&self) -> u32 {
        self.block_level
    }

    pub fn enter_block(&mut self) {
        self.journal.record(UndoEntry::BlockLevel(self.block_level));
        self.block_level += 1;
    }

    pub fn exit_block(&mut self) {
        self.journal.record(UndoEntry::BlockLevel(self.block_level));
        self.block_level -= 1;
    }

    pub fn metavariable(&self, id: MetaVarId) -> &Metavariable {
        &self.metavariables[id.0 as usize]
    }

    /// Allocates a fresh metavariable: two nodes (`value`, `usage`)
    /// joined by nothing but their shared id, at the current block level
    /// (§3.4).
    pub fn fresh_metavariable(&mut self, is_trait: bool) -> MetaVarId {
        let id = MetaVarId(self.metavariables.len() as u32);
        let value = self.nodes.alloc_meta_value(id);
        let usage = self.nodes.alloc_meta_usage(id);
        self.journal.record(UndoEntry::Nodes(value.0 as usize));
        let meta = Metavariable {
            id,
            value,
            usage,
            is_trait,
            block_level: self.block_level,
        };
        self.metavariables.push(meta);
        self.journal.record(UndoEntry::Metavariables(id.0 as usize));
        id
    }

    /// Resolves a value used as the *source* of an obligation to a node
    /// id, interning it into the node table if it is concrete.
    pub fn node_for_value(&mut self, value: &Flex) -> NodeId {
        if let crate::value::Flex::Stuck(s) = value {
            if let crate::value::stuck::Stuck::Meta(id) = s.as_ref() {
                return self.metavariable(*id).value;
            }
        }
        let (node, is_new) = self.nodes.intern_concrete(value.clone());
        if is_new {
            self.journal.record(UndoEntry::Nodes(node.0 as usize + 1));
        }
        node
    }

    /// Resolves a value used as the *target* of an obligation (its
    /// "usage" position) to a node id.
    pub fn node_for_usage(&mut self, value: &Flex) -> NodeId {
        if let crate::value::Flex::Stuck(s) = value {
            if let crate::value::stuck::Stuck::Meta(id) = s.as_ref() {
                return self.metavariable(*id).usage;
            }
        }
        let (node, is_new) = self.nodes.intern_concrete(value.clone());
        if is_new {
            self.journal.record(UndoEntry::Nodes(node.0 as usize + 1));
        }
        node
    }

    pub fn kind_of(&self, node: NodeId) -> &NodeKind {
        self.nodes.kind(node)
    }

    pub(crate) fn record_constrain_insert(&mut self) {
        self.journal
            .record(UndoEntry::ConstrainEdges(self.edges.constrain_len().saturating_sub(1)));
    }

    pub(crate) fn record_left_call_insert(&mut self) {
        self.journal
            .record(UndoEntry::LeftCallEdges(self.edges.left_call_len().saturating_sub(1)));
    }

    pub(crate) fn record_right_call_insert(&mut self) {
        self.journal
            .record(UndoEntry::RightCallEdges(self.edges.right_call_len().saturating_sub(1)));
    }

    /// Runs `f` as a speculative branch: on `Ok`, the journal keeps
    /// growing so an enclosing speculation can still unwind through this
    /// work; on `Err`, every mutation `f` made is undone before the
    /// error propagates (§4.H).
    pub fn speculate<T, E>(&mut self, f: impl FnOnce(&mut Solver) -> Result<T, E>) -> Result<T, E> {
        let mark = self.journal.mark();
        log::trace!(target: "biunify::solver", "speculate: enter at log position {}", mark);
        let result = f(self);
        match &result {
            Ok(_) => {
                log::trace!(target: "biunify::solver", "speculate: commit at {}", mark);
                self.journal.close();
            }
            Err(_) => {
                log::debug!(target: "biunify::solver", "speculate: revert to {}", mark);
                self.revert_to(mark);
            }
        }
        result
    }

    /// Lower-level snapshot API mirroring `chalk`'s `InferenceTable`:
    /// `snapshot` records the current log position, `commit_snapshot`
    /// just closes it (the log keeps growing for any enclosing
    /// snapshot), and `revert_snapshot` undoes everything recorded since
    /// it. Prefer [`Solver::speculate`] when the computation in between
    /// is a plain `Result`-returning closure; this trio exists for
    /// callers (like [`crate::state::TypecheckerState::speculate`]) that
    /// need to interleave solver snapshotting with other state.
    pub fn snapshot(&mut self) -> usize {
        let mark = self.journal.mark();
        log::trace!(target: "biunify::solver", "snapshot at log position {}", mark);
        mark
    }

    pub fn commit_snapshot(&mut self, _mark: usize) {
        log::trace!(target: "biunify::solver", "commit snapshot");
        self.journal.close();
    }

    pub fn revert_snapshot(&mut self, mark: usize) {
        log::debug!(target: "biunify::solver", "revert snapshot to {}", mark);
        self.revert_to(mark);
    }

    fn revert_to(&mut self, mark: usize) {
        let entries: Vec<UndoEntry> = self.journal.entries_since(mark).collect();
        for entry in entries {
            match entry {
                UndoEntry::Nodes(len) => self.nodes.truncate(len),
                UndoEntry::ConstrainEdges(len) => self.edges.truncate_constrain(len),
                UndoEntry::LeftCallEdges(len) => self.edges.truncate_left_call(len),
                UndoEntry::RightCallEdges(len) => self.edges.truncate_right_call(len),
                UndoEntry::Metavariables(len) => self.metavariables.truncate(len),
                UndoEntry::BlockLevel(level) => self.block_level = level,
            }
        }
        self.journal.truncate(mark);
    }
}

impl Default for Solver {
    fn default() -> Solver {
        Solver::new()
    }
}
