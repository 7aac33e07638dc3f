//! Static resolution of variable references
//!
//! The resolver walks a program once before it runs and fills a
//! [`Resolution`]: for every local variable reference, how many scopes out
//! the binding lives and which slot holds it; for every block and function,
//! how many slots its frame needs. References with no entry are globals.

pub mod resolver;

use rustc_hash::FxHashMap;

use crate::common::NodeId;

pub use resolver::{ResolveError, ResolveErrors, Resolver, ResolverOptions, resolve};

/// Where a resolved local lives relative to the scope that references it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalSlot {
    /// Number of enclosing links to follow; 0 is the current scope
    pub distance: usize,
    /// Index into that scope's frame
    pub slot: usize,
}

/// Side tables consumed by the interpreter, keyed by node identity
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    locals: FxHashMap<NodeId, LocalSlot>,
    frame_sizes: FxHashMap<NodeId, usize>,
    declarations: FxHashMap<NodeId, usize>,
}

impl Resolution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a variable or assignment expression as a local
    pub fn resolve_local(&mut self, expr: NodeId, distance: usize, slot: usize) {
        self.locals.insert(expr, LocalSlot { distance, slot });
    }

    /// Record the slot count of the frame a block or function creates
    pub fn resolve_frame(&mut self, stmt: NodeId, size: usize) {
        self.frame_sizes.insert(stmt, size);
    }

    /// Record the slot a `var` or `fun` declaration defines into
    pub fn resolve_declaration(&mut self, stmt: NodeId, slot: usize) {
        self.declarations.insert(stmt, slot);
    }

    pub fn local(&self, expr: NodeId) -> Option<LocalSlot> {
        self.locals.get(&expr).copied()
    }

    pub fn frame_size(&self, stmt: NodeId) -> Option<usize> {
        self.frame_sizes.get(&stmt).copied()
    }

    pub fn declaration_slot(&self, stmt: NodeId) -> Option<usize> {
        self.declarations.get(&stmt).copied()
    }

    /// Merge tables computed for another program run by the same interpreter
    pub fn extend(&mut self, other: Resolution) {
        self.locals.extend(other.locals);
        self.frame_sizes.extend(other.frame_sizes);
        self.declarations.extend(other.declarations);
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty() && self.frame_sizes.is_empty() && self.declarations.is_empty()
    }

    /// Resolved locals ordered by node id
    pub fn locals(&self) -> Vec<(NodeId, LocalSlot)> {
        let mut entries: Vec<_> = self.locals.iter().map(|(id, at)| (*id, *at)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// Frame sizes ordered by node id
    pub fn frame_sizes(&self) -> Vec<(NodeId, usize)> {
        sorted(&self.frame_sizes)
    }

    /// Declaration slots ordered by node id
    pub fn declarations(&self) -> Vec<(NodeId, usize)> {
        sorted(&self.declarations)
    }
}

fn sorted(table: &FxHashMap<NodeId, usize>) -> Vec<(NodeId, usize)> {
    let mut entries: Vec<_> = table.iter().map(|(id, n)| (*id, *n)).collect();
    entries.sort_by_key(|(id, _)| *id);
    entries
}
