//! Shared identifiers

use serde::{Deserialize, Serialize};

/// Identity of an AST node, used as the key of every resolver table.
///
/// Ids are not part of the serialized program; they are assigned after
/// loading (see [`crate::ast::assign_ids`]) or by the [`crate::ast::Builder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Placeholder id carried by nodes that have not been numbered yet
    pub const fn dummy() -> Self {
        NodeId(0)
    }

    pub fn is_dummy(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out fresh node ids, starting after the dummy id.
///
/// One generator should number every program that runs through the same
/// interpreter, so ids stay unique across incrementally loaded programs.
#[derive(Debug, Clone)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}

impl Default for NodeIdGen {
    fn default() -> Self {
        Self::new()
    }
}
