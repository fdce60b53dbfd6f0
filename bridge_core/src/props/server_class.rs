// bridge_core/src/props/server_class.rs
use crate::props::registry::TableId;

/// Links a networked class name to its send table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerClass {
    pub(crate) name: String,
    pub(crate) table: TableId,
    pub(crate) class_index: usize,
    /// The class registered just before this one. The engine keeps its
    /// classes as a singly linked list with the newest at the head.
    pub(crate) next: Option<usize>,
}

impl ServerClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> TableId {
        self.table
    }

    pub fn class_index(&self) -> usize {
        self.class_index
    }

    pub fn next(&self) -> Option<usize> {
        self.next
    }
}
