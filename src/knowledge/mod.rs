mod build;
mod classify;
mod distance;
mod filter;
mod load;
mod model;

pub use filter::{FilterOptions, FilterPredicates, FilteredGraph, FilteredNode, filter};
pub use load::{SnapshotSource, collect_snapshot};
pub use model::{EdgeKind, GraphSnapshot, Node, NodeKind, Status};

#[cfg(test)]
pub use model::{AreaRef, ContentData, JournalData};
