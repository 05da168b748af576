#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shortest-path machinery that routes creeps toward the exits.
//!
//! The crate holds two pieces: a binary min-heap that supports lowering the
//! cost of a queued element, and a multi-root Dijkstra computation that grows
//! a shortest-path tree from every exit cell across an eight-connected grid.
//! The world builds a fresh tree after each structural change, runs it to
//! completion, and promotes its costs and directions into the grid when the
//! tree proves that every populated and entrance cell can still leave.

mod priority_queue;
mod spt;

pub use priority_queue::{PriorityQueue, QueueError};
pub use spt::{ShortestPathTree, SptError, SptState, TreeState};
