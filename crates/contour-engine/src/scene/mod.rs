//! Frame traversal of geometry nodes.
//!
//! Responsibilities:
//! - skip blocked subtrees
//! - preprocess every participating node before any draw data is read
//! - batch adjacent draws whose materials compare equal, in paint order

mod frame;

pub use frame::{DrawBatch, FramePass, FrameStats, NodeRef};
