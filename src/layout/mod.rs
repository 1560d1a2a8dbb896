//! Layout module orchestrator.
//!
//! Downstream code imports layout types from here while the solver lives in
//! the private `core` module.

mod core;

pub use core::{Constraint, Direction, LayoutNode, LayoutTree, NodeId};
