//! A minimal declarative-UI runtime.
//!
//! Applications describe a desired tree of elements, text, and deferred
//! ("lazy") subtrees in a [`VTree`]; [`diff`](diff::diff) computes the
//! minimal positionally-consistent edit script between two such trees,
//! and [`apply`](apply::apply) replays it against a live concrete tree
//! behind the [`HostBackend`] trait. [`map`](map::map) rewrites event
//! handler chains across a subtree for component-style reuse, and a
//! [`RenderSession`] routes delegated host input events back into the
//! application's update callback.
//!
//! Everything is single-threaded and synchronous: patches apply strictly
//! in emission order, and one diff+apply cycle owns its container
//! exclusively.

pub mod apply;
pub mod backend;
pub mod diff;
pub mod error;
pub mod map;
pub mod memory;
pub mod patch;
pub mod session;
pub mod vnode;

pub use backend::{EventKind, HostBackend};
pub use error::TreeError;
pub use memory::{HostId, MemoryHost};
pub use patch::{AttrDiff, Patch};
pub use session::RenderSession;
pub use vnode::{Attribute, EventDescriptor, Handler, NodeId, RenderFn, VNode, VTree, Value};
