#![forbid(unsafe_code)]

//! Declarative architecture topologies compiled to Graphviz DOT.
//!
//! An [`Architecture`] session holds instances (processes), hosts (execution environments),
//! groups (visual boundaries) and the links between instances. A [`System`] selects links out
//! of a session, pulls in the outermost containers of their endpoints, and renders the result:
//!
//! ```
//! use archix_core::Architecture;
//!
//! let mut arch = Architecture::new();
//! let api = arch.instance("api").id();
//! let registry = arch.instance("registry").id();
//! let host = arch.host().id();
//! arch.instance_mut(api).on(host);
//! let link = arch.to(api, registry).configuration().id();
//!
//! let dot = arch.system("discovery").is([link]).render();
//! assert!(dot.starts_with("digraph {"));
//! assert!(dot.contains("instance_100 -> instance_101 [ style = dashed"));
//! ```
//!
//! Design goals:
//! - deterministic output (ids come from one per-session counter)
//! - no I/O: turning DOT into images is left to the caller

mod architecture;
mod containment;
pub mod id;
mod link;
pub mod model;
pub mod render;
mod system;
pub mod theme;

pub use architecture::{Architecture, GroupMut, HostMut, InstanceMut};
pub use id::{ElementId, IdAllocator};
pub use link::LinkMut;
pub use model::{
    ChainId, Group, GroupId, Host, HostId, Instance, InstanceId, Link, LinkId, NodeRef,
};
pub use render::{ArrowDirection, CanonicalEdge, LineStyle};
pub use system::System;
pub use theme::{Palette, Theme};
