#![doc(html_root_url = "https://docs.rs/xylem/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A host-agnostic virtual tree reconciler.
//!
//! Describe a tree with [`Node`], then let a [`Target`] mount it into a [`Host`] container and patch it with
//! minimal host mutations on each later render pass. Children are diffed by key, components keep their
//! instances across passes, and portals place content into other containers.
//!
//! [`MemoryHost`](`memory::MemoryHost`) is a complete in-memory host.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod component;
pub mod data;
mod diff;
pub mod error;
pub mod host;
pub mod load;
pub mod memory;
pub mod node;
pub mod rc_hash_map;
pub mod realized;
mod target;

pub use component::Component;
pub use data::{Callback, Data, Value};
pub use error::{BoxError, Error};
pub use host::Host;
pub use node::{Children, Key, Kind, Node, NodeKind, PortalTarget};
pub use realized::Realized;
pub use target::Target;
