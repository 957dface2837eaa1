use crate::{data::Value, node::PortalTarget};
use core::fmt::Debug;

/// A render target's primitive operations.
///
/// # Move semantics
///
/// [`Host::append_child`] and [`Host::insert_before`] **must** relocate a `child` that is already attached somewhere,
/// rather than duplicating it or failing. Reordering and portal relocation rely on this.
pub trait Host {
	/// Owning reference to a live node. Cloning must not duplicate the node.
	type Handle: Clone + PartialEq + Debug + 'static;
	type Error: std::error::Error + 'static;

	/// Creates a detached element, in `namespace` if given.
	fn create_element(&mut self, tag: &str, namespace: Option<&'static str>) -> Result<Self::Handle, Self::Error>;

	/// Creates a detached text node.
	fn create_text(&mut self, content: &str) -> Result<Self::Handle, Self::Error>;

	fn set_text(&mut self, text: &Self::Handle, content: &str) -> Result<(), Self::Error>;

	/// Transitions `key` on `element` from `previous` to `next`.
	///
	/// `previous == None` is a first application and `next == None` removes the key.
	/// Composite `class` and `style` values and `on…` listener keys must be handled here,
	/// for example by forwarding to [`apply_data`](`crate::data::apply_data`).
	fn set_data(&mut self, element: &Self::Handle, key: &str, previous: Option<&Value>, next: Option<&Value>, svg: bool) -> Result<(), Self::Error>;

	fn append_child(&mut self, container: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error>;
	fn insert_before(&mut self, container: &Self::Handle, child: &Self::Handle, reference: &Self::Handle) -> Result<(), Self::Error>;
	fn remove_child(&mut self, container: &Self::Handle, child: &Self::Handle) -> Result<(), Self::Error>;

	fn parent_node(&self, node: &Self::Handle) -> Option<Self::Handle>;
	fn next_sibling(&self, node: &Self::Handle) -> Option<Self::Handle>;

	/// Finds the container a portal renders into.
	fn resolve_target(&mut self, target: &PortalTarget<Self::Handle>) -> Result<Self::Handle, Self::Error>;
}
