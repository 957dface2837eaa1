use crate::{
	component::{self, Component},
	diff,
	error::Error,
	host::Host,
	node::Node,
	realized::Realized,
};
use core::fmt::Debug;
use tracing::{error, instrument, trace};

/// A host container together with the tree last rendered into it.
///
/// The recorded tree is the only state kept between render passes.
/// It's written only by [`Target::render`] (and updated in place by [`Target::update_component`]).
///
/// # Correct Use
///
/// Don't modify the container's content through the host while a tree is recorded,
/// except through nodes the tree doesn't own. If a pass fails part-way, the recorded tree may no longer
/// match the host nodes. This is logged but not repaired.
#[derive(Debug)]
pub struct Target<N> {
	container: N,
	tree: Option<Realized<N>>,
}

impl<N: Clone + PartialEq + Debug + 'static> Target<N> {
	#[must_use]
	pub fn new(container: N) -> Self {
		Self { container, tree: None }
	}

	pub fn container(&self) -> &N {
		&self.container
	}

	/// The tree committed by the last render pass.
	pub fn tree(&self) -> Option<&Realized<N>> {
		self.tree.as_ref()
	}

	pub fn is_mounted(&self) -> bool {
		self.tree.is_some()
	}

	/// Makes the container reflect `node`.
	///
	/// Mounts if nothing was rendered yet, patches the recorded tree otherwise, and removes it if `node` is [`None`].
	///
	/// # Errors
	///
	/// Host failures and failing lifecycle hooks abort the pass and are returned.
	#[instrument(skip(self, host, node), fields(container = ?self.container))]
	pub fn render<H: Host<Handle = N>>(&mut self, host: &mut H, node: Option<Node<N>>) -> Result<(), Error<H::Error>> {
		let result = match node {
			Some(node) => match self.tree.as_mut() {
				Some(tree) => diff::patch(host, tree, node, &self.container, false),
				None => diff::mount(host, node, &self.container, false, None).map(|tree| self.tree = Some(tree)),
			},
			None => match self.tree.take() {
				Some(mut tree) => diff::unmount(host, &mut tree, Some(&self.container)),
				None => {
					trace!("Nothing to remove.");
					Ok(())
				}
			},
		};

		if let Err(error) = &result {
			error!("Render pass failed: {}", error);
		}
		result
	}

	/// Mutates the first mounted instance of `C` (depth-first) and re-renders it synchronously.
	///
	/// Returns whether an instance was found.
	///
	/// # Errors
	///
	/// As for [`Target::render`].
	#[instrument(skip(self, host, update), fields(component = core::any::type_name::<C>()))]
	pub fn update_component<H, C>(&mut self, host: &mut H, update: impl FnOnce(&mut C)) -> Result<bool, Error<H::Error>>
	where
		H: Host<Handle = N>,
		C: Component<N>,
	{
		let tree = match self.tree.as_mut() {
			Some(tree) => tree,
			None => return Ok(false),
		};
		let result = component::update_first::<H, C, _>(host, tree, &mut Some(update));
		if let Err(error) = &result {
			error!("Component update failed: {}", error);
		}
		result
	}
}
