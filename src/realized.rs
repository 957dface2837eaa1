//! The realized tree: what was mounted, paired with the host handles it owns.

use crate::{
	component::{Component, FunctionalSession, StatefulSession},
	data::Data,
	node::{Children, Key, Kind, PortalTarget},
};
use std::borrow::Cow;

/// A mounted node.
///
/// `handle` is the node's own host node for elements and text. For fragments and portals it's the anchor:
/// the first child's handle or a placeholder text node, and never absent.
/// Components use their rendered root's handle.
#[derive(Debug)]
pub struct Realized<N> {
	pub(crate) key: Option<Key>,
	pub(crate) handle: N,
	pub(crate) kind: RealizedKind<N>,
}

#[derive(Debug)]
pub(crate) enum RealizedKind<N> {
	Element {
		tag: Cow<'static, str>,
		/// The element's own SVG flag.
		svg: bool,
		/// Whether the element was created in the SVG namespace, by flag or by context.
		in_svg: bool,
		data: Data,
		children: Children<Realized<N>>,
	},
	Text(Cow<'static, str>),
	Fragment(Children<Realized<N>>),
	Portal {
		target: PortalTarget<N>,
		destination: N,
		children: Children<Realized<N>>,
	},
	Stateful(StatefulSession<N>),
	Functional(FunctionalSession<N>),
}

impl<N: 'static> Realized<N> {
	/// The host handle (or anchor) of this node.
	pub fn handle(&self) -> &N {
		&self.handle
	}

	pub fn key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	pub fn kind(&self) -> Kind {
		match self.kind {
			RealizedKind::Element { .. } => Kind::Element,
			RealizedKind::Text(_) => Kind::Text,
			RealizedKind::Fragment(_) => Kind::Fragment,
			RealizedKind::Portal { .. } => Kind::Portal,
			RealizedKind::Stateful(_) => Kind::Stateful,
			RealizedKind::Functional(_) => Kind::Functional,
		}
	}

	/// Children of an element, fragment or portal.
	pub fn children(&self) -> Option<&Children<Realized<N>>> {
		match &self.kind {
			RealizedKind::Element { children, .. } | RealizedKind::Fragment(children) | RealizedKind::Portal { children, .. } => Some(children),
			RealizedKind::Text(_) | RealizedKind::Stateful(_) | RealizedKind::Functional(_) => None,
		}
	}

	/// The tree a component rendered.
	pub fn rendered(&self) -> Option<&Realized<N>> {
		match &self.kind {
			RealizedKind::Stateful(session) => Some(session.rendered()),
			RealizedKind::Functional(session) => Some(session.rendered()),
			_ => None,
		}
	}

	/// The props a component node was last rendered with.
	pub fn props(&self) -> Option<&Data> {
		match &self.kind {
			RealizedKind::Stateful(session) => Some(session.props()),
			RealizedKind::Functional(session) => Some(session.props()),
			_ => None,
		}
	}

	/// The instance of a stateful component node, if it's a `C`.
	pub fn instance<C: Component<N>>(&self) -> Option<&C> {
		match &self.kind {
			RealizedKind::Stateful(session) => session.instance().as_any().downcast_ref(),
			_ => None,
		}
	}

	/// Where a portal's content currently lives.
	pub fn destination(&self) -> Option<&N> {
		match &self.kind {
			RealizedKind::Portal { destination, .. } => Some(destination),
			_ => None,
		}
	}

	/// The last host node this node occupies in its container.
	pub(crate) fn last_handle(&self) -> &N {
		match &self.kind {
			RealizedKind::Fragment(children) => children.iter().next_back().map_or(&self.handle, Realized::last_handle),
			RealizedKind::Stateful(session) => session.rendered().last_handle(),
			RealizedKind::Functional(session) => session.rendered().last_handle(),
			RealizedKind::Element { .. } | RealizedKind::Text(_) | RealizedKind::Portal { .. } => &self.handle,
		}
	}

	/// Recomputes the anchor after children or a rendered tree changed.
	pub(crate) fn refresh_anchor(&mut self)
	where
		N: Clone,
	{
		match &self.kind {
			RealizedKind::Stateful(session) => self.handle = session.rendered().handle.clone(),
			RealizedKind::Functional(session) => self.handle = session.rendered().handle.clone(),
			RealizedKind::Fragment(children) => {
				if let Some(first) = children.iter().next() {
					self.handle = first.handle.clone()
				}
			}
			RealizedKind::Element { .. } | RealizedKind::Text(_) | RealizedKind::Portal { .. } => (),
		}
	}
}

impl<N: Clone + 'static> Realized<N> {
	/// All host nodes this node occupies directly in its container, in order.
	pub fn host_nodes(&self) -> Vec<N> {
		let mut nodes = Vec::new();
		self.collect_host_nodes(&mut nodes);
		nodes
	}

	fn collect_host_nodes(&self, nodes: &mut Vec<N>) {
		match &self.kind {
			RealizedKind::Fragment(children) if !children.is_empty() => {
				for child in children.iter() {
					child.collect_host_nodes(nodes)
				}
			}
			RealizedKind::Stateful(session) => session.rendered().collect_host_nodes(nodes),
			RealizedKind::Functional(session) => session.rendered().collect_host_nodes(nodes),
			_ => nodes.push(self.handle.clone()),
		}
	}
}
