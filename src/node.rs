//! Node descriptions: the immutable input of a reconciliation pass.

use crate::{
	component::{AnyComponent, Component},
	data::{Data, Value},
};
use core::{
	any::{type_name, TypeId},
	fmt::{self, Debug, Display, Formatter},
};
use std::borrow::Cow;

/// SVG namespace.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Identity of a node among its keyed siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
	Str(Cow<'static, str>),
	Int(i64),
	/// Assigned by [`Children::from_nodes`] to unkeyed entries of a multi-child sequence.
	Implicit(usize),
}
impl Display for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Str(key) => write!(f, "{:?}", key),
			Key::Int(key) => write!(f, "{}", key),
			Key::Implicit(index) => write!(f, "|{}", index),
		}
	}
}
impl From<&'static str> for Key {
	fn from(key: &'static str) -> Self {
		Key::Str(Cow::Borrowed(key))
	}
}
impl From<String> for Key {
	fn from(key: String) -> Self {
		Key::Str(Cow::Owned(key))
	}
}
impl From<i64> for Key {
	fn from(key: i64) -> Self {
		Key::Int(key)
	}
}

/// Children of a node, classified by arity.
///
/// The variant *is* the classification, so it can't change for the lifetime of a description.
/// [`Children::Multiple`] always holds at least one entry, and each entry is keyed.
#[derive(Debug, Clone)]
pub enum Children<T> {
	None,
	Single(Box<T>),
	Multiple(Vec<T>),
}
impl<T> Default for Children<T> {
	fn default() -> Self {
		Children::None
	}
}
impl<T> Children<T> {
	#[must_use]
	pub fn arity(&self) -> Arity {
		match self {
			Children::None => Arity::None,
			Children::Single(_) => Arity::Single,
			Children::Multiple(_) => Arity::Multiple,
		}
	}

	#[must_use]
	pub fn len(&self) -> usize {
		match self {
			Children::None => 0,
			Children::Single(_) => 1,
			Children::Multiple(children) => children.len(),
		}
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		matches!(self, Children::None)
	}

	pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
		let (single, multiple): (Option<&T>, &[T]) = match self {
			Children::None => (None, Default::default()),
			Children::Single(child) => (Some(&**child), Default::default()),
			Children::Multiple(children) => (None, children.as_slice()),
		};
		single.into_iter().chain(multiple)
	}

	pub fn iter_mut(&mut self) -> impl DoubleEndedIterator<Item = &mut T> {
		let (single, multiple): (Option<&mut T>, &mut [T]) = match self {
			Children::None => (None, Default::default()),
			Children::Single(child) => (Some(&mut **child), Default::default()),
			Children::Multiple(children) => (None, children.as_mut_slice()),
		};
		single.into_iter().chain(multiple)
	}
}
impl<N> Children<Node<N>> {
	/// Classifies a child sequence.
	///
	/// An empty sequence is [`Children::None`] and a single entry is [`Children::Single`].
	/// Longer sequences become [`Children::Multiple`], with [`Key::Implicit`] positional keys for unkeyed entries.
	#[must_use]
	pub fn from_nodes(mut nodes: Vec<Node<N>>) -> Self {
		match nodes.len() {
			0 => Children::None,
			1 => Children::Single(Box::new(nodes.remove(0))),
			_ => {
				for (i, node) in nodes.iter_mut().enumerate() {
					if node.key.is_none() {
						node.key = Some(Key::Implicit(i));
					}
				}
				Children::Multiple(nodes)
			}
		}
	}
}

/// Children arity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
	None,
	Single,
	Multiple,
}

/// Where a portal places its content.
#[derive(Debug, Clone, PartialEq)]
pub enum PortalTarget<N> {
	/// Resolved through [`Host::resolve_target`](`crate::Host::resolve_target`).
	Selector(Cow<'static, str>),
	Handle(N),
}

/// Identity and constructor of a stateful component type.
pub struct StatefulType<N> {
	id: TypeId,
	name: &'static str,
	create: fn() -> Box<dyn AnyComponent<N>>,
}
impl<N: 'static> StatefulType<N> {
	#[must_use]
	pub fn of<C: Component<N> + Default>() -> Self {
		fn create<N: 'static, C: Component<N> + Default>() -> Box<dyn AnyComponent<N>> {
			Box::new(C::default())
		}

		Self {
			id: TypeId::of::<C>(),
			name: type_name::<C>(),
			create: create::<N, C>,
		}
	}
}
impl<N> StatefulType<N> {
	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn instantiate(&self) -> Box<dyn AnyComponent<N>> {
		(self.create)()
	}
}
impl<N> Clone for StatefulType<N> {
	fn clone(&self) -> Self {
		Self {
			id: self.id,
			name: self.name,
			create: self.create,
		}
	}
}
impl<N> PartialEq for StatefulType<N> {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}
impl<N> Debug for StatefulType<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("StatefulType").field(&self.name).finish()
	}
}

/// A functional component: a plain function from props to a description.
pub struct FunctionalType<N> {
	name: &'static str,
	render: fn(&Data) -> Node<N>,
}
impl<N> FunctionalType<N> {
	#[must_use]
	pub fn new(name: &'static str, render: fn(&Data) -> Node<N>) -> Self {
		Self { name, render }
	}

	#[must_use]
	pub fn name(&self) -> &'static str {
		self.name
	}

	pub(crate) fn call(&self, props: &Data) -> Node<N> {
		(self.render)(props)
	}
}
impl<N> Clone for FunctionalType<N> {
	fn clone(&self) -> Self {
		Self {
			name: self.name,
			render: self.render,
		}
	}
}
impl<N> PartialEq for FunctionalType<N> {
	fn eq(&self, other: &Self) -> bool {
		self.render as usize == other.render as usize
	}
}
impl<N> Debug for FunctionalType<N> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("FunctionalType").field(&self.name).finish()
	}
}

/// A host element.
#[derive(Debug, Clone)]
pub struct Element<N> {
	pub tag: Cow<'static, str>,
	/// Creates this element (and its descendants) in the SVG namespace.
	pub svg: bool,
	pub data: Data,
	pub children: Children<Node<N>>,
}

/// The kind of a [`Node`], with its kind-specific payload.
#[derive(Debug, Clone)]
pub enum NodeKind<N> {
	Element(Element<N>),
	Text(Cow<'static, str>),
	/// Children without a host element of their own.
	Fragment(Children<Node<N>>),
	/// Children placed into a different host container than the portal's logical position.
	Portal { target: PortalTarget<N>, children: Children<Node<N>> },
	Stateful { component: StatefulType<N>, props: Data },
	Functional { component: FunctionalType<N>, props: Data },
}

/// Discriminant of [`NodeKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
	Element,
	Text,
	Fragment,
	Portal,
	Stateful,
	Functional,
}

/// Description of one renderable unit for a single render pass.
#[derive(Debug, Clone)]
pub struct Node<N> {
	/// Only meaningful among [`Children::Multiple`] siblings, where it must be unique.
	pub key: Option<Key>,
	pub kind: NodeKind<N>,
}

impl<N> Node<N> {
	#[must_use]
	pub fn new(kind: NodeKind<N>) -> Self {
		Self { key: None, kind }
	}

	pub fn element(tag: impl Into<Cow<'static, str>>) -> Self {
		Self::new(NodeKind::Element(Element {
			tag: tag.into(),
			svg: false,
			data: Data::new(),
			children: Children::None,
		}))
	}

	/// An element in the SVG namespace, stamped with the namespace declarations.
	pub fn svg(tag: impl Into<Cow<'static, str>>) -> Self {
		let mut node = Self::element(tag);
		if let NodeKind::Element(element) = &mut node.kind {
			element.svg = true;
		}
		node
	}

	pub fn text(text: impl Into<Cow<'static, str>>) -> Self {
		Self::new(NodeKind::Text(text.into()))
	}

	#[must_use]
	pub fn fragment(children: Vec<Node<N>>) -> Self {
		Self::new(NodeKind::Fragment(Children::from_nodes(children)))
	}

	#[must_use]
	pub fn portal(target: PortalTarget<N>, children: Vec<Node<N>>) -> Self {
		Self::new(NodeKind::Portal {
			target,
			children: Children::from_nodes(children),
		})
	}

	#[must_use]
	pub fn functional(name: &'static str, render: fn(&Data) -> Node<N>) -> Self {
		Self::new(NodeKind::Functional {
			component: FunctionalType::new(name, render),
			props: Data::new(),
		})
	}

	#[must_use]
	pub fn with_key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	/// Replaces the element data or component props. No effect on other kinds.
	#[must_use]
	pub fn with_data(mut self, data: Data) -> Self {
		if let Some(slot) = self.data_mut() {
			*slot = data;
		}
		self
	}

	/// Sets a single element data entry or component prop. No effect on other kinds.
	#[must_use]
	pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		if let Some(data) = self.data_mut() {
			data.insert(key.into(), value.into());
		}
		self
	}

	/// Replaces the children of an element, fragment or portal. No effect on other kinds.
	#[must_use]
	pub fn with_children(mut self, children: Vec<Node<N>>) -> Self {
		match &mut self.kind {
			NodeKind::Element(Element { children: slot, .. }) | NodeKind::Fragment(slot) | NodeKind::Portal { children: slot, .. } => *slot = Children::from_nodes(children),
			NodeKind::Text(_) | NodeKind::Stateful { .. } | NodeKind::Functional { .. } => (),
		}
		self
	}

	#[must_use]
	pub fn kind(&self) -> Kind {
		match self.kind {
			NodeKind::Element(_) => Kind::Element,
			NodeKind::Text(_) => Kind::Text,
			NodeKind::Fragment(_) => Kind::Fragment,
			NodeKind::Portal { .. } => Kind::Portal,
			NodeKind::Stateful { .. } => Kind::Stateful,
			NodeKind::Functional { .. } => Kind::Functional,
		}
	}

	fn data_mut(&mut self) -> Option<&mut Data> {
		match &mut self.kind {
			NodeKind::Element(Element { data, .. }) | NodeKind::Stateful { props: data, .. } | NodeKind::Functional { props: data, .. } => Some(data),
			NodeKind::Text(_) | NodeKind::Fragment(_) | NodeKind::Portal { .. } => None,
		}
	}
}

impl<N: 'static> Node<N> {
	/// A stateful component of type `C`, instantiated through [`Default`] when mounted.
	#[must_use]
	pub fn stateful<C: Component<N> + Default>() -> Self {
		Self::new(NodeKind::Stateful {
			component: StatefulType::of::<C>(),
			props: Data::new(),
		})
	}
}
