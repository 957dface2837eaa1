//! An in-memory [`Host`], for tests and for embedders that render to something other than a DOM.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Every mutation is recorded in a journal,
//! which makes it easy to assert exactly which host operations a render pass caused.

use crate::{
	data::{apply_data, Callback, DataSink, Value},
	host::Host,
	node::PortalTarget,
	rc_hash_map::{CountSaturatedError, RcHashMap},
};
use core::any::Any;
use hashbrown::HashMap;
use thiserror::Error;
use tracing::{info, trace, warn};

/// Handle of a [`MemoryHost`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Error)]
pub enum MemoryError {
	#[error("no element matches selector {0:?}")]
	SelectorNotFound(String),
	#[error("{child:?} is not a child of {parent:?}")]
	NotAChild { parent: NodeId, child: NodeId },
	#[error("{0:?} is not an element")]
	NotAnElement(NodeId),
	#[error("{0:?} is not a text node")]
	NotAText(NodeId),
	#[error("unknown node {0:?}")]
	UnknownNode(NodeId),
	#[error("listener bookkeeping for `{0}` over- or underflowed")]
	ListenerCount(String),
}

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String },
	CreateText { node: NodeId, text: String },
	SetText { node: NodeId, text: String },
	SetAttribute {
		node: NodeId,
		namespace: Option<&'static str>,
		name: String,
		value: String,
	},
	RemoveAttribute {
		node: NodeId,
		namespace: Option<&'static str>,
		name: String,
	},
	SetProperty { node: NodeId, name: String },
	SetStyle { node: NodeId, name: String, value: Option<String> },
	AddListener { node: NodeId, event: String },
	RemoveListener { node: NodeId, event: String },
	/// A detached node was attached.
	Insert { parent: NodeId, node: NodeId },
	/// An attached node was relocated.
	Move { parent: NodeId, node: NodeId },
	Remove { parent: NodeId, node: NodeId },
}

impl Mutation {
	/// Whether this mutation attached, relocated or detached a node.
	#[must_use]
	pub fn is_structural(&self) -> bool {
		matches!(self, Mutation::Insert { .. } | Mutation::Move { .. } | Mutation::Remove { .. })
	}
}

#[derive(Debug, Default)]
struct ElementState {
	tag: String,
	namespace: Option<&'static str>,
	attributes: HashMap<String, String>,
	/// Namespaces of the namespaced entries in `attributes`.
	attribute_namespaces: HashMap<String, &'static str>,
	properties: HashMap<String, Value>,
	styles: HashMap<String, String>,
	listeners: HashMap<String, Callback>,
}

#[derive(Debug)]
enum Content {
	Element(ElementState),
	Text(String),
}

#[derive(Debug)]
struct Slot {
	content: Content,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

/// An arena-backed [`Host`].
#[derive(Debug, Default)]
pub struct MemoryHost {
	nodes: Vec<Slot>,
	journal: Vec<Mutation>,
	handlers: RcHashMap<Callback, u16, ()>,
}

impl MemoryHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element to render into. Not journaled.
	pub fn create_root(&mut self, tag: &str) -> NodeId {
		self.push(Content::Element(ElementState {
			tag: tag.to_owned(),
			..ElementState::default()
		}))
	}

	/// Creates a detached element with an `id` attribute, which portals can target as `#id`. Not journaled.
	pub fn create_root_with_id(&mut self, tag: &str, id: &str) -> NodeId {
		let root = self.create_root(tag);
		if let Some(element) = self.element_mut(root) {
			element.attributes.insert("id".to_owned(), id.to_owned());
		}
		root
	}

	/// Returns and clears the mutation journal.
	pub fn take_journal(&mut self) -> Vec<Mutation> {
		core::mem::take(&mut self.journal)
	}

	#[must_use]
	pub fn journal(&self) -> &[Mutation] {
		&self.journal
	}

	/// Child nodes of `node`, in order.
	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		self.slot(node).map_or(&[][..], |slot| slot.children.as_slice())
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.slot(node).and_then(|slot| slot.parent)
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		self.element(node).map(|element| element.tag.as_str())
	}

	#[must_use]
	pub fn namespace(&self, node: NodeId) -> Option<&'static str> {
		self.element(node).and_then(|element| element.namespace)
	}

	/// The data of a text node.
	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.slot(node)?.content {
			Content::Text(text) => Some(text.as_str()),
			Content::Element(_) => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?.attributes.get(name).map(String::as_str)
	}

	/// The namespace `name` was set with on `node`, if any.
	#[must_use]
	pub fn attribute_namespace(&self, node: NodeId, name: &str) -> Option<&'static str> {
		self.element(node)?.attribute_namespaces.get(name).copied()
	}

	/// Attribute names and values of `node`, sorted by name.
	#[must_use]
	pub fn attributes(&self, node: NodeId) -> Vec<(&str, &str)> {
		let mut attributes: Vec<_> = self
			.element(node)
			.map(|element| element.attributes.iter().map(|(name, value)| (name.as_str(), value.as_str())).collect())
			.unwrap_or_default();
		attributes.sort_unstable();
		attributes
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<&Value> {
		self.element(node)?.properties.get(name)
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<&str> {
		self.element(node)?.styles.get(name).map(String::as_str)
	}

	/// Style declarations of `node`, sorted by name.
	#[must_use]
	pub fn styles(&self, node: NodeId) -> Vec<(&str, &str)> {
		let mut styles: Vec<_> = self
			.element(node)
			.map(|element| element.styles.iter().map(|(name, value)| (name.as_str(), value.as_str())).collect())
			.unwrap_or_default();
		styles.sort_unstable();
		styles
	}

	#[must_use]
	pub fn has_listener(&self, node: NodeId, event: &str) -> bool {
		self.element(node).map_or(false, |element| element.listeners.contains_key(event))
	}

	/// Calls the listener for `event` on `node`, if any. Returns whether one was called.
	pub fn dispatch(&self, node: NodeId, event: &str, payload: &dyn Any) -> bool {
		let callback = match self.element(node).and_then(|element| element.listeners.get(event)) {
			Some(callback) => callback.clone(),
			None => return false,
		};
		trace!(?node, event, "Dispatching event.");
		callback.call(payload);
		true
	}

	/// How many listener bindings currently use `callback`.
	#[must_use]
	pub fn bindings(&self, callback: &Callback) -> u16 {
		self.handlers.count(callback).copied().unwrap_or(0)
	}

	/// Forgets callbacks that are no longer bound anywhere. Returns how many were freed.
	pub fn collect_listeners(&mut self) -> usize {
		let freed = self.handlers.drain_weak().count();
		trace!("Freed {} listener callback(s).", freed);
		info!("Listener callback count/cached capacity: {}/{}", self.handlers.len(), self.handlers.capacity());
		freed
	}

	/// Whether any callback is still tracked (including unbound ones not yet collected).
	#[must_use]
	pub fn has_tracked_listeners(&self) -> bool {
		!self.handlers.is_empty()
	}

	/// Concatenated text of all text nodes under `node`, in document order.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		let mut text = String::new();
		self.collect_text(node, &mut text);
		text
	}

	fn collect_text(&self, node: NodeId, text: &mut String) {
		match self.slot(node).map(|slot| &slot.content) {
			Some(Content::Text(data)) => text.push_str(data),
			Some(Content::Element(_)) => {
				for &child in self.children(node) {
					self.collect_text(child, text)
				}
			}
			None => (),
		}
	}

	/// Markup-like serialization of `node` with sorted attributes. Text is not escaped.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		match self.slot(node).map(|slot| &slot.content) {
			Some(Content::Text(data)) => html.push_str(data),
			Some(Content::Element(element)) => {
				html.push('<');
				html.push_str(&element.tag);
				for (name, value) in self.attributes(node) {
					html.push_str(&format!(" {}=\"{}\"", name, value));
				}
				html.push('>');
				for &child in self.children(node) {
					self.write_html(child, html)
				}
				html.push_str(&format!("</{}>", element.tag));
			}
			None => (),
		}
	}

	/// Finds the first element (by creation order) whose `id` attribute is `id`.
	#[must_use]
	pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
		self.nodes
			.iter()
			.position(|slot| matches!(&slot.content, Content::Element(element) if element.attributes.get("id").map(String::as_str) == Some(id)))
			.map(NodeId)
	}

	fn push(&mut self, content: Content) -> NodeId {
		self.nodes.push(Slot {
			content,
			parent: None,
			children: Vec::new(),
		});
		NodeId(self.nodes.len() - 1)
	}

	fn slot(&self, node: NodeId) -> Option<&Slot> {
		self.nodes.get(node.0)
	}

	fn slot_mut(&mut self, node: NodeId) -> Result<&mut Slot, MemoryError> {
		self.nodes.get_mut(node.0).ok_or(MemoryError::UnknownNode(node))
	}

	fn element(&self, node: NodeId) -> Option<&ElementState> {
		match &self.slot(node)?.content {
			Content::Element(element) => Some(element),
			Content::Text(_) => None,
		}
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementState> {
		match &mut self.nodes.get_mut(node.0)?.content {
			Content::Element(element) => Some(element),
			Content::Text(_) => None,
		}
	}

	fn expect_element(&mut self, node: NodeId) -> Result<&mut ElementState, MemoryError> {
		match &mut self.slot_mut(node)?.content {
			Content::Element(element) => Ok(element),
			Content::Text(_) => Err(MemoryError::NotAnElement(node)),
		}
	}

	/// Detaches `node` from its current parent, if any. Returns whether it was attached.
	fn detach(&mut self, node: NodeId) -> Result<bool, MemoryError> {
		let parent = match self.slot_mut(node)?.parent.take() {
			Some(parent) => parent,
			None => return Ok(false),
		};
		self.slot_mut(parent)?.children.retain(|&child| child != node);
		Ok(true)
	}

	/// Attaches `node` to `container` at `index`, relocating it if it's attached elsewhere.
	fn attach_at(&mut self, container: NodeId, node: NodeId, reference: Option<NodeId>) -> Result<(), MemoryError> {
		self.expect_element(container)?;
		if reference == Some(node) {
			trace!(?node, "Inserting node before itself. Nothing to do.");
			return Ok(());
		}
		if let Some(reference) = reference {
			if self.parent(reference) != Some(container) {
				return Err(MemoryError::NotAChild { parent: container, child: reference });
			}
		}

		let moved = self.detach(node)?;
		let siblings = &mut self.slot_mut(container)?.children;
		let index = reference.and_then(|reference| siblings.iter().position(|&child| child == reference)).unwrap_or(siblings.len());
		siblings.insert(index, node);
		self.slot_mut(node)?.parent = Some(container);

		self.journal.push(if moved {
			Mutation::Move { parent: container, node }
		} else {
			Mutation::Insert { parent: container, node }
		});
		Ok(())
	}
}

impl Host for MemoryHost {
	type Handle = NodeId;
	type Error = MemoryError;

	fn create_element(&mut self, tag: &str, namespace: Option<&'static str>) -> Result<NodeId, MemoryError> {
		let node = self.push(Content::Element(ElementState {
			tag: tag.to_owned(),
			namespace,
			..ElementState::default()
		}));
		self.journal.push(Mutation::CreateElement { node, tag: tag.to_owned() });
		Ok(node)
	}

	fn create_text(&mut self, content: &str) -> Result<NodeId, MemoryError> {
		let node = self.push(Content::Text(content.to_owned()));
		self.journal.push(Mutation::CreateText { node, text: content.to_owned() });
		Ok(node)
	}

	fn set_text(&mut self, text: &NodeId, content: &str) -> Result<(), MemoryError> {
		match &mut self.slot_mut(*text)?.content {
			Content::Text(data) => {
				*data = content.to_owned();
				self.journal.push(Mutation::SetText {
					node: *text,
					text: content.to_owned(),
				});
				Ok(())
			}
			Content::Element(_) => Err(MemoryError::NotAText(*text)),
		}
	}

	fn set_data(&mut self, element: &NodeId, key: &str, previous: Option<&Value>, next: Option<&Value>, svg: bool) -> Result<(), MemoryError> {
		apply_data(self, element, key, previous, next, svg)
	}

	fn append_child(&mut self, container: &NodeId, child: &NodeId) -> Result<(), MemoryError> {
		self.attach_at(*container, *child, None)
	}

	fn insert_before(&mut self, container: &NodeId, child: &NodeId, reference: &NodeId) -> Result<(), MemoryError> {
		self.attach_at(*container, *child, Some(*reference))
	}

	fn remove_child(&mut self, container: &NodeId, child: &NodeId) -> Result<(), MemoryError> {
		if self.parent(*child) != Some(*container) {
			return Err(MemoryError::NotAChild {
				parent: *container,
				child: *child,
			});
		}
		self.detach(*child)?;
		self.journal.push(Mutation::Remove {
			parent: *container,
			node: *child,
		});
		Ok(())
	}

	fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
		self.parent(*node)
	}

	fn next_sibling(&self, node: &NodeId) -> Option<NodeId> {
		let siblings = self.children(self.parent(*node)?);
		let index = siblings.iter().position(|child| child == node)?;
		siblings.get(index + 1).copied()
	}

	fn resolve_target(&mut self, target: &PortalTarget<NodeId>) -> Result<NodeId, MemoryError> {
		match target {
			PortalTarget::Handle(node) => {
				self.expect_element(*node)?;
				Ok(*node)
			}
			PortalTarget::Selector(selector) => selector
				.strip_prefix('#')
				.and_then(|id| self.element_by_id(id))
				.ok_or_else(|| MemoryError::SelectorNotFound(selector.to_string())),
		}
	}
}

impl DataSink for MemoryHost {
	type Handle = NodeId;
	type Error = MemoryError;

	fn set_attribute(&mut self, element: &NodeId, namespace: Option<&'static str>, name: &str, value: &str) -> Result<(), MemoryError> {
		let state = self.expect_element(*element)?;
		state.attributes.insert(name.to_owned(), value.to_owned());
		match namespace {
			Some(namespace) => state.attribute_namespaces.insert(name.to_owned(), namespace),
			None => state.attribute_namespaces.remove(name),
		};
		self.journal.push(Mutation::SetAttribute {
			node: *element,
			namespace,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&mut self, element: &NodeId, namespace: Option<&'static str>, name: &str) -> Result<(), MemoryError> {
		let state = self.expect_element(*element)?;
		state.attribute_namespaces.remove(name);
		if state.attributes.remove(name).is_none() {
			warn!(?element, name, "Removed attribute that wasn't set.");
		}
		self.journal.push(Mutation::RemoveAttribute {
			node: *element,
			namespace,
			name: name.to_owned(),
		});
		Ok(())
	}

	fn set_property(&mut self, element: &NodeId, name: &str, value: Option<&Value>) -> Result<(), MemoryError> {
		let properties = &mut self.expect_element(*element)?.properties;
		match value {
			Some(value) => properties.insert(name.to_owned(), value.clone()),
			None => properties.remove(name),
		};
		self.journal.push(Mutation::SetProperty {
			node: *element,
			name: name.to_owned(),
		});
		Ok(())
	}

	fn set_style(&mut self, element: &NodeId, name: &str, value: Option<&str>) -> Result<(), MemoryError> {
		let styles = &mut self.expect_element(*element)?.styles;
		match value {
			Some(value) => styles.insert(name.to_owned(), value.to_owned()),
			None => styles.remove(name),
		};
		self.journal.push(Mutation::SetStyle {
			node: *element,
			name: name.to_owned(),
			value: value.map(str::to_owned),
		});
		Ok(())
	}

	fn add_listener(&mut self, element: &NodeId, event: &str, callback: &Callback) -> Result<(), MemoryError> {
		let replaced = self.expect_element(*element)?.listeners.insert(event.to_owned(), callback.clone());
		if let Some(replaced) = replaced {
			warn!(?element, event, "Listener added without removing the previous one first.");
			self.release_handler(event, &replaced)?;
		}
		self.handlers
			.increment_or_insert_with(callback.clone(), |_| ())
			.map_err(|CountSaturatedError| MemoryError::ListenerCount(event.to_owned()))?;
		self.journal.push(Mutation::AddListener {
			node: *element,
			event: event.to_owned(),
		});
		Ok(())
	}

	fn remove_listener(&mut self, element: &NodeId, event: &str, callback: &Callback) -> Result<(), MemoryError> {
		let listeners = &mut self.expect_element(*element)?.listeners;
		if listeners.get(event) == Some(callback) {
			listeners.remove(event);
		} else {
			warn!(?element, event, "Removing a listener that isn't bound here.");
		}
		self.release_handler(event, callback)?;
		self.journal.push(Mutation::RemoveListener {
			node: *element,
			event: event.to_owned(),
		});
		Ok(())
	}
}

impl MemoryHost {
	fn release_handler(&mut self, event: &str, callback: &Callback) -> Result<(), MemoryError> {
		match self.handlers.weak_decrement(callback) {
			Ok(Some(_)) => Ok(()),
			Ok(None) => {
				warn!(event, "Released a callback that was never bound.");
				Ok(())
			}
			Err(CountSaturatedError) => Err(MemoryError::ListenerCount(event.to_owned())),
		}
	}
}
