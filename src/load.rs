//! Reading a [`MemoryHost`] subtree back into a [`Node`] description.
//!
//! Only what the host can report is recovered: tags, attributes (as [`Value::Text`]), style declarations and text.
//! Properties and listeners are not, and loaded entries are never explicitly keyed.

use crate::{
	data::{Data, Value},
	memory::{MemoryHost, NodeId},
	node::{Children, Element, Node, NodeKind, SVG_NAMESPACE},
};
use std::borrow::Cow;

/// Declarations stamped onto SVG roots during mounting, which the description doesn't carry.
const STAMPED: [&str; 2] = ["xmlns", "xmlns:xlink"];

/// Describes the child nodes of `parent`, classified by arity.
#[must_use]
pub fn load_child_nodes(host: &MemoryHost, parent: NodeId) -> Children<Node<NodeId>> {
	Children::from_nodes(host.children(parent).iter().filter_map(|&child| load_node(host, child)).collect())
}

/// Describes `node` and its subtree. Returns [`None`] for unknown handles.
#[must_use]
pub fn load_node(host: &MemoryHost, node: NodeId) -> Option<Node<NodeId>> {
	if let Some(text) = host.text(node) {
		return Some(Node::text(text.to_owned()));
	}
	let tag = host.tag(node)?;
	Some(Node::new(NodeKind::Element(load_element(host, node, tag))))
}

fn load_element(host: &MemoryHost, node: NodeId, tag: &str) -> Element<NodeId> {
	let svg = host.namespace(node) == Some(SVG_NAMESPACE) && host.attribute(node, "xmlns").is_some();
	Element {
		tag: Cow::Owned(tag.to_owned()),
		svg,
		data: load_data(host, node, svg),
		children: load_child_nodes(host, node),
	}
}

fn load_data(host: &MemoryHost, node: NodeId, svg: bool) -> Data {
	let mut data: Data = host
		.attributes(node)
		.into_iter()
		.filter(|(name, _)| !(svg && STAMPED.contains(name)))
		.map(|(name, value)| (name.to_owned(), Value::Text(value.to_owned())))
		.collect();

	let styles = host.styles(node);
	if !styles.is_empty() {
		data.insert(
			"style".to_owned(),
			Value::Style(styles.into_iter().map(|(name, value)| (name.to_owned(), value.to_owned())).collect()),
		);
	}
	data
}
