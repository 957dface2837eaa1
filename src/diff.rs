//! Mounting, patching and removal of realized trees.
//!
//! All functions here take the host container (and SVG context, and insertion reference where relevant) as
//! explicit parameters. Nothing is cached between calls.

use crate::{
	component::{FunctionalSession, StatefulSession},
	data::{Data, Value},
	error::Error,
	host::Host,
	node::{Children, Element, Node, NodeKind, SVG_NAMESPACE},
	realized::{Realized, RealizedKind},
};
use core::mem;
use hashbrown::HashSet;
use tracing::{trace, trace_span};

/// `xmlns` declarations stamped onto elements with their own SVG flag.
const SVG_DECLARATIONS: [(&str, &str); 2] = [("xmlns", SVG_NAMESPACE), ("xmlns:xlink", crate::data::XLINK_NAMESPACE)];

/// Inserts `child` before `before`, or appends it if there is no reference.
fn attach<H: Host>(host: &mut H, container: &H::Handle, child: &H::Handle, before: Option<&H::Handle>) -> Result<(), H::Error> {
	match before {
		Some(reference) => host.insert_before(container, child, reference),
		None => host.append_child(container, child),
	}
}

/// Mounts `node` into `container`, before `before` if given.
pub(crate) fn mount<H: Host>(
	host: &mut H,
	node: Node<H::Handle>,
	container: &H::Handle,
	svg: bool,
	before: Option<&H::Handle>,
) -> Result<Realized<H::Handle>, Error<H::Error>> {
	let Node { key, kind } = node;
	let (handle, kind) = match kind {
		NodeKind::Element(Element {
			tag,
			svg: svg_flag,
			data,
			children,
		}) => {
			let span = trace_span!("Mounting element", %tag, ?key);
			let _enter = span.enter();

			let in_svg = svg || svg_flag;
			let handle = host.create_element(&tag, if in_svg { Some(SVG_NAMESPACE) } else { None })?;
			if svg_flag {
				for &(name, namespace) in &SVG_DECLARATIONS {
					host.set_data(&handle, name, None, Some(&Value::Text(namespace.to_owned())), in_svg)?;
				}
			}
			for (name, value) in &data {
				trace!(%name, "Applying data.");
				host.set_data(&handle, name, None, Some(value), in_svg)?;
			}
			let children = mount_children(host, children, &handle, in_svg, None)?;
			attach(host, container, &handle, before)?;
			(
				handle,
				RealizedKind::Element {
					tag,
					svg: svg_flag,
					in_svg,
					data,
					children,
				},
			)
		}

		NodeKind::Text(text) => {
			let span = trace_span!("Mounting text", ?key);
			let _enter = span.enter();
			if cfg!(feature = "dangerous-logging") {
				trace!(%text);
			}

			let handle = host.create_text(&text)?;
			attach(host, container, &handle, before)?;
			(handle, RealizedKind::Text(text))
		}

		NodeKind::Fragment(children) => {
			let span = trace_span!("Mounting fragment", arity = ?children.arity(), ?key);
			let _enter = span.enter();

			let children = mount_children(host, children, container, svg, before)?;
			let handle = match children.iter().next() {
				Some(first) => first.handle.clone(),
				None => placeholder(host, container, before)?,
			};
			(handle, RealizedKind::Fragment(children))
		}

		NodeKind::Portal { target, children } => {
			let span = trace_span!("Mounting portal", ?target, ?key);
			let _enter = span.enter();

			let destination = host.resolve_target(&target)?;
			let children = mount_children(host, children, &destination, false, None)?;
			let handle = placeholder(host, container, before)?;
			(
				handle,
				RealizedKind::Portal {
					target,
					destination,
					children,
				},
			)
		}

		NodeKind::Stateful { component, props } => {
			let session = StatefulSession::mount(host, component, props, container, svg, before)?;
			(session.rendered().handle.clone(), RealizedKind::Stateful(session))
		}

		NodeKind::Functional { component, props } => {
			let session = FunctionalSession::mount(host, component, props, container, svg, before)?;
			(session.rendered().handle.clone(), RealizedKind::Functional(session))
		}
	};

	Ok(Realized { key, handle, kind })
}

fn mount_children<H: Host>(
	host: &mut H,
	children: Children<Node<H::Handle>>,
	container: &H::Handle,
	svg: bool,
	before: Option<&H::Handle>,
) -> Result<Children<Realized<H::Handle>>, Error<H::Error>> {
	Ok(match children {
		Children::None => Children::None,
		Children::Single(child) => Children::Single(Box::new(mount(host, *child, container, svg, before)?)),
		Children::Multiple(children) => {
			debug_assert_unique_keys(&children);
			let mut mounted = Vec::with_capacity(children.len());
			for child in children {
				mounted.push(mount(host, child, container, svg, before)?);
			}
			Children::Multiple(mounted)
		}
	})
}

/// An empty text node that anchors a fragment or portal.
fn placeholder<H: Host>(host: &mut H, container: &H::Handle, before: Option<&H::Handle>) -> Result<H::Handle, H::Error> {
	let handle = host.create_text("")?;
	attach(host, container, &handle, before)?;
	trace!(?handle, "Mounted placeholder.");
	Ok(handle)
}

/// Whether `previous` can be patched in place to represent `next`.
fn patchable<N: 'static>(previous: &Realized<N>, next: &Node<N>) -> bool {
	match (&previous.kind, &next.kind) {
		(RealizedKind::Element { tag, svg, .. }, NodeKind::Element(element)) => *tag == element.tag && *svg == element.svg,
		(RealizedKind::Text(_), NodeKind::Text(_)) | (RealizedKind::Fragment(_), NodeKind::Fragment(_)) | (RealizedKind::Portal { .. }, NodeKind::Portal { .. }) => true,
		(RealizedKind::Stateful(session), NodeKind::Stateful { component, .. }) => session.component() == component,
		(RealizedKind::Functional(session), NodeKind::Functional { component, .. }) => session.component() == component,
		_ => false,
	}
}

/// Updates `previous` in place so that it represents `next`.
///
/// Nodes of different kinds, elements with different tags and different components are replaced instead.
pub(crate) fn patch<H: Host>(
	host: &mut H,
	previous: &mut Realized<H::Handle>,
	next: Node<H::Handle>,
	container: &H::Handle,
	svg: bool,
) -> Result<(), Error<H::Error>> {
	if !patchable(previous, &next) {
		return replace(host, previous, next, container, svg);
	}

	let Node { key, kind } = next;
	previous.key = key;
	let handle = previous.handle.clone();
	match (&mut previous.kind, kind) {
		(
			RealizedKind::Element {
				tag, in_svg, data, children, ..
			},
			NodeKind::Element(next),
		) => {
			let span = trace_span!("Patching element", %tag, key = ?previous.key);
			let _enter = span.enter();

			patch_data(host, &handle, data, next.data, *in_svg)?;
			reconcile_children(host, children, next.children, &handle, *in_svg, None)?;
		}

		(RealizedKind::Text(text), NodeKind::Text(next)) => {
			let span = trace_span!("Patching text", key = ?previous.key);
			let _enter = span.enter();

			if *text != next {
				if cfg!(feature = "dangerous-logging") {
					trace!(from = %text, to = %next, "Updating text.");
				}
				host.set_text(&handle, &next)?;
				*text = next;
			}
		}

		(RealizedKind::Fragment(children), NodeKind::Fragment(next)) => {
			let span = trace_span!("Patching fragment", from = ?children.arity(), to = ?next.arity(), key = ?previous.key);
			let _enter = span.enter();

			match (children.is_empty(), next.is_empty()) {
				(true, true) => trace!("Keeping placeholder."),
				(true, false) => {
					reconcile_children(host, children, next, container, svg, Some(&handle))?;
					host.remove_child(container, &handle)?;
				}
				(false, true) => {
					let anchor = placeholder(host, container, Some(&handle))?;
					reconcile_children(host, children, next, container, svg, None)?;
					previous.handle = anchor;
				}
				(false, false) => {
					let after = children.iter().next_back().and_then(|last| host.next_sibling(last.last_handle()));
					reconcile_children(host, children, next, container, svg, after.as_ref())?;
				}
			}
		}

		(
			RealizedKind::Portal {
				target,
				destination,
				children,
			},
			NodeKind::Portal {
				target: next_target,
				children: next,
			},
		) => {
			let span = trace_span!("Patching portal", from = ?target, to = ?next_target, key = ?previous.key);
			let _enter = span.enter();

			// Patch where the content currently is, then relocate it.
			reconcile_children(host, children, next, destination, false, None)?;
			if *target != next_target {
				let next_destination = host.resolve_target(&next_target)?;
				for child in children.iter() {
					for node in child.host_nodes() {
						host.append_child(&next_destination, &node)?;
					}
				}
				*target = next_target;
				*destination = next_destination;
			}
		}

		(RealizedKind::Stateful(session), NodeKind::Stateful { props, .. }) => session.receive(host, props)?,

		(RealizedKind::Functional(session), NodeKind::Functional { props, .. }) => session.update(host, props, container)?,

		_ => unreachable!("`patchable` admitted a mismatched pair"),
	}

	previous.refresh_anchor();
	Ok(())
}

/// Applies changed entries of `next` and removes entries missing from it.
///
/// Entries with equal values are skipped, so an unchanged element causes no host calls.
fn patch_data<H: Host>(host: &mut H, element: &H::Handle, previous: &mut Data, next: Data, svg: bool) -> Result<(), H::Error> {
	for (name, value) in &next {
		let old = previous.get(name);
		if old != Some(value) {
			trace!(%name, first = old.is_none(), "Updating data.");
			host.set_data(element, name, old, Some(value), svg)?;
		}
	}
	for (name, value) in previous.iter() {
		if !next.contains_key(name) {
			trace!(%name, "Removing data.");
			host.set_data(element, name, Some(value), None, svg)?;
		}
	}
	*previous = next;
	Ok(())
}

/// Removes `previous` and mounts `next` at its position.
fn replace<H: Host>(
	host: &mut H,
	previous: &mut Realized<H::Handle>,
	next: Node<H::Handle>,
	container: &H::Handle,
	svg: bool,
) -> Result<(), Error<H::Error>> {
	let span = trace_span!("Replacing", from = ?previous.kind(), to = ?next.kind());
	let _enter = span.enter();

	let before = host.next_sibling(previous.last_handle());
	unmount(host, previous, Some(container))?;
	*previous = mount(host, next, container, svg, before.as_ref())?;
	Ok(())
}

/// Detaches `node` from `container` and ends component lifecycles inside it.
///
/// With `container == None`, the node's host nodes are assumed to be detached along with an ancestor already.
/// Portal content is always removed from its destination.
pub(crate) fn unmount<H: Host>(host: &mut H, node: &mut Realized<H::Handle>, container: Option<&H::Handle>) -> Result<(), Error<H::Error>> {
	match &mut node.kind {
		RealizedKind::Element { tag, children, .. } => {
			let span = trace_span!("Unmounting element", %tag, key = ?node.key);
			let _enter = span.enter();
			if let Some(container) = container {
				host.remove_child(container, &node.handle)?;
			}
			for child in children.iter_mut() {
				unmount(host, child, None)?;
			}
		}

		RealizedKind::Text(_) => {
			if let Some(container) = container {
				trace!(key = ?node.key, "Removing text.");
				host.remove_child(container, &node.handle)?;
			}
		}

		RealizedKind::Fragment(children) => {
			let span = trace_span!("Unmounting fragment", arity = ?children.arity(), key = ?node.key);
			let _enter = span.enter();
			if children.is_empty() {
				if let Some(container) = container {
					host.remove_child(container, &node.handle)?;
				}
			}
			for child in children.iter_mut() {
				unmount(host, child, container)?;
			}
		}

		RealizedKind::Portal { destination, children, .. } => {
			let span = trace_span!("Unmounting portal", key = ?node.key);
			let _enter = span.enter();
			for child in children.iter_mut() {
				unmount(host, child, Some(&*destination))?;
			}
			if let Some(container) = container {
				host.remove_child(container, &node.handle)?;
			}
		}

		RealizedKind::Stateful(session) => session.unmount(host, container)?,

		RealizedKind::Functional(session) => session.unmount(host, container)?,
	}
	Ok(())
}

/// Reconciles `previous` children with `next` inside `container`.
///
/// New children that can't be positioned relative to existing ones are inserted before `before`, or appended.
pub(crate) fn reconcile_children<H: Host>(
	host: &mut H,
	previous: &mut Children<Realized<H::Handle>>,
	next: Children<Node<H::Handle>>,
	container: &H::Handle,
	svg: bool,
	before: Option<&H::Handle>,
) -> Result<(), Error<H::Error>> {
	match (mem::take(previous), next) {
		(Children::None, Children::None) => (),

		(Children::None, next) => *previous = mount_children(host, next, container, svg, before)?,

		(Children::Single(mut child), Children::None) => unmount(host, &mut child, Some(container))?,

		(Children::Single(mut child), Children::Single(next)) => {
			patch(host, &mut child, *next, container, svg)?;
			*previous = Children::Single(child);
		}

		(Children::Single(mut child), next @ Children::Multiple(_)) => {
			unmount(host, &mut child, Some(container))?;
			*previous = mount_children(host, next, container, svg, before)?;
		}

		(Children::Multiple(children), Children::None) => {
			for mut child in children {
				unmount(host, &mut child, Some(container))?;
			}
		}

		(Children::Multiple(children), next @ Children::Single(_)) => {
			for mut child in children {
				unmount(host, &mut child, Some(container))?;
			}
			*previous = mount_children(host, next, container, svg, before)?;
		}

		(Children::Multiple(children), Children::Multiple(next)) => *previous = Children::Multiple(diff_keyed(host, children, next, container, svg)?),
	}
	Ok(())
}

/// Keyed diff of two non-empty sibling sequences.
///
/// Children are matched by key first (first unmatched occurrence wins), without touching the host. While matching,
/// the largest matched old index so far is tracked. If a match is found below it, the sequence was reordered, and
/// only children outside a longest run of still-ordered matches will move.
/// The host walk then goes through the new children in order: matched ones are patched and moved if needed, new ones
/// are mounted right after their preceding sibling. Unmatched old children are removed last.
fn diff_keyed<H: Host>(
	host: &mut H,
	previous: Vec<Realized<H::Handle>>,
	next: Vec<Node<H::Handle>>,
	container: &H::Handle,
	svg: bool,
) -> Result<Vec<Realized<H::Handle>>, Error<H::Error>> {
	let span = trace_span!("Diffing keyed", previous = previous.len(), next = next.len());
	let _enter = span.enter();

	debug_assert_unique_keys(&next);

	let mut taken = vec![false; previous.len()];
	let mut last_index = 0;
	let mut moved = false;
	let sources: Vec<Option<usize>> = next
		.iter()
		.map(|next| {
			let source = previous.iter().enumerate().position(|(j, child)| !taken[j] && child.key == next.key);
			if let Some(j) = source {
				taken[j] = true;
				if j < last_index {
					moved = true;
				} else {
					last_index = j;
				}
			}
			source
		})
		.collect();
	let stable = if moved { longest_increasing(&sources) } else { vec![true; sources.len()] };

	// The first old child is in front of everything this pass touches. It is only read before it is patched, since
	// a child matching it in first position is always stable.
	let start = previous.first().map(|first| first.handle.clone());

	let mut previous: Vec<Option<Realized<H::Handle>>> = previous.into_iter().map(Some).collect();
	let mut placed: Vec<Realized<H::Handle>> = Vec::with_capacity(next.len());
	for ((next, source), stable) in next.into_iter().zip(sources).zip(stable) {
		match source.and_then(|j| previous[j].take()) {
			Some(mut child) => {
				trace!(key = ?next.key, from = ?source, "Matched.");
				patch(host, &mut child, next, container, svg)?;
				if !stable {
					let reference = reference(host, &placed, start.as_ref());
					move_before(host, container, &child, reference.as_ref())?;
				}
				placed.push(child);
			}
			None => {
				trace!(key = ?next.key, "Mounting new keyed child.");
				let reference = reference(host, &placed, start.as_ref());
				placed.push(mount(host, next, container, svg, reference.as_ref())?);
			}
		}
	}

	for mut stale in previous.into_iter().flatten() {
		trace!(key = ?stale.key, "Removing unmatched keyed child.");
		unmount(host, &mut stale, Some(container))?;
	}

	Ok(placed)
}

/// The host node the next keyed child goes in front of: right after the last placed one, or at the start.
fn reference<H: Host>(host: &H, placed: &[Realized<H::Handle>], start: Option<&H::Handle>) -> Option<H::Handle> {
	match placed.last() {
		Some(last) => host.next_sibling(last.last_handle()),
		None => start.cloned(),
	}
}

/// Moves all host nodes of `child` before `reference` (or to the end) without detaching them first.
fn move_before<H: Host>(host: &mut H, container: &H::Handle, child: &Realized<H::Handle>, reference: Option<&H::Handle>) -> Result<(), H::Error> {
	let nodes = child.host_nodes();
	if let Some(reference) = reference {
		if nodes.contains(reference) {
			return Ok(());
		}
	}
	trace!(key = ?child.key, count = nodes.len(), "Moving keyed child.");
	for node in &nodes {
		attach(host, container, node, reference)?;
	}
	Ok(())
}

/// Marks the positions of one longest strictly increasing subsequence of the present `sources`.
fn longest_increasing(sources: &[Option<usize>]) -> Vec<bool> {
	// `tails[k]` is the (value, position) ending the smallest-tailed increasing run of length `k + 1`.
	let mut tails: Vec<(usize, usize)> = Vec::new();
	let mut predecessors = vec![None; sources.len()];
	for (position, source) in sources.iter().enumerate() {
		let value = match source {
			Some(value) => *value,
			None => continue,
		};
		let k = tails.partition_point(|&(tail, _)| tail < value);
		if k > 0 {
			predecessors[position] = Some(tails[k - 1].1);
		}
		if k == tails.len() {
			tails.push((value, position));
		} else {
			tails[k] = (value, position);
		}
	}

	let mut stable = vec![false; sources.len()];
	let mut cursor = tails.last().map(|&(_, position)| position);
	while let Some(position) = cursor {
		stable[position] = true;
		cursor = predecessors[position];
	}
	stable
}

fn debug_assert_unique_keys<N>(children: &[Node<N>]) {
	debug_assert_eq!(
		children.iter().filter(|child| child.key.is_some()).count(),
		children.iter().filter_map(|child| child.key.as_ref()).collect::<HashSet<_>>().len(),
		"Duplicate key encountered among siblings",
	);
}
