use std::{any::Any, cell::Cell, rc::Rc};
use xylem::{
	data::XLINK_NAMESPACE,
	memory::{MemoryError, MemoryHost, NodeId},
	node::SVG_NAMESPACE,
	Callback, Data, Error, Node, PortalTarget, Target, Value,
};


fn setup() -> (MemoryHost, NodeId, Target<NodeId>) {
	logging_::init();
	let mut host = MemoryHost::new();
	let root = host.create_root("main");
	(host, root, Target::new(root))
}

#[test]
fn element_with_attributes_and_children() {
	let (mut host, root, mut target) = setup();
	target
		.render(
			&mut host,
			Some(
				Node::element("div")
					.attr("id", "x")
					.attr("class", Value::Class(vec!["a".to_owned(), "b".to_owned()]))
					.with_children(vec![Node::text("hi"), Node::element("br")]),
			),
		)
		.unwrap();

	assert!(target.is_mounted());
	assert_eq!(host.to_html(root), r#"<main><div class="a b" id="x">hi<br></br></div></main>"#);
	assert_eq!(target.tree().unwrap().handle(), &host.children(root)[0]);
}

#[test]
fn svg_namespace_and_declarations() {
	let (mut host, root, mut target) = setup();
	target
		.render(
			&mut host,
			Some(Node::fragment(vec![
				Node::svg("svg")
					.attr("viewBox", "0 0 10 10")
					.with_children(vec![Node::element("circle").attr("r", 5.0), Node::element("use").attr("xlink:href", "#a")]),
				Node::element("div"),
			])),
		)
		.unwrap();

	let (svg, div) = (host.children(root)[0], host.children(root)[1]);
	assert_eq!(host.namespace(svg), Some(SVG_NAMESPACE));
	assert_eq!(host.attribute(svg, "xmlns"), Some(SVG_NAMESPACE));
	assert_eq!(host.attribute(svg, "xmlns:xlink"), Some(XLINK_NAMESPACE));
	assert_eq!(host.attribute(svg, "viewBox"), Some("0 0 10 10"));
	assert_eq!(host.property(svg, "viewBox"), None);
	assert_eq!(host.namespace(div), None);

	let circle = host.children(svg)[0];
	assert_eq!(host.namespace(circle), Some(SVG_NAMESPACE));
	assert_eq!(host.attribute(circle, "xmlns"), None);
	assert_eq!(host.attribute(circle, "r"), Some("5"));
	let use_ = host.children(svg)[1];
	assert_eq!(host.attribute(use_, "xlink:href"), Some("#a"));
	assert_eq!(host.attribute_namespace(use_, "xlink:href"), Some(XLINK_NAMESPACE));
	assert_eq!(host.attribute_namespace(circle, "r"), None);
}

fn shape(props: &Data) -> Node<NodeId> {
	Node::element(props.get("tag").and_then(Value::to_text).unwrap_or_default())
}

fn drawing(layers: &[&'static str], shape_tag: &'static str) -> Node<NodeId> {
	Node::svg("svg").with_children(vec![
		Node::fragment(layers.iter().map(|&layer| Node::element(layer)).collect()),
		Node::functional("shape", shape).attr("tag", shape_tag),
	])
}

#[test]
fn svg_context_reaches_patched_fragment_and_component_content() {
	let (mut host, root, mut target) = setup();
	target.render(&mut host, Some(drawing(&["g", "g"], "circle"))).unwrap();
	let svg = host.children(root)[0];

	target.render(&mut host, Some(drawing(&["g", "g", "path"], "rect"))).unwrap();
	assert_eq!(host.children(root), [svg]);
	assert_eq!(host.to_html(svg), format!(r#"<svg xmlns="{}" xmlns:xlink="{}"><g></g><g></g><path></path><rect></rect></svg>"#, SVG_NAMESPACE, XLINK_NAMESPACE));
	for &child in host.children(svg) {
		assert_eq!(host.namespace(child), Some(SVG_NAMESPACE), "{:?}", host.tag(child));
		assert_eq!(host.attribute(child, "xmlns"), None);
	}
}

#[test]
fn empty_fragment_mounts_a_placeholder() {
	let (mut host, root, mut target) = setup();
	target.render(&mut host, Some(Node::fragment(vec![]))).unwrap();

	let placeholder = host.children(root)[0];
	assert_eq!(host.children(root).len(), 1);
	assert_eq!(host.text(placeholder), Some(""));
	assert_eq!(target.tree().unwrap().handle(), &placeholder);
}

#[test]
fn fragment_children_mount_in_place() {
	let (mut host, root, mut target) = setup();
	target
		.render(
			&mut host,
			Some(Node::element("p").with_children(vec![
				Node::text("a"),
				Node::fragment(vec![Node::text("b"), Node::fragment(vec![Node::text("c")])]),
				Node::text("d"),
			])),
		)
		.unwrap();

	let p = host.children(root)[0];
	assert_eq!(host.text_content(p), "abcd");
	assert_eq!(host.children(p).len(), 4);
}

#[test]
fn properties_and_listeners() {
	let (mut host, root, mut target) = setup();
	let calls = Rc::new(Cell::new(0));
	let on_input = Callback::new({
		let calls = Rc::clone(&calls);
		move |event: &dyn Any| {
			assert_eq!(event.downcast_ref::<&str>(), Some(&"typed"));
			calls.set(calls.get() + 1)
		}
	});
	target
		.render(
			&mut host,
			Some(
				Node::element("input")
					.attr("value", "x")
					.attr("onInput", on_input.clone())
					.attr("style", Value::Style(vec![("color".to_owned(), "red".to_owned())])),
			),
		)
		.unwrap();

	let input = host.children(root)[0];
	assert_eq!(host.property(input, "value"), Some(&Value::Text("x".to_owned())));
	assert_eq!(host.attribute(input, "value"), None);
	assert_eq!(host.style(input, "color"), Some("red"));
	assert!(host.has_listener(input, "input"));
	assert_eq!(host.bindings(&on_input), 1);

	assert!(host.dispatch(input, "input", &"typed"));
	assert!(!host.dispatch(input, "click", &()));
	assert_eq!(calls.get(), 1);
}

#[test]
fn failed_first_mount_leaves_no_record() {
	let (mut host, _root, mut target) = setup();
	let result = target.render(&mut host, Some(Node::portal(PortalTarget::Selector("#missing".into()), vec![Node::text("x")])));

	assert!(matches!(result, Err(Error::Host(MemoryError::SelectorNotFound(selector))) if selector == "#missing"));
	assert!(!target.is_mounted());
}
