use std::cell::RefCell;
use xylem::{
	memory::{MemoryHost, Mutation, NodeId},
	BoxError, Component, Data, Key, Node, Target, Value,
};


thread_local! {
	static EVENTS: RefCell<Vec<String>> = RefCell::new(Vec::new());
}

fn record(event: String) {
	EVENTS.with(|events| events.borrow_mut().push(event))
}

fn events() -> Vec<String> {
	EVENTS.with(|events| events.borrow_mut().drain(..).collect())
}

fn setup() -> (MemoryHost, NodeId, Target<NodeId>) {
	logging_::init();
	let mut host = MemoryHost::new();
	let root = host.create_root("main");
	(host, root, Target::new(root))
}

fn list(keys: &[&'static str]) -> Node<NodeId> {
	Node::element("ul").with_children(keys.iter().map(|&key| Node::element("li").with_key(key).with_children(vec![Node::text(key)])).collect())
}

/// Renders `from`, then `to`, and returns the `li` handles before and after along with the mutations of the second pass.
fn transition(from: &[&'static str], to: &[&'static str]) -> (MemoryHost, Vec<NodeId>, Vec<NodeId>, Vec<Mutation>) {
	let (mut host, root, mut target) = setup();
	target.render(&mut host, Some(list(from))).unwrap();
	let ul = host.children(root)[0];
	let before = host.children(ul).to_vec();
	host.take_journal();

	target.render(&mut host, Some(list(to))).unwrap();
	assert_eq!(host.children(root), [ul]);
	assert_eq!(host.text_content(ul), to.concat());
	let after = host.children(ul).to_vec();
	let journal = host.take_journal();
	(host, before, after, journal)
}

fn count(journal: &[Mutation], matches: fn(&Mutation) -> bool) -> usize {
	journal.iter().filter(|mutation| matches(mutation)).count()
}

#[test]
fn rotation_moves_exactly_one_child() {
	let (_host, before, after, journal) = transition(&["a", "b", "c"], &["c", "a", "b"]);

	assert_eq!(after, [before[2], before[0], before[1]]);
	assert_eq!(journal.len(), 1);
	assert!(matches!(journal[0], Mutation::Move { node, .. } if node == before[2]));
}

#[test]
fn rotation_the_other_way() {
	let (_host, before, after, journal) = transition(&["a", "b", "c"], &["b", "c", "a"]);

	assert_eq!(after, [before[1], before[2], before[0]]);
	assert_eq!(journal.len(), 1);
}

#[test]
fn reversal_keeps_identity() {
	let (_host, before, after, journal) = transition(&["a", "b", "c", "d"], &["d", "c", "b", "a"]);

	assert_eq!(after, before.iter().rev().copied().collect::<Vec<_>>());
	assert_eq!(journal.len(), 3);
	assert!(journal.iter().all(|mutation| matches!(mutation, Mutation::Move { .. })));
}

#[test]
fn unchanged_order_is_idle() {
	let (_host, before, after, journal) = transition(&["a", "b", "c"], &["a", "b", "c"]);

	assert_eq!(after, before);
	assert!(journal.is_empty());
}

#[test]
fn insertion_keeps_neighbours() {
	let (host, before, after, journal) = transition(&["a", "c"], &["a", "b", "c"]);

	assert_eq!((after[0], after[2]), (before[0], before[1]));
	assert_eq!(host.tag(after[1]), Some("li"));
	assert_eq!(count(&journal, |m| matches!(m, Mutation::Move { .. } | Mutation::Remove { .. })), 0);
	assert_eq!(count(&journal, |m| matches!(m, Mutation::CreateElement { .. })), 1);
}

#[test]
fn insertion_at_the_front() {
	let (_host, before, after, journal) = transition(&["b", "c"], &["a", "b", "c"]);

	assert_eq!(&after[1..], &before[..]);
	assert_eq!(count(&journal, |m| matches!(m, Mutation::Move { .. })), 0);
}

#[derive(Default)]
struct Item {
	name: RefCell<String>,
}
impl Component<NodeId> for Item {
	fn render(&self, props: &Data) -> Node<NodeId> {
		let name = props.get("name").and_then(Value::to_text).unwrap_or_default();
		record(format!("render {}", name));
		*self.name.borrow_mut() = name.clone();
		Node::element("li").with_children(vec![Node::text(name)])
	}

	fn mounted(&mut self) -> Result<(), BoxError> {
		record(format!("mounted {}", self.name.borrow()));
		Ok(())
	}
}

fn item(name: &'static str) -> Node<NodeId> {
	Node::stateful::<Item>().with_key(name).attr("name", name)
}

#[test]
fn insertion_renders_in_description_order() {
	let (mut host, root, mut target) = setup();
	target.render(&mut host, Some(Node::element("ul").with_children(vec![item("b"), Node::text("t").with_key("t")]))).unwrap();
	let ul = host.children(root)[0];
	let before = host.children(ul).to_vec();
	events();
	host.take_journal();

	target
		.render(&mut host, Some(Node::element("ul").with_children(vec![item("a"), item("b"), Node::text("t").with_key("t")])))
		.unwrap();
	assert_eq!(events(), ["render a", "mounted a", "render b"]);
	assert_eq!(host.to_html(ul), "<ul><li>a</li><li>b</li>t</ul>");
	assert_eq!(host.children(ul)[1..], before[..]);
	assert_eq!(count(&host.take_journal(), |m| matches!(m, Mutation::Move { .. } | Mutation::Remove { .. })), 0);
}

#[test]
fn stale_children_are_removed() {
	let (host, before, after, journal) = transition(&["a", "b", "c"], &["a", "c"]);

	assert_eq!(after, [before[0], before[2]]);
	assert_eq!(journal, [Mutation::Remove { parent: host.parent(before[0]).unwrap(), node: before[1] }]);
	assert_eq!(host.parent(before[1]), None);
}

#[test]
fn disjoint_keys_replace_everything() {
	let (host, before, after, journal) = transition(&["a", "b", "c"], &["d", "e"]);

	assert!(before.iter().all(|&li| host.parent(li).is_none()));
	assert!(after.iter().all(|li| !before.contains(li)));
	assert_eq!(count(&journal, |m| matches!(m, Mutation::Remove { .. })), 3);
	assert_eq!(count(&journal, |m| matches!(m, Mutation::Move { .. })), 0);
}

#[test]
fn mixed_reorder_insert_and_removal() {
	let (_host, before, after, journal) = transition(&["a", "b", "c", "d", "e"], &["e", "b", "x", "a", "d"]);

	assert_eq!(after[0], before[4]);
	assert_eq!(after[1], before[1]);
	assert_eq!(after[3], before[0]);
	assert_eq!(after[4], before[3]);
	assert!(!before.contains(&after[2]));
	assert_eq!(count(&journal, |m| matches!(m, Mutation::Remove { .. })), 1);
}

#[test]
fn unkeyed_children_are_matched_by_position() {
	let (mut host, root, mut target) = setup();
	let texts = |items: &[&'static str]| Node::element("p").with_children(items.iter().map(|&item| Node::text(item)).collect());

	target.render(&mut host, Some(texts(&["a", "b"]))).unwrap();
	let p = host.children(root)[0];
	let before = host.children(p).to_vec();
	host.take_journal();

	target.render(&mut host, Some(texts(&["b", "a", "c"]))).unwrap();
	assert_eq!(host.children(p)[..2], before[..]);
	assert_eq!(host.text_content(p), "bac");
	assert_eq!(count(&host.take_journal(), |m| matches!(m, Mutation::SetText { .. })), 2);
}

#[test]
fn implicit_keys_are_assigned_to_unkeyed_siblings() {
	let (mut host, _root, mut target) = setup();
	target.render(&mut host, Some(Node::fragment(vec![Node::text("a").with_key("k"), Node::text("b")]))).unwrap();

	let keys: Vec<_> = target.tree().unwrap().children().unwrap().iter().map(|child| child.key().cloned()).collect();
	assert_eq!(keys, [Some(Key::from("k")), Some(Key::Implicit(1))]);
}

#[test]
fn fragments_move_as_a_whole() {
	let (mut host, root, mut target) = setup();
	let tree = |fragment_first: bool| {
		let label = Node::text("L").with_key("label");
		let fragment = Node::fragment(vec![Node::text("1"), Node::text("2")]).with_key("fragment");
		Node::element("div").with_children(if fragment_first { vec![fragment, label] } else { vec![label, fragment] })
	};

	target.render(&mut host, Some(tree(false))).unwrap();
	let div = host.children(root)[0];
	let before = host.children(div).to_vec();
	host.take_journal();

	target.render(&mut host, Some(tree(true))).unwrap();
	assert_eq!(host.text_content(div), "12L");
	assert_eq!(host.children(div), [before[1], before[2], before[0]]);

	target.render(&mut host, Some(tree(false))).unwrap();
	assert_eq!(host.text_content(div), "L12");
}

#[test]
#[cfg(debug_assertions)]
#[should_panic(expected = "Duplicate key")]
fn duplicate_keys_are_rejected_in_debug_builds() {
	let (mut host, _root, mut target) = setup();
	let _ = target.render(&mut host, Some(list(&["a", "a"])));
}
