use projector_dom::{
	h,
	memory::{MemoryDocument, Mutation},
	projection, CalculationCache, Error, Mapping, ProjectionOptions, Properties, VNode,
};
use std::{cell::Cell, rc::Rc};

#[test]
fn results_are_reused_for_equal_inputs() {
	let mut cache = CalculationCache::new();
	assert_eq!(*cache.result(&[1, 2], || "first"), "first");
	assert_eq!(*cache.result(&[1, 2], || unreachable!("inputs didn't change")), "first");
	assert_eq!(*cache.result(&[1, 3], || "second"), "second");

	cache.invalidate();
	assert_eq!(*cache.result(&[1, 3], || "third"), "third");
}

#[test]
fn different_input_lengths_recalculate() {
	let mut cache = CalculationCache::new();
	cache.result(&["a"], || 1);
	assert_eq!(*cache.result(&["a", "b"], || 2), 2);
	assert_eq!(*cache.result(&[], || 3), 3);
}

#[test]
fn cached_subtrees_are_identical() {
	let mut cache = CalculationCache::<u32, VNode<MemoryDocument>>::new();
	let first = cache.result(&[7], || h!("p", [7])).clone();
	let second = cache.result(&[7], || h!("p", [7])).clone();
	assert!(first.ptr_eq(&second));
}

#[derive(Debug)]
struct Row {
	key: u32,
	label: String,
	index: usize,
	updates: usize,
}

fn rows() -> (Mapping<(u32, &'static str), u32, Row>, Rc<Cell<usize>>) {
	let created = Rc::new(Cell::new(0));
	let mapping = Mapping::new(
		|&(key, _): &(u32, &'static str)| key,
		{
			let created = Rc::clone(&created);
			move |&(key, label): &(u32, &'static str), index| {
				created.set(created.get() + 1);
				Row {
					key,
					label: label.to_string(),
					index,
					updates: 0,
				}
			}
		},
		|&(_, label): &(u32, &'static str), row: &mut Row, index| {
			row.label = label.to_string();
			row.index = index;
			row.updates += 1;
		},
	);
	(mapping, created)
}

#[test]
fn cached_subtree_can_be_shown_again() {
	let document = MemoryDocument::new();
	let body = document.create_root("body");
	let mut cache = CalculationCache::<u32, VNode<MemoryDocument>>::new();
	let mut render = |shown: bool| {
		let cached = cache.result(&[1], || h!("p.cached", ["hi"])).clone();
		h!("div", [if shown { Some(cached) } else { None }])
	};

	let mut projection = projection::append(&document, &body, render(true), ProjectionOptions::new()).unwrap();
	let div = *projection.dom_node();
	projection.update(render(false)).unwrap();
	assert!(document.children(div).is_empty());

	document.take_journal();
	projection.update(render(true)).unwrap();
	assert_eq!(document.to_html(div), r#"<div><p class="cached">hi</p></div>"#);
	let created = document.take_journal().into_iter().filter(|mutation| matches!(mutation, Mutation::CreateElement { .. })).count();
	assert_eq!(created, 1);
	assert_eq!(projection.root().children()[0].dom_node(), Some(document.children(div)[0]));
}

#[test]
fn cached_subtree_survives_an_equal_replacement() {
	let document = MemoryDocument::new();
	let body = document.create_root("body");
	let cached = h!("p", ["hi"]);

	let mut projection = projection::append(&document, &body, h!("div", [cached.clone()]), ProjectionOptions::new()).unwrap();
	projection.update(h!("div", [h!("p", ["hi"])])).unwrap();
	projection.update(h!("div")).unwrap();
	projection.update(h!("div", [cached.clone()])).unwrap();
	assert_eq!(document.to_html(*projection.dom_node()), "<div><p>hi</p></div>");
}

#[test]
fn subtrees_still_appear_only_once_per_tree() {
	let document = MemoryDocument::new();
	let body = document.create_root("body");
	let twice = h!("p", Properties::new().key(1));
	let error = projection::append(&document, &body, h!("div", [twice.clone(), twice]), ProjectionOptions::new()).unwrap_err();
	assert_eq!(error, Error::AlreadyBound("p".to_string()));
}

#[test]
fn mapping_reuses_results_by_key() {
	let (mut mapping, created) = rows();
	mapping.map(&[(1, "one"), (2, "two"), (3, "three")]);
	assert_eq!(created.get(), 3);

	mapping.map(&[(3, "THREE"), (1, "one"), (4, "four")]);
	assert_eq!(created.get(), 4);
	let results = mapping.results();
	assert_eq!(results.iter().map(|row| row.key).collect::<Vec<_>>(), vec![3, 1, 4]);
	assert_eq!(results.iter().map(|row| row.index).collect::<Vec<_>>(), vec![0, 1, 2]);
	assert_eq!(results[0].label, "THREE");
	assert_eq!(results[0].updates, 1);
	assert_eq!(results[2].updates, 0);
}

#[test]
fn mapping_handles_duplicate_keys() {
	let (mut mapping, created) = rows();
	mapping.map(&[(1, "a"), (1, "b")]);
	mapping.map(&[(1, "c"), (1, "d"), (1, "e")]);
	assert_eq!(created.get(), 3);
	assert_eq!(mapping.results().iter().map(|row| row.label.as_str()).collect::<Vec<_>>(), vec!["c", "d", "e"]);

	mapping.map(&[]);
	assert!(mapping.results().is_empty());
}
