//! Convenience construction of virtual trees.

use crate::{
	target::Target,
	vnode::{Properties, Selector, VNode},
};
use std::rc::Rc;

/// Anything that can appear in a child list passed to [`h`](`fn@h`).
///
/// Strings and numbers become text nodes, [`None`] is dropped and nested lists are flattened.
pub enum Child<T: Target> {
	Node(VNode<T>),
	Text(Rc<str>),
	List(Vec<Child<T>>),
	Empty,
}
impl<T: Target> From<VNode<T>> for Child<T> {
	fn from(vnode: VNode<T>) -> Self {
		Child::Node(vnode)
	}
}
impl<T: Target> From<&VNode<T>> for Child<T> {
	fn from(vnode: &VNode<T>) -> Self {
		Child::Node(vnode.clone())
	}
}
impl<T: Target> From<&str> for Child<T> {
	fn from(text: &str) -> Self {
		Child::Text(text.into())
	}
}
impl<T: Target> From<String> for Child<T> {
	fn from(text: String) -> Self {
		Child::Text(text.into())
	}
}
impl<T: Target> From<Rc<str>> for Child<T> {
	fn from(text: Rc<str>) -> Self {
		Child::Text(text)
	}
}
macro_rules! number_child {
	($($number:ty),*$(,)?) => {$(
		impl<T: Target> From<$number> for Child<T> {
			fn from(number: $number) -> Self {
				Child::Text(number.to_string().into())
			}
		}
	)*};
}
number_child!(i32, i64, u32, u64, usize, f64);
impl<T: Target, C: Into<Child<T>>> From<Option<C>> for Child<T> {
	fn from(child: Option<C>) -> Self {
		child.map_or(Child::Empty, Into::into)
	}
}
impl<T: Target, C: Into<Child<T>>> From<Vec<C>> for Child<T> {
	fn from(children: Vec<C>) -> Self {
		Child::List(children.into_iter().map(Into::into).collect())
	}
}

fn flatten<T: Target>(children: Vec<Child<T>>, into: &mut Vec<Child<T>>) {
	for child in children {
		match child {
			Child::List(list) => flatten(list, into),
			Child::Empty => (),
			other => into.push(other),
		}
	}
}

/// Builds an element node.
///
/// A single text child becomes the element's text payload instead of a separate text node.
pub fn h<T: Target>(selector: &str, properties: Option<Properties<T>>, children: Vec<Child<T>>) -> VNode<T> {
	let mut flat = Vec::with_capacity(children.len());
	flatten(children, &mut flat);

	if flat.len() == 1 {
		if let Some(Child::Text(text)) = flat.first() {
			let text = if text.is_empty() { None } else { Some(Rc::clone(text)) };
			return VNode::new_element(Selector::parse(selector), properties, Vec::new(), text);
		}
	}

	let children = flat
		.into_iter()
		.filter_map(|child| match child {
			Child::Node(vnode) => Some(vnode),
			Child::Text(text) => Some(VNode::new_text(text)),
			Child::List(_) | Child::Empty => None,
		})
		.collect();
	VNode::new_element(Selector::parse(selector), properties, children, None)
}

/// Builds an element node with [`h`](`fn@h`), converting each child with [`Child::from`].
///
/// ```
/// use projector_dom::{h, memory::MemoryDocument, Properties, VNode};
///
/// let vnode: VNode<MemoryDocument> = h!("ul.list", Properties::new().key(1), [
///     h!("li", ["first"]),
///     h!("li", ["second"]),
/// ]);
/// assert_eq!(vnode.children().len(), 2);
/// assert_eq!(vnode.children()[0].text(), Some("first"));
/// ```
#[macro_export]
macro_rules! h {
	($selector:expr) => {
		$crate::h($selector, ::core::option::Option::None, ::std::vec::Vec::new())
	};
	($selector:expr, [$($child:expr),*$(,)?]) => {
		$crate::h($selector, ::core::option::Option::None, ::std::vec![$($crate::Child::from($child)),*])
	};
	($selector:expr, $properties:expr) => {
		$crate::h($selector, ::core::option::Option::Some($properties), ::std::vec::Vec::new())
	};
	($selector:expr, $properties:expr, [$($child:expr),*$(,)?]) => {
		$crate::h($selector, ::core::option::Option::Some($properties), ::std::vec![$($crate::Child::from($child)),*])
	};
}
