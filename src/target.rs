//! The narrow set of primitives the reconciler needs from a live tree.
//!
//! Implementations are handles: cloning one must yield another handle to the same tree.
//! All methods take `&self`, so implementations use interior mutability where needed.
//!
//! The primitives are assumed to be correct. Host failures are the implementation's to log,
//! the reconciler never inspects them.

use crate::vnode::{Handler, Value};
use core::fmt::Debug;

/// A live, mutable tree that virtual trees are projected into.
pub trait Target: Clone + 'static {
	/// A (cheaply clonable) handle to a node in this tree.
	type Node: Clone + PartialEq + Debug + 'static;

	/// The argument event handlers receive.
	type Event: 'static;

	/// Creates a detached element, in `namespace` if one is given.
	fn create_element(&self, tag: &str, namespace: Option<&str>) -> Self::Node;

	/// Creates a detached text node.
	fn create_text(&self, text: &str) -> Self::Node;

	fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

	/// Inserts (or moves) `node` into `parent` right before `reference`, or appends it if `reference` is [`None`].
	fn insert_before(&self, parent: &Self::Node, node: &Self::Node, reference: Option<&Self::Node>);

	/// Detaches `node` from its parent, if it has one.
	fn remove(&self, node: &Self::Node);

	/// Replaces the data of a text node.
	fn set_text(&self, node: &Self::Node, text: &str);

	/// Replaces all children of `element` with a single text node, or with nothing if `text` is empty.
	fn set_text_content(&self, element: &Self::Node, text: &str);

	fn set_attribute(&self, element: &Self::Node, namespace: Option<&str>, name: &str, value: &str);

	fn remove_attribute(&self, element: &Self::Node, name: &str);

	fn set_property(&self, element: &Self::Node, name: &str, value: &Value);

	/// Reads a live property, [`Value::Null`] if it's not set.
	fn property(&self, element: &Self::Node, name: &str) -> Value;

	/// Installs `handler` as the `name` (for example `"onclick"`) handler of `element`, replacing any previous one.
	fn set_event_handler(&self, element: &Self::Node, name: &str, handler: Handler<Self>);

	fn add_class(&self, element: &Self::Node, class: &str);

	fn remove_class(&self, element: &Self::Node, class: &str);

	/// Sets an inline style by CSS property name. An empty `value` clears the style.
	fn set_style(&self, element: &Self::Node, name: &str, value: &str);
}
