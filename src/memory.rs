//! A headless [`Target`] that keeps its tree in memory.
//!
//! Besides running projections without a browser, it records a journal of every mutation,
//! can dispatch events to installed handlers and renders its tree to an HTML-like string.

use crate::{
	target::Target,
	vnode::{Handler, Value},
};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter, Write as _},
};
use hashbrown::HashMap;
use std::{collections::BTreeMap, rc::Rc};
use tracing::warn;

/// A node in a [`MemoryDocument`]. Nodes are never freed, so ids stay valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// What handlers installed on a [`MemoryDocument`] receive.
#[derive(Debug, Clone)]
pub struct MemoryEvent {
	pub name: Rc<str>,
	pub target: NodeId,
}

/// One recorded mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
	CreateElement { node: NodeId, tag: String },
	CreateText { node: NodeId },
	Insert { parent: NodeId, node: NodeId },
	Remove { node: NodeId },
	SetText { node: NodeId },
	SetTextContent { node: NodeId },
	SetAttribute { node: NodeId, namespace: Option<String>, name: String },
	RemoveAttribute { node: NodeId, name: String },
	SetProperty { node: NodeId, name: String },
	SetEventHandler { node: NodeId, name: String },
	AddClass { node: NodeId, class: String },
	RemoveClass { node: NodeId, class: String },
	SetStyle { node: NodeId, name: String, value: String },
}

#[derive(Default)]
struct Element {
	tag: String,
	namespace: Option<String>,
	attributes: BTreeMap<String, String>,
	properties: HashMap<String, Value>,
	classes: Vec<String>,
	styles: BTreeMap<String, String>,
	handlers: HashMap<String, Handler<MemoryDocument>>,
}

enum Kind {
	Element(Element),
	Text(String),
}

struct Node {
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	kind: Kind,
}

#[derive(Default)]
struct Arena {
	nodes: Vec<Node>,
	journal: Vec<Mutation>,
}
impl Arena {
	fn push(&mut self, kind: Kind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(Node {
			parent: None,
			children: Vec::new(),
			kind,
		});
		id
	}

	fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
		match &mut self.nodes[node.0].kind {
			Kind::Element(element) => Some(element),
			Kind::Text(_) => {
				warn!(?node, "Expected an element but found a text node.");
				None
			}
		}
	}

	fn detach(&mut self, node: NodeId) -> bool {
		match self.nodes[node.0].parent.take() {
			Some(parent) => {
				self.nodes[parent.0].children.retain(|&child| child != node);
				true
			}
			None => false,
		}
	}
}

/// An in-memory tree. Clones are handles to the same tree.
#[derive(Clone, Default)]
pub struct MemoryDocument(Rc<RefCell<Arena>>);
impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element without journaling it, for use as a mount point.
	#[must_use]
	pub fn create_root(&self, tag: &str) -> NodeId {
		self.0.borrow_mut().push(Kind::Element(Element {
			tag: tag.to_string(),
			..Element::default()
		}))
	}

	/// The mutations recorded since creation or the last [`MemoryDocument::take_journal`].
	#[must_use]
	pub fn journal(&self) -> Vec<Mutation> {
		self.0.borrow().journal.clone()
	}

	pub fn take_journal(&self) -> Vec<Mutation> {
		core::mem::take(&mut self.0.borrow_mut().journal)
	}

	fn record(&self, mutation: Mutation) {
		self.0.borrow_mut().journal.push(mutation)
	}

	/// Invokes the `name` handler of `node`, if there is one. Returns whether a handler ran.
	pub fn dispatch(&self, node: NodeId, name: &str) -> bool {
		let handler = match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.handlers.get(name).cloned(),
			Kind::Text(_) => None,
		};
		// The handler may well mutate this document.
		match handler {
			Some(handler) => {
				handler.call(&MemoryEvent { name: name.into(), target: node });
				true
			}
			None => false,
		}
	}

	/// Simulates typing: sets the live `value` of `node`, then dispatches `oninput`.
	pub fn type_text(&self, node: NodeId, value: &str) -> bool {
		if let Some(element) = self.0.borrow_mut().element_mut(node) {
			element.properties.insert("value".to_string(), Value::from(value));
		}
		self.dispatch(node, "oninput")
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.0.borrow().nodes[node.0].children.clone()
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<String> {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => Some(element.tag.clone()),
			Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn namespace(&self, node: NodeId) -> Option<String> {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.namespace.clone(),
			Kind::Text(_) => None,
		}
	}

	/// The concatenated text of `node` and its descendants.
	#[must_use]
	pub fn text_content(&self, node: NodeId) -> String {
		fn collect(arena: &Arena, node: NodeId, into: &mut String) {
			match &arena.nodes[node.0].kind {
				Kind::Text(text) => into.push_str(text),
				Kind::Element(_) => {
					for &child in &arena.nodes[node.0].children {
						collect(arena, child, into)
					}
				}
			}
		}
		let mut text = String::new();
		collect(&self.0.borrow(), node, &mut text);
		text
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.attributes.get(name).cloned(),
			Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn classes(&self, node: NodeId) -> Vec<String> {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.classes.clone(),
			Kind::Text(_) => Vec::new(),
		}
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.styles.get(name).cloned(),
			Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn has_handler(&self, node: NodeId, name: &str) -> bool {
		match &self.0.borrow().nodes[node.0].kind {
			Kind::Element(element) => element.handlers.contains_key(name),
			Kind::Text(_) => false,
		}
	}

	/// Serializes `node` and its descendants. Attributes are sorted, classes and styles are rendered as attributes.
	#[must_use]
	pub fn to_html(&self, node: NodeId) -> String {
		fn write(arena: &Arena, node: NodeId, html: &mut String) -> fmt::Result {
			match &arena.nodes[node.0].kind {
				Kind::Text(text) => html.push_str(text),
				Kind::Element(element) => {
					write!(html, "<{}", element.tag)?;
					if let Some(Value::Text(id)) = element.properties.get("id") {
						write!(html, " id=\"{}\"", id)?;
					}
					if !element.classes.is_empty() {
						write!(html, " class=\"{}\"", element.classes.join(" "))?;
					}
					for (name, value) in &element.attributes {
						write!(html, " {}=\"{}\"", name, value)?;
					}
					if !element.styles.is_empty() {
						let styles: Vec<String> = element.styles.iter().map(|(name, value)| format!("{}: {}", name, value)).collect();
						write!(html, " style=\"{}\"", styles.join("; "))?;
					}
					html.push('>');
					for &child in &arena.nodes[node.0].children {
						write(arena, child, html)?;
					}
					write!(html, "</{}>", element.tag)?;
				}
			}
			Ok(())
		}
		let mut html = String::new();
		// Writing into a `String` doesn't fail.
		let _ = write(&self.0.borrow(), node, &mut html);
		html
	}
}
impl Debug for MemoryDocument {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let arena = self.0.borrow();
		f.debug_struct("MemoryDocument")
			.field("nodes", &arena.nodes.len())
			.field("journal", &arena.journal.len())
			.finish()
	}
}

impl Target for MemoryDocument {
	type Node = NodeId;
	type Event = MemoryEvent;

	fn create_element(&self, tag: &str, namespace: Option<&str>) -> NodeId {
		let node = self.0.borrow_mut().push(Kind::Element(Element {
			tag: tag.to_string(),
			namespace: namespace.map(ToString::to_string),
			..Element::default()
		}));
		self.record(Mutation::CreateElement { node, tag: tag.to_string() });
		node
	}

	fn create_text(&self, text: &str) -> NodeId {
		let node = self.0.borrow_mut().push(Kind::Text(text.to_string()));
		self.record(Mutation::CreateText { node });
		node
	}

	fn parent(&self, node: &NodeId) -> Option<NodeId> {
		self.0.borrow().nodes[node.0].parent
	}

	fn insert_before(&self, parent: &NodeId, node: &NodeId, reference: Option<&NodeId>) {
		{
			let mut arena = self.0.borrow_mut();
			arena.detach(*node);
			let children = &mut arena.nodes[parent.0].children;
			let index = match reference {
				None => children.len(),
				Some(reference) => match children.iter().position(|child| child == reference) {
					Some(index) => index,
					None => {
						warn!(?parent, ?reference, "Reference node isn't a child of the parent. Appending instead.");
						children.len()
					}
				},
			};
			children.insert(index, *node);
			arena.nodes[node.0].parent = Some(*parent);
		}
		self.record(Mutation::Insert { parent: *parent, node: *node });
	}

	fn remove(&self, node: &NodeId) {
		let removed = self.0.borrow_mut().detach(*node);
		if removed {
			self.record(Mutation::Remove { node: *node });
		}
	}

	fn set_text(&self, node: &NodeId, text: &str) {
		match &mut self.0.borrow_mut().nodes[node.0].kind {
			Kind::Text(data) => *data = text.to_string(),
			Kind::Element(_) => warn!(?node, "Expected a text node but found an element."),
		}
		self.record(Mutation::SetText { node: *node });
	}

	fn set_text_content(&self, element: &NodeId, text: &str) {
		let children = self.children(*element);
		{
			let mut arena = self.0.borrow_mut();
			for child in children {
				arena.detach(child);
			}
		}
		if !text.is_empty() {
			let text_node = self.0.borrow_mut().push(Kind::Text(text.to_string()));
			let mut arena = self.0.borrow_mut();
			arena.nodes[element.0].children.push(text_node);
			arena.nodes[text_node.0].parent = Some(*element);
		}
		self.record(Mutation::SetTextContent { node: *element });
	}

	fn set_attribute(&self, element: &NodeId, namespace: Option<&str>, name: &str, value: &str) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			data.attributes.insert(name.to_string(), value.to_string());
		}
		self.record(Mutation::SetAttribute {
			node: *element,
			namespace: namespace.map(ToString::to_string),
			name: name.to_string(),
		});
	}

	fn remove_attribute(&self, element: &NodeId, name: &str) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			data.attributes.remove(name);
		}
		self.record(Mutation::RemoveAttribute { node: *element, name: name.to_string() });
	}

	fn set_property(&self, element: &NodeId, name: &str, value: &Value) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			data.properties.insert(name.to_string(), value.clone());
		}
		self.record(Mutation::SetProperty { node: *element, name: name.to_string() });
	}

	fn property(&self, element: &NodeId, name: &str) -> Value {
		match &self.0.borrow().nodes[element.0].kind {
			Kind::Element(data) => data.properties.get(name).cloned().unwrap_or(Value::Null),
			Kind::Text(_) => Value::Null,
		}
	}

	fn set_event_handler(&self, element: &NodeId, name: &str, handler: Handler<Self>) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			data.handlers.insert(name.to_string(), handler);
		}
		self.record(Mutation::SetEventHandler { node: *element, name: name.to_string() });
	}

	fn add_class(&self, element: &NodeId, class: &str) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			if !data.classes.iter().any(|existing| existing == class) {
				data.classes.push(class.to_string());
			}
		}
		self.record(Mutation::AddClass { node: *element, class: class.to_string() });
	}

	fn remove_class(&self, element: &NodeId, class: &str) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			data.classes.retain(|existing| existing != class);
		}
		self.record(Mutation::RemoveClass { node: *element, class: class.to_string() });
	}

	fn set_style(&self, element: &NodeId, name: &str, value: &str) {
		if let Some(data) = self.0.borrow_mut().element_mut(*element) {
			if value.is_empty() {
				data.styles.remove(name);
			} else {
				data.styles.insert(name.to_string(), value.to_string());
			}
		}
		self.record(Mutation::SetStyle {
			node: *element,
			name: name.to_string(),
			value: value.to_string(),
		});
	}
}
