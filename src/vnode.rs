//! The immutable virtual tree exchanged between the builder, the reconciler and the application.

use crate::{options::ProjectionOptions, target::Target, Error};
use core::{
	any::Any,
	cell::RefCell,
	fmt::{self, Debug, Display, Formatter},
};
use hashbrown::HashMap;
use std::rc::Rc;

/// A parsed element selector like `"input.field.wide#name"`.
///
/// Equality is textual: two selectors are the same iff they were written the same way.
#[derive(Clone)]
pub struct Selector {
	raw: Rc<str>,
	tag: Rc<str>,
	classes: Vec<Rc<str>>,
	id: Option<Rc<str>>,
}
impl Selector {
	/// Splits `raw` at `.` and `#` boundaries.
	///
	/// The leading bare token is the tag name (`"div"` if it's empty), `.`-prefixed tokens are classes and the last `#`-prefixed token is the id.
	#[must_use]
	pub fn parse(raw: &str) -> Self {
		fn token_end(s: &str) -> usize {
			s.find(&['.', '#'][..]).unwrap_or_else(|| s.len())
		}

		let tag_end = token_end(raw);
		let tag = if tag_end == 0 { "div" } else { &raw[..tag_end] };

		let mut classes = Vec::new();
		let mut id = None;
		let mut rest = &raw[tag_end..];
		while let Some(sigil) = rest.chars().next() {
			let body = &rest[sigil.len_utf8()..];
			let end = token_end(body);
			let token = &body[..end];
			if !token.is_empty() {
				if sigil == '.' {
					classes.push(token.into())
				} else {
					id = Some(token.into())
				}
			}
			rest = &body[end..];
		}

		Self {
			raw: raw.into(),
			tag: tag.into(),
			classes,
			id,
		}
	}

	fn text() -> Self {
		Self {
			raw: "".into(),
			tag: "".into(),
			classes: Vec::new(),
			id: None,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn classes(&self) -> &[Rc<str>] {
		&self.classes
	}

	#[must_use]
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	/// Whether this selector opens an SVG subtree.
	#[must_use]
	pub fn is_svg(&self) -> bool {
		&*self.tag == "svg"
	}
}
impl PartialEq for Selector {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}
impl Eq for Selector {}
impl Debug for Selector {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		Debug::fmt(&*self.raw, f)
	}
}
impl Display for Selector {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

/// Explicit identity of an element among its siblings.
///
/// [`Key::Ref`] compares by pointer, the other variants by value.
#[derive(Clone)]
pub enum Key {
	Int(i64),
	Text(Rc<str>),
	Ref(Rc<dyn Any>),
}
impl PartialEq for Key {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Key::Int(a), Key::Int(b)) => a == b,
			(Key::Text(a), Key::Text(b)) => a == b,
			(Key::Ref(a), Key::Ref(b)) => Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const (),
			_ => false,
		}
	}
}
impl Debug for Key {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			Key::Int(int) => write!(f, "Key::Int({})", int),
			Key::Text(text) => write!(f, "Key::Text({:?})", text),
			Key::Ref(r#ref) => write!(f, "Key::Ref({:p})", Rc::as_ptr(r#ref) as *const ()),
		}
	}
}
impl From<i64> for Key {
	fn from(int: i64) -> Self {
		Key::Int(int)
	}
}
impl From<i32> for Key {
	fn from(int: i32) -> Self {
		Key::Int(int.into())
	}
}
impl From<u32> for Key {
	fn from(int: u32) -> Self {
		Key::Int(int.into())
	}
}
impl From<usize> for Key {
	#[allow(clippy::cast_possible_wrap)]
	fn from(int: usize) -> Self {
		Key::Int(int as i64)
	}
}
impl From<&str> for Key {
	fn from(text: &str) -> Self {
		Key::Text(text.into())
	}
}
impl From<String> for Key {
	fn from(text: String) -> Self {
		Key::Text(text.into())
	}
}
impl From<Rc<str>> for Key {
	fn from(text: Rc<str>) -> Self {
		Key::Text(text)
	}
}

/// A plain value as stored on a live node.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
	Text(Rc<str>),
	Flag(bool),
	Number(f64),
	Null,
}
impl Value {
	/// Truthiness as the browser would see it.
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			Value::Text(text) => !text.is_empty(),
			Value::Flag(flag) => *flag,
			Value::Number(number) => *number != 0.0 && !number.is_nan(),
			Value::Null => false,
		}
	}

	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Text(text) => Some(text),
			_ => None,
		}
	}
}
impl From<&str> for Value {
	fn from(text: &str) -> Self {
		Value::Text(text.into())
	}
}
impl From<bool> for Value {
	fn from(flag: bool) -> Self {
		Value::Flag(flag)
	}
}
impl From<f64> for Value {
	fn from(number: f64) -> Self {
		Value::Number(number)
	}
}

/// An event handler. Handlers compare by identity, so create them once, outside of render functions.
pub struct Handler<T: Target>(Rc<dyn Fn(&T::Event)>);
impl<T: Target> Handler<T> {
	pub fn new(handler: impl Fn(&T::Event) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &T::Event) {
		(self.0)(event)
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0) as *const () == Rc::as_ptr(&other.0) as *const ()
	}
}
impl<T: Target> Clone for Handler<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}
impl<T: Target> Debug for Handler<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
	}
}

/// A property value, tagged once at construction time.
///
/// Strings become attributes (except `value` and `innerHTML`), handlers are installed on `on*` properties,
/// everything else is assigned as a live property.
pub enum PropValue<T: Target> {
	Attribute(Rc<str>),
	Flag(bool),
	Number(f64),
	Null,
	Handler(Handler<T>),
}
impl<T: Target> PropValue<T> {
	#[must_use]
	pub fn is_truthy(&self) -> bool {
		match self {
			PropValue::Handler(_) => true,
			other => other.to_value().map_or(false, |value| value.is_truthy()),
		}
	}

	/// The plain value to store on a live node. [`None`] for handlers.
	#[must_use]
	pub fn to_value(&self) -> Option<Value> {
		match self {
			PropValue::Attribute(text) => Some(Value::Text(Rc::clone(text))),
			PropValue::Flag(flag) => Some(Value::Flag(*flag)),
			PropValue::Number(number) => Some(Value::Number(*number)),
			PropValue::Null => Some(Value::Null),
			PropValue::Handler(_) => None,
		}
	}
}
impl<T: Target> Clone for PropValue<T> {
	fn clone(&self) -> Self {
		match self {
			PropValue::Attribute(text) => PropValue::Attribute(Rc::clone(text)),
			PropValue::Flag(flag) => PropValue::Flag(*flag),
			PropValue::Number(number) => PropValue::Number(*number),
			PropValue::Null => PropValue::Null,
			PropValue::Handler(handler) => PropValue::Handler(handler.clone()),
		}
	}
}
impl<T: Target> PartialEq for PropValue<T> {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(PropValue::Handler(a), PropValue::Handler(b)) => a.ptr_eq(b),
			(PropValue::Handler(_), _) | (_, PropValue::Handler(_)) => false,
			(a, b) => a.to_value() == b.to_value(),
		}
	}
}
impl<T: Target> Debug for PropValue<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		match self {
			PropValue::Attribute(text) => f.debug_tuple("Attribute").field(text).finish(),
			PropValue::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
			PropValue::Number(number) => f.debug_tuple("Number").field(number).finish(),
			PropValue::Null => f.write_str("Null"),
			PropValue::Handler(handler) => Debug::fmt(handler, f),
		}
	}
}
impl<T: Target> From<&str> for PropValue<T> {
	fn from(text: &str) -> Self {
		PropValue::Attribute(text.into())
	}
}
impl<T: Target> From<String> for PropValue<T> {
	fn from(text: String) -> Self {
		PropValue::Attribute(text.into())
	}
}
impl<T: Target> From<Rc<str>> for PropValue<T> {
	fn from(text: Rc<str>) -> Self {
		PropValue::Attribute(text)
	}
}
impl<T: Target> From<bool> for PropValue<T> {
	fn from(flag: bool) -> Self {
		PropValue::Flag(flag)
	}
}
impl<T: Target> From<f64> for PropValue<T> {
	fn from(number: f64) -> Self {
		PropValue::Number(number)
	}
}
impl<T: Target> From<i32> for PropValue<T> {
	fn from(number: i32) -> Self {
		PropValue::Number(number.into())
	}
}
impl<T: Target> From<u32> for PropValue<T> {
	fn from(number: u32) -> Self {
		PropValue::Number(number.into())
	}
}
impl<T: Target> From<Handler<T>> for PropValue<T> {
	fn from(handler: Handler<T>) -> Self {
		PropValue::Handler(handler)
	}
}
impl<T: Target, V: Into<PropValue<T>>> From<Option<V>> for PropValue<T> {
	fn from(value: Option<V>) -> Self {
		value.map_or(PropValue::Null, Into::into)
	}
}

/// What lifecycle hooks get to see.
pub struct HookContext<'a, T: Target> {
	pub target: &'a T,
	pub node: &'a T::Node,
	pub options: &'a ProjectionOptions<T>,
	pub selector: &'a Selector,
	pub properties: &'a Properties<T>,
	pub children: &'a [VNode<T>],
}

pub type Hook<T> = Rc<dyn Fn(&HookContext<'_, T>)>;

/// Called with the new and the previous properties after anything about an element changed.
pub type UpdateAnimation<T> = Rc<dyn Fn(&T, &<T as Target>::Node, &Properties<T>, &Properties<T>)>;

/// Detaches a node that was kept around for its exit animation.
pub struct Detach(Box<dyn FnOnce()>);
impl Detach {
	pub(crate) fn new(detach: impl FnOnce() + 'static) -> Self {
		Self(Box::new(detach))
	}

	pub fn detach(self) {
		(self.0)()
	}
}
impl Debug for Detach {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str("Detach")
	}
}

/// Runs after a node was inserted.
pub enum EnterAnimation<T: Target> {
	Callback(Rc<dyn Fn(&T, &T::Node, &Properties<T>)>),
	/// Delegated to [`ProjectionOptions::transitions`].
	Named(Rc<str>),
}
impl<T: Target> EnterAnimation<T> {
	pub fn callback(animation: impl Fn(&T, &T::Node, &Properties<T>) + 'static) -> Self {
		EnterAnimation::Callback(Rc::new(animation))
	}
}
impl<T: Target> Clone for EnterAnimation<T> {
	fn clone(&self) -> Self {
		match self {
			EnterAnimation::Callback(callback) => EnterAnimation::Callback(Rc::clone(callback)),
			EnterAnimation::Named(name) => EnterAnimation::Named(Rc::clone(name)),
		}
	}
}

/// Runs instead of detaching a node. The node stays in place until the [`Detach`] is used.
pub enum ExitAnimation<T: Target> {
	Callback(Rc<dyn Fn(&T, &T::Node, Detach, &Properties<T>)>),
	/// Delegated to [`ProjectionOptions::transitions`].
	Named(Rc<str>),
}
impl<T: Target> ExitAnimation<T> {
	pub fn callback(animation: impl Fn(&T, &T::Node, Detach, &Properties<T>) + 'static) -> Self {
		ExitAnimation::Callback(Rc::new(animation))
	}
}
impl<T: Target> Clone for ExitAnimation<T> {
	fn clone(&self) -> Self {
		match self {
			ExitAnimation::Callback(callback) => ExitAnimation::Callback(Rc::clone(callback)),
			ExitAnimation::Named(name) => ExitAnimation::Named(Rc::clone(name)),
		}
	}
}

/// The properties of an element node.
///
/// `key`, `classes`, `styles` and the lifecycle and animation callbacks are structured,
/// everything else goes through [`Properties::set`].
pub struct Properties<T: Target> {
	pub(crate) key: Option<Key>,
	pub(crate) classes: HashMap<Rc<str>, bool>,
	pub(crate) styles: HashMap<Rc<str>, PropValue<T>>,
	pub(crate) values: HashMap<Rc<str>, PropValue<T>>,
	pub(crate) after_create: Option<Hook<T>>,
	pub(crate) after_update: Option<Hook<T>>,
	pub(crate) enter_animation: Option<EnterAnimation<T>>,
	pub(crate) exit_animation: Option<ExitAnimation<T>>,
	pub(crate) update_animation: Option<UpdateAnimation<T>>,
}
impl<T: Target> Default for Properties<T> {
	fn default() -> Self {
		Self {
			key: None,
			classes: HashMap::new(),
			styles: HashMap::new(),
			values: HashMap::new(),
			after_create: None,
			after_update: None,
			enter_animation: None,
			exit_animation: None,
			update_animation: None,
		}
	}
}
impl<T: Target> Properties<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<Key>) -> Self {
		self.key = Some(key.into());
		self
	}

	#[must_use]
	pub fn class(mut self, name: impl Into<Rc<str>>, on: bool) -> Self {
		self.classes.insert(name.into(), on);
		self
	}

	/// Sets an inline style by CSS property name. Values must be strings, falsy values clear the style.
	#[must_use]
	pub fn style(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue<T>>) -> Self {
		self.styles.insert(name.into(), value.into());
		self
	}

	/// Sets a property, or an attribute for string values on elements other than `value` and `innerHTML`.
	///
	/// [`PropValue::Handler`]s are installed as event handlers only if `name` starts with `on`.
	/// Under any other name they are ignored with a warning, since targets can't store handlers as plain properties.
	#[must_use]
	pub fn set(mut self, name: impl Into<Rc<str>>, value: impl Into<PropValue<T>>) -> Self {
		self.values.insert(name.into(), value.into());
		self
	}

	/// Shorthand for [`.set(name, PropValue::Handler(handler))`](`Properties::set`).
	///
	/// `name` must start with `on`, like `"onclick"`. Handlers under other names are ignored (with a warning).
	#[must_use]
	pub fn on(self, name: impl Into<Rc<str>>, handler: &Handler<T>) -> Self {
		self.set(name, PropValue::Handler(handler.clone()))
	}

	#[must_use]
	pub fn after_create(mut self, hook: impl Fn(&HookContext<'_, T>) + 'static) -> Self {
		self.after_create = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn after_update(mut self, hook: impl Fn(&HookContext<'_, T>) + 'static) -> Self {
		self.after_update = Some(Rc::new(hook));
		self
	}

	#[must_use]
	pub fn enter_animation(mut self, animation: EnterAnimation<T>) -> Self {
		self.enter_animation = Some(animation);
		self
	}

	#[must_use]
	pub fn exit_animation(mut self, animation: ExitAnimation<T>) -> Self {
		self.exit_animation = Some(animation);
		self
	}

	#[must_use]
	pub fn update_animation(mut self, animation: impl Fn(&T, &T::Node, &Properties<T>, &Properties<T>) + 'static) -> Self {
		self.update_animation = Some(Rc::new(animation));
		self
	}

	#[must_use]
	pub fn get_key(&self) -> Option<&Key> {
		self.key.as_ref()
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&PropValue<T>> {
		self.values.get(name)
	}

	#[must_use]
	pub fn get_style(&self, name: &str) -> Option<&PropValue<T>> {
		self.styles.get(name)
	}

	#[must_use]
	pub fn has_class(&self, name: &str) -> bool {
		self.classes.get(name).copied().unwrap_or(false)
	}
}
impl<T: Target> Debug for Properties<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Properties")
			.field("key", &self.key)
			.field("classes", &self.classes)
			.field("styles", &self.styles)
			.field("values", &self.values)
			.field("after_create", &self.after_create.is_some())
			.field("after_update", &self.after_update.is_some())
			.field("enter_animation", &self.enter_animation.is_some())
			.field("exit_animation", &self.exit_animation.is_some())
			.field("update_animation", &self.update_animation.is_some())
			.finish()
	}
}

/// An immutable virtual node, shared by reference.
///
/// Cloning is cheap and yields the *same* node: [`VNode::ptr_eq`] holds between clones,
/// which lets the reconciler skip subtrees that were reused from a previous render.
///
/// The only state written after construction is the bound target node. It's set when the node is created in
/// (or carried forward into) the target tree, and cleared again once the node leaves it, so that a cached
/// subtree can be shown again later.
pub struct VNode<T: Target>(Rc<VNodeData<T>>);

struct VNodeData<T: Target> {
	selector: Selector,
	properties: Option<Properties<T>>,
	children: Vec<VNode<T>>,
	text: Option<Rc<str>>,
	dom_node: RefCell<Option<T::Node>>,
}

impl<T: Target> VNode<T> {
	/// A text node.
	pub fn new_text(text: impl Into<Rc<str>>) -> Self {
		Self(Rc::new(VNodeData {
			selector: Selector::text(),
			properties: None,
			children: Vec::new(),
			text: Some(text.into()),
			dom_node: RefCell::new(None),
		}))
	}

	/// An element node. `text` is a text payload used in place of a single text child.
	pub fn new_element(selector: Selector, properties: Option<Properties<T>>, children: Vec<VNode<T>>, text: Option<Rc<str>>) -> Self {
		Self(Rc::new(VNodeData {
			selector,
			properties,
			children,
			text,
			dom_node: RefCell::new(None),
		}))
	}

	#[must_use]
	pub fn selector(&self) -> &Selector {
		&self.0.selector
	}

	#[must_use]
	pub fn properties(&self) -> Option<&Properties<T>> {
		self.0.properties.as_ref()
	}

	#[must_use]
	pub fn children(&self) -> &[VNode<T>] {
		&self.0.children
	}

	#[must_use]
	pub fn text(&self) -> Option<&str> {
		self.0.text.as_deref()
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		self.0.selector.as_str().is_empty()
	}

	#[must_use]
	pub fn key(&self) -> Option<&Key> {
		self.properties().and_then(Properties::get_key)
	}

	/// The target node this virtual node is bound to while it's part of a target tree.
	#[must_use]
	pub fn dom_node(&self) -> Option<T::Node> {
		self.0.dom_node.borrow().clone()
	}

	#[must_use]
	pub fn ptr_eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}

	/// Whether `self` and `other` represent the same target node across renders.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		same(self, other)
	}

	pub(crate) fn dom_node_or_err(&self) -> Result<T::Node, Error> {
		self.dom_node().ok_or_else(|| Error::NotCreated(self.selector().to_string()))
	}

	/// Fails if `self` is still bound to another node, which means it appears twice in a live tree.
	pub(crate) fn bind(&self, node: T::Node) -> Result<T::Node, Error> {
		let mut bound = self.0.dom_node.borrow_mut();
		match &*bound {
			Some(existing) if *existing != node => Err(Error::AlreadyBound(self.selector().to_string())),
			_ => Ok(bound.get_or_insert(node).clone()),
		}
	}

	/// Forgets the bound node of `self` only. Its children keep theirs.
	pub(crate) fn unbind(&self) {
		self.0.dom_node.borrow_mut().take();
	}

	/// Forgets the bound nodes of the whole subtree after it left the target tree.
	pub(crate) fn unbind_subtree(&self) {
		self.unbind();
		for child in self.children() {
			child.unbind_subtree();
		}
	}
}
impl<T: Target> Clone for VNode<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}
impl<T: Target> Debug for VNode<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		if self.is_text() {
			return f.debug_tuple("Text").field(&self.text()).finish();
		}
		f.debug_struct("Element")
			.field("selector", self.selector())
			.field("properties", &self.properties())
			.field("text", &self.text())
			.field("children", &self.children())
			.field("dom_node", &self.dom_node())
			.finish()
	}
}

/// The keyed matcher: `a` and `b` stand for the same target node iff their selectors match textually
/// and either both lack properties or both have properties with equal keys (absent keys are equal).
#[must_use]
pub fn same<T: Target>(a: &VNode<T>, b: &VNode<T>) -> bool {
	if a.selector() != b.selector() {
		return false;
	}
	match (a.properties(), b.properties()) {
		(Some(a), Some(b)) => a.key == b.key,
		(None, None) => true,
		_ => false,
	}
}
