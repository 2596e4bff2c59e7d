use crate::{
	target::Target,
	vnode::{Detach, Handler, Properties},
};
use core::fmt::{self, Debug, Formatter};
use std::rc::Rc;

pub const NAMESPACE_SVG: &str = "http://www.w3.org/2000/svg";
pub const NAMESPACE_XLINK: &str = "http://www.w3.org/1999/xlink";

/// Pluggable strategy for string-named enter and exit animations.
pub trait Transitions<T: Target> {
	fn enter(&self, node: &T::Node, properties: &Properties<T>, animation: &str);

	/// Must eventually call `detach` unless the node should stay in the target tree.
	fn exit(&self, node: &T::Node, properties: &Properties<T>, animation: &str, detach: Detach);
}

/// Applies one inline style. Receives the target, the element, the CSS property name and the (possibly empty) value.
pub type StyleApplier<T> = Rc<dyn Fn(&T, &<T as Target>::Node, &str, &str)>;

/// Wraps an `on*` handler before it's installed. Receives the property name, the handler and the element.
pub type EventHandlerInterceptor<T> = Rc<dyn Fn(&str, Handler<T>, &<T as Target>::Node) -> Handler<T>>;

/// Configuration passed down through every create and update call.
///
/// This is an immutable value: Entering an `svg` subtree derives a copy with [`NAMESPACE_SVG`] for that subtree only.
/// Cloning is cheap.
pub struct ProjectionOptions<T: Target> {
	pub namespace: Option<Rc<str>>,
	pub style_applier: StyleApplier<T>,
	pub event_handler_interceptor: Option<EventHandlerInterceptor<T>>,
	pub transitions: Option<Rc<dyn Transitions<T>>>,
}
impl<T: Target> Default for ProjectionOptions<T> {
	/// No namespace, styles go straight to [`Target::set_style`], no interceptor and no transitions.
	fn default() -> Self {
		Self {
			namespace: None,
			style_applier: Rc::new(|target: &T, node: &T::Node, name: &str, value: &str| target.set_style(node, name, value)),
			event_handler_interceptor: None,
			transitions: None,
		}
	}
}
impl<T: Target> Clone for ProjectionOptions<T> {
	fn clone(&self) -> Self {
		Self {
			namespace: self.namespace.clone(),
			style_applier: Rc::clone(&self.style_applier),
			event_handler_interceptor: self.event_handler_interceptor.clone(),
			transitions: self.transitions.clone(),
		}
	}
}
impl<T: Target> ProjectionOptions<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_namespace(&self, namespace: &str) -> Self {
		Self {
			namespace: Some(namespace.into()),
			..self.clone()
		}
	}

	#[must_use]
	pub fn with_style_applier(self, style_applier: impl Fn(&T, &T::Node, &str, &str) + 'static) -> Self {
		Self {
			style_applier: Rc::new(style_applier),
			..self
		}
	}

	#[must_use]
	pub fn with_event_handler_interceptor(self, interceptor: impl Fn(&str, Handler<T>, &T::Node) -> Handler<T> + 'static) -> Self {
		Self {
			event_handler_interceptor: Some(Rc::new(interceptor)),
			..self
		}
	}

	#[must_use]
	pub fn with_transitions(self, transitions: impl Transitions<T> + 'static) -> Self {
		Self {
			transitions: Some(Rc::new(transitions)),
			..self
		}
	}

	#[must_use]
	pub fn is_svg(&self) -> bool {
		self.namespace.as_deref() == Some(NAMESPACE_SVG)
	}
}
impl<T: Target> Debug for ProjectionOptions<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ProjectionOptions")
			.field("namespace", &self.namespace)
			.field("event_handler_interceptor", &self.event_handler_interceptor.is_some())
			.field("transitions", &self.transitions.is_some())
			.finish()
	}
}
