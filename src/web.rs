//! The browser [`Target`] and [`Scheduler`], over [`web_sys`].
//!
//! Host failures don't abort a projection: they are logged as errors and the affected mutation is skipped.

use crate::{
	scheduler::{FrameHandle, Scheduler},
	target::Target,
	vnode::{Handler, Value},
	Error,
};
use js_sys::{Function, Reflect};
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue, UnwrapThrowExt};

/// Projects into a [`web_sys::Document`].
#[derive(Debug, Clone)]
pub struct WebDocument {
	document: web_sys::Document,
}
impl WebDocument {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self { document }
	}

	/// The document of the global `window`.
	///
	/// # Panics
	///
	/// Iff there is no global `window` or it has no document.
	#[must_use]
	pub fn from_window() -> Self {
		let document = web_sys::window()
			.expect_throw("projector-dom: No global `window` found.")
			.document()
			.expect_throw("projector-dom: No document found on `window`.");
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}
}

fn to_js(value: &Value) -> JsValue {
	match value {
		Value::Text(text) => JsValue::from_str(text),
		Value::Flag(flag) => JsValue::from_bool(*flag),
		Value::Number(number) => JsValue::from_f64(*number),
		Value::Null => JsValue::NULL,
	}
}

fn from_js(value: &JsValue) -> Value {
	if let Some(text) = value.as_string() {
		Value::Text(text.into())
	} else if let Some(flag) = value.as_bool() {
		Value::Flag(flag)
	} else if let Some(number) = value.as_f64() {
		Value::Number(number)
	} else {
		Value::Null
	}
}

fn as_element(node: &web_sys::Node) -> Option<&web_sys::Element> {
	let element = node.dyn_ref::<web_sys::Element>();
	if element.is_none() {
		error!("Expected `web_sys::Element` but found {:?}.", node);
	}
	element
}

fn style_of(node: &web_sys::Node) -> Option<web_sys::CssStyleDeclaration> {
	if let Some(html_element) = node.dyn_ref::<web_sys::HtmlElement>() {
		Some(html_element.style())
	} else if let Some(svg_element) = node.dyn_ref::<web_sys::SvgElement>() {
		Some(svg_element.style())
	} else {
		error!("Expected a styleable element but found {:?}.", node);
		None
	}
}

impl Target for WebDocument {
	type Node = web_sys::Node;
	type Event = web_sys::Event;

	fn create_element(&self, tag: &str, namespace: Option<&str>) -> web_sys::Node {
		match namespace {
			None => self.document.create_element(tag),
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
		}
		.expect_throw("projector-dom: Failed to create element.")
		.into()
	}

	fn create_text(&self, text: &str) -> web_sys::Node {
		self.document.create_text_node(text).into()
	}

	fn parent(&self, node: &web_sys::Node) -> Option<web_sys::Node> {
		node.parent_node()
	}

	fn insert_before(&self, parent: &web_sys::Node, node: &web_sys::Node, reference: Option<&web_sys::Node>) {
		if let Err(error) = parent.insert_before(node, reference) {
			error!("Failed to insert node: {:?}", error)
		}
	}

	fn remove(&self, node: &web_sys::Node) {
		if let Some(parent) = node.parent_node() {
			if let Err(error) = parent.remove_child(node) {
				error!("Failed to remove the node: {:?}", error)
			}
		}
	}

	fn set_text(&self, node: &web_sys::Node, text: &str) {
		node.set_node_value(Some(text))
	}

	fn set_text_content(&self, element: &web_sys::Node, text: &str) {
		element.set_text_content(if text.is_empty() { None } else { Some(text) })
	}

	fn set_attribute(&self, element: &web_sys::Node, namespace: Option<&str>, name: &str, value: &str) {
		if let Some(element) = as_element(element) {
			let result = match namespace {
				None => element.set_attribute(name, value),
				namespace @ Some(_) => element.set_attribute_ns(namespace, name, value),
			};
			if let Err(error) = result {
				error!("Failed to set attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn remove_attribute(&self, element: &web_sys::Node, name: &str) {
		if let Some(element) = as_element(element) {
			if let Err(error) = element.remove_attribute(name) {
				error!("Failed to remove attribute {:?}: {:?}", name, error)
			}
		}
	}

	fn set_property(&self, element: &web_sys::Node, name: &str, value: &Value) {
		if let Err(error) = Reflect::set(element, &JsValue::from_str(name), &to_js(value)) {
			error!("Failed to set property {:?}: {:?}", name, error)
		}
	}

	fn property(&self, element: &web_sys::Node, name: &str) -> Value {
		match Reflect::get(element, &JsValue::from_str(name)) {
			Ok(value) => from_js(&value),
			Err(error) => {
				error!("Failed to read property {:?}: {:?}", name, error);
				Value::Null
			}
		}
	}

	fn set_event_handler(&self, element: &web_sys::Node, name: &str, handler: Handler<Self>) {
		// The browser owns the function from here on. It's collected once the element drops it.
		let closure = Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&event)) as Box<dyn Fn(web_sys::Event)>).into_js_value();
		if let Err(error) = Reflect::set(element, &JsValue::from_str(name), &closure) {
			error!("Failed to install event handler {:?}: {:?}", name, error)
		}
	}

	fn add_class(&self, element: &web_sys::Node, class: &str) {
		if let Some(element) = as_element(element) {
			if let Err(error) = element.class_list().add_1(class) {
				error!("Failed to add class {:?}: {:?}", class, error)
			}
		}
	}

	fn remove_class(&self, element: &web_sys::Node, class: &str) {
		if let Some(element) = as_element(element) {
			if let Err(error) = element.class_list().remove_1(class) {
				error!("Failed to remove class {:?}: {:?}", class, error)
			}
		}
	}

	fn set_style(&self, element: &web_sys::Node, name: &str, value: &str) {
		if let Some(style) = style_of(element) {
			let result = if value.is_empty() { style.remove_property(name).map(drop) } else { style.set_property(name, value) };
			if let Err(error) = result {
				error!("Failed to set style {:?}: {:?}", name, error)
			}
		}
	}
}

/// Schedules frames with `requestAnimationFrame`.
#[derive(Debug, Clone)]
pub struct AnimationFrameScheduler {
	window: web_sys::Window,
}
impl AnimationFrameScheduler {
	#[must_use]
	pub fn new(window: web_sys::Window) -> Self {
		Self { window }
	}

	/// # Panics
	///
	/// Iff there is no global `window`.
	#[must_use]
	pub fn from_window() -> Self {
		Self::new(web_sys::window().expect_throw("projector-dom: No global `window` found."))
	}
}
impl Scheduler for AnimationFrameScheduler {
	fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle, Error> {
		let callback = Closure::once_into_js(move || callback());
		match self.window.request_animation_frame(callback.unchecked_ref::<Function>()) {
			Ok(handle) => {
				trace!(handle, "Requested animation frame.");
				Ok(FrameHandle(handle))
			}
			Err(error) => Err(Error::Scheduler(format!("{:?}", error))),
		}
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		if let Err(error) = self.window.cancel_animation_frame(handle.0) {
			error!("Failed to cancel animation frame: {:?}", error)
		}
	}
}
