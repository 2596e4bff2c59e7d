//! The reconciler: creates target subtrees from virtual trees and diffs virtual tree pairs into target mutations.

use crate::{
	error::ChildOperation,
	options::{ProjectionOptions, NAMESPACE_SVG, NAMESPACE_XLINK},
	target::Target,
	vnode::{Detach, EnterAnimation, ExitAnimation, Handler, HookContext, PropValue, Properties, VNode, Value},
	Error,
};
use std::borrow::Cow;
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Live property that remembers the last value an `oninput` handler saw, so that renders lagging behind the user don't clobber their input.
pub const INPUT_VALUE_PROPERTY: &str = "oninput-value";

/// Text payloads and attribute values only make it into logs with the `dangerous-logging` feature.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"<redacted>"
	}
}

/// Borrows a target to apply virtual trees to it.
///
/// # Correct Use
///
/// Virtual trees passed to [`DomDiffer::update_dom`] must be the ones that were previously created or updated against the same target.
/// The differ doesn't read the target tree to find out what's there, it trusts the bound nodes.
#[derive(Debug)]
pub struct DomDiffer<'a, T: Target> {
	target: &'a T,
}
impl<'a, T: Target> DomDiffer<'a, T> {
	#[must_use]
	pub fn new(target: &'a T) -> Self {
		Self { target }
	}

	/// Creates the target subtree for `vnode` and inserts it into `parent` before `insert_before`, or appends it.
	#[instrument(skip_all, fields(selector = %vnode.selector()))]
	pub fn create_dom(&self, vnode: &VNode<T>, parent: &T::Node, insert_before: Option<&T::Node>, options: &ProjectionOptions<T>) -> Result<(), Error> {
		if vnode.is_text() {
			let text = vnode.text().unwrap_or("");
			trace!(text = loggable(text), "Creating text node.");
			let node = vnode.bind(self.target.create_text(text))?;
			self.target.insert_before(parent, &node, insert_before);
			return Ok(());
		}

		let selector = vnode.selector();
		let svg_options;
		let options = if selector.is_svg() {
			svg_options = options.with_namespace(NAMESPACE_SVG);
			&svg_options
		} else {
			options
		};

		let node = self.target.create_element(selector.tag(), options.namespace.as_deref());
		if options.namespace.is_none() && selector.tag() == "input" {
			// Some hosts ignore changes to `type` after insertion.
			if let Some(PropValue::Attribute(r#type)) = vnode.properties().and_then(|properties| properties.get("type")) {
				self.target.set_attribute(&node, None, "type", r#type);
			}
		}
		let node = vnode.bind(node)?;
		self.target.insert_before(parent, &node, insert_before);

		for class in selector.classes() {
			self.target.add_class(&node, class);
		}
		if let Some(id) = selector.id() {
			self.target.set_property(&node, "id", &Value::from(id));
		}

		self.init_properties_and_children(&node, vnode, options)
	}

	/// Children come first, since some properties (like a `select`'s `value`) depend on them.
	pub(crate) fn init_properties_and_children(&self, node: &T::Node, vnode: &VNode<T>, options: &ProjectionOptions<T>) -> Result<(), Error> {
		for child in vnode.children() {
			self.create_dom(child, node, None, options)?;
		}
		if let Some(text) = vnode.text() {
			self.target.set_text_content(node, text);
		}

		if let Some(properties) = vnode.properties() {
			self.set_properties(node, properties, options)?;
			if let Some(after_create) = &properties.after_create {
				let span = trace_span!("after_create");
				let _enter = span.enter();
				after_create(&HookContext {
					target: self.target,
					node,
					options,
					selector: vnode.selector(),
					properties,
					children: vnode.children(),
				});
			}
		}
		Ok(())
	}

	/// Brings the target node bound to `previous` in line with `next` and carries the binding forward.
	/// `previous` is unbound afterwards.
	///
	/// Returns whether a text node's text changed. Element updates always return `false`.
	#[instrument(skip_all, fields(selector = %next.selector()))]
	pub fn update_dom(&self, previous: &VNode<T>, next: &VNode<T>, options: &ProjectionOptions<T>) -> Result<bool, Error> {
		if previous.ptr_eq(next) {
			trace!("Identical node. Skipping subtree.");
			return Ok(false);
		}

		let node = previous.dom_node_or_err()?;

		if next.is_text() {
			let text_updated = previous.text() != next.text();
			if text_updated {
				let text = next.text().unwrap_or("");
				trace!(text = loggable(text), "Updating text node.");
				self.target.set_text(&node, text);
			}
			next.bind(node)?;
			previous.unbind();
			return Ok(text_updated);
		}

		let svg_options;
		let options = if next.selector().is_svg() {
			svg_options = options.with_namespace(NAMESPACE_SVG);
			&svg_options
		} else {
			options
		};

		let mut updated = false;
		if previous.text() != next.text() {
			updated = true;
			// An empty text content also drops the previous text child before new children are diffed in.
			self.target.set_text_content(&node, next.text().unwrap_or(""));
		}
		updated |= self.update_children(next, &node, previous.children(), next.children(), options)?;
		updated |= self.update_properties(&node, previous.properties(), next.properties(), options)?;

		if let Some(properties) = next.properties() {
			if let Some(after_update) = &properties.after_update {
				let span = trace_span!("after_update");
				let _enter = span.enter();
				after_update(&HookContext {
					target: self.target,
					node: &node,
					options,
					selector: next.selector(),
					properties,
					children: next.children(),
				});
			}

			if updated {
				if let Some(update_animation) = &properties.update_animation {
					let empty = Properties::new();
					update_animation(self.target, &node, properties, previous.properties().unwrap_or(&empty));
				}
			}
		}

		next.bind(node)?;
		previous.unbind();
		Ok(false)
	}

	/// Merges `new_children` into the position of `old_children` below `parent_node`.
	///
	/// Both cursors only move forward. Old children that are skipped over but still wanted further along
	/// are moved rather than recreated. Returns whether anything about the children changed.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip_all, fields(parent = %parent.selector(), old = old_children.len(), new = new_children.len()))]
	pub fn update_children(&self, parent: &VNode<T>, parent_node: &T::Node, old_children: &[VNode<T>], new_children: &[VNode<T>], options: &ProjectionOptions<T>) -> Result<bool, Error> {
		let mut old_index = 0;
		let mut changed = false;
		// Indices of skipped old children that a later new child still matches.
		let mut deferred: Vec<usize> = Vec::new();

		for (new_index, new_child) in new_children.iter().enumerate() {
			if let Some(old_child) = old_children.get(old_index) {
				if old_child.same(new_child) {
					changed |= self.update_dom(old_child, new_child, options)?;
					old_index += 1;
					continue;
				}
			}

			let anchor = old_children.get(old_index).and_then(VNode::dom_node);

			if let Some(position) = deferred.iter().position(|&i| old_children[i].same(new_child)) {
				let moved = &old_children[deferred.remove(position)];
				let span = trace_span!("Moving child", selector = %moved.selector(), new_index);
				let _enter = span.enter();
				self.target.insert_before(parent_node, &moved.dom_node_or_err()?, anchor.as_ref());
				self.update_dom(moved, new_child, options)?;
				changed = true;
				continue;
			}

			if let Some(found) = find_index_of_child(old_children, new_child, old_index + 1) {
				for skipped in old_index..found {
					changed = true;
					let wanted_later = new_children[new_index + 1..].iter().any(|later| later.same(&old_children[skipped]));
					if wanted_later {
						trace!(skipped, "Deferring skipped child for a later move.");
						deferred.push(skipped);
					} else {
						self.node_to_remove(&old_children[skipped], options)?;
						check_distinguishable(old_children, skipped, parent, ChildOperation::Removed)?;
					}
				}
				changed |= self.update_dom(&old_children[found], new_child, options)?;
				old_index = found + 1;
			} else {
				let span = trace_span!("Inserting child", selector = %new_child.selector(), new_index);
				let _enter = span.enter();
				self.create_dom(new_child, parent_node, anchor.as_ref(), options)?;
				self.node_added(new_child, options)?;
				check_distinguishable(new_children, new_index, parent, ChildOperation::Added)?;
				changed = true;
			}
		}

		if STATIC_MAX_LEVEL >= Level::WARN && !deferred.is_empty() {
			warn!("{} deferred child(ren) were not claimed after all and will be removed.", deferred.len());
		}
		for removed in deferred.into_iter().chain(old_index..old_children.len()) {
			self.node_to_remove(&old_children[removed], options)?;
			check_distinguishable(old_children, removed, parent, ChildOperation::Removed)?;
			changed = true;
		}

		Ok(changed)
	}

	/// Applies `properties` to a freshly created `node`.
	#[instrument(skip_all)]
	pub fn set_properties(&self, node: &T::Node, properties: &Properties<T>, options: &ProjectionOptions<T>) -> Result<(), Error> {
		for (class, &on) in &properties.classes {
			if on {
				self.target.add_class(node, class);
			}
		}

		for (name, value) in &properties.styles {
			let name: &str = name;
			if value.is_truthy() {
				let value = style_str(name, value)?;
				(options.style_applier)(self.target, node, name, value);
			}
		}

		for (name, value) in &properties.values {
			let name: &str = name;
			check_property_name(name)?;
			match value {
				_ if name == "key" => (),
				PropValue::Null => (),
				PropValue::Handler(handler) => {
					if name.starts_with("on") {
						self.set_event_handler(node, name, handler.clone(), options);
					} else if STATIC_MAX_LEVEL >= Level::WARN {
						warn!("Ignoring handler on property {:?} that doesn't start with `on`.", name);
					}
				}
				PropValue::Attribute(text) if name != "value" && name != "innerHTML" => self.set_attribute(node, name, text, options),
				other => {
					if let Some(value) = other.to_value() {
						self.target.set_property(node, name, &value);
					}
				}
			}
		}
		Ok(())
	}

	/// Applies the differences between `previous` and `next` to `node`.
	///
	/// Returns whether any property changed.
	///
	/// `value` is compared against the live target property rather than `previous`, since the user may have edited it.
	/// It's overwritten only if the live value differs from the incoming one, and either the live value differs from what
	/// the last `oninput` event saw or the application now renders a different `value` than before.
	/// So a `value` the application changes wins over input typed since the last render,
	/// while a render that repeats its previous `value` leaves the typed text alone.
	#[allow(clippy::too_many_lines)]
	#[instrument(skip_all)]
	pub fn update_properties(&self, node: &T::Node, previous: Option<&Properties<T>>, next: Option<&Properties<T>>, options: &ProjectionOptions<T>) -> Result<bool, Error> {
		let next = match next {
			Some(next) => next,
			None => return Ok(false),
		};
		let empty;
		let previous = match previous {
			Some(previous) => previous,
			None => {
				empty = Properties::new();
				&empty
			}
		};

		let mut updated = false;

		for (class, &on) in &next.classes {
			if on == previous.has_class(class) {
				continue;
			}
			updated = true;
			if on {
				self.target.add_class(node, class)
			} else {
				self.target.remove_class(node, class)
			}
		}

		for (name, value) in &next.styles {
			let name: &str = name;
			if previous.styles.get(name) == Some(value) {
				continue;
			}
			updated = true;
			let value = if value.is_truthy() { style_str(name, value)? } else { "" };
			(options.style_applier)(self.target, node, name, value);
		}

		for (name, value) in &next.values {
			let name: &str = name;
			if name == "key" {
				continue;
			}
			check_property_name(name)?;

			let previous_value = previous.values.get(name);
			let value = match previous_value {
				Some(PropValue::Attribute(_)) if !value.is_truthy() => Cow::Owned(PropValue::Attribute("".into())),
				_ => Cow::Borrowed(value),
			};
			let value: &PropValue<T> = &value;

			if name == "value" {
				if let Some(incoming) = value.to_value() {
					let live = self.target.property(node, "value");
					let typed = self.target.property(node, INPUT_VALUE_PROPERTY);
					// What the user typed last stays unless the application asks for a different value than before.
					let app_changed = previous_value != Some(value);
					if live != incoming && (live != typed || app_changed) {
						self.target.set_property(node, "value", &incoming);
						self.target.set_property(node, INPUT_VALUE_PROPERTY, &Value::Null);
					} else {
						trace!("Leaving live `value` alone.");
					}
				}
				if previous_value != Some(value) {
					updated = true;
				}
			} else if previous_value != Some(value) {
				match value {
					PropValue::Handler(_) => return Err(Error::HandlerChanged(name.to_string())),
					PropValue::Attribute(text) if name != "innerHTML" => self.set_attribute(node, name, text, options),
					other => {
						if let Some(value) = other.to_value() {
							// Some hosts have side effects on redundant writes.
							if self.target.property(node, name) != value {
								self.target.set_property(node, name, &value);
							}
						}
					}
				}
				updated = true;
			}
		}

		Ok(updated)
	}

	fn set_attribute(&self, node: &T::Node, name: &str, value: &str, options: &ProjectionOptions<T>) {
		trace!(name, value = loggable(value), "Setting attribute.");
		if options.is_svg() && name == "href" {
			self.target.set_attribute(node, Some(NAMESPACE_XLINK), name, value)
		} else {
			self.target.set_attribute(node, None, name, value)
		}
	}

	fn set_event_handler(&self, node: &T::Node, name: &str, mut handler: Handler<T>, options: &ProjectionOptions<T>) {
		if let Some(interceptor) = &options.event_handler_interceptor {
			handler = interceptor(name, handler, node);
		}
		if name == "oninput" {
			let target = self.target.clone();
			let input = node.clone();
			let inner = handler;
			handler = Handler::new(move |event| {
				let live = target.property(&input, "value");
				target.set_property(&input, INPUT_VALUE_PROPERTY, &live);
				inner.call(event)
			});
		}
		self.target.set_event_handler(node, name, handler);
	}

	/// Runs the enter animation of a freshly inserted `vnode`, if it has one.
	pub fn node_added(&self, vnode: &VNode<T>, options: &ProjectionOptions<T>) -> Result<(), Error> {
		let properties = match vnode.properties() {
			Some(properties) => properties,
			None => return Ok(()),
		};
		match &properties.enter_animation {
			None => (),
			Some(EnterAnimation::Callback(animation)) => animation(self.target, &vnode.dom_node_or_err()?, properties),
			Some(EnterAnimation::Named(name)) => {
				let transitions = options.transitions.as_ref().ok_or_else(|| Error::MissingTransitions(name.to_string()))?;
				transitions.enter(&vnode.dom_node_or_err()?, properties, name)
			}
		}
		Ok(())
	}

	/// Detaches the node bound to `vnode`, or hands it to its exit animation which detaches it later.
	///
	/// Nodes on their way out through an animation don't receive pointer events anymore.
	/// The subtree of `vnode` is unbound right away either way, so it may be created again by a later render.
	pub fn node_to_remove(&self, vnode: &VNode<T>, options: &ProjectionOptions<T>) -> Result<(), Error> {
		let node = vnode.dom_node_or_err()?;
		let span = trace_span!("Removing child", selector = %vnode.selector());
		let _enter = span.enter();
		vnode.unbind_subtree();

		if let Some(properties) = vnode.properties() {
			match &properties.exit_animation {
				None => (),
				Some(ExitAnimation::Callback(animation)) => {
					animation(self.target, &node, self.detach_later(&node), properties);
					return Ok(());
				}
				Some(ExitAnimation::Named(name)) => {
					let transitions = options.transitions.as_ref().ok_or_else(|| Error::MissingTransitions(name.to_string()))?;
					transitions.exit(&node, properties, name, self.detach_later(&node));
					return Ok(());
				}
			}
		}

		self.target.remove(&node);
		Ok(())
	}

	fn detach_later(&self, node: &T::Node) -> Detach {
		trace!("Deferring detachment to exit animation.");
		self.target.set_style(node, "pointer-events", "none");
		let target = self.target.clone();
		let node = node.clone();
		Detach::new(move || target.remove(&node))
	}
}

fn find_index_of_child<T: Target>(children: &[VNode<T>], same_as: &VNode<T>, start: usize) -> Option<usize> {
	children.get(start..)?.iter().position(|child| child.same(same_as)).map(|i| start + i)
}

/// Un-keyed element siblings sharing a selector can't be told apart once one of them is added or removed.
pub fn check_distinguishable<T: Target>(children: &[VNode<T>], index: usize, parent: &VNode<T>, operation: ChildOperation) -> Result<(), Error> {
	let child = &children[index];
	if child.is_text() || child.key().is_some() {
		return Ok(());
	}
	let ambiguous = children.iter().enumerate().any(|(i, other)| i != index && other.same(child));
	if ambiguous {
		return Err(Error::Indistinguishable {
			parent: parent.selector().to_string(),
			child: child.selector().to_string(),
			operation,
		});
	}
	Ok(())
}

fn check_property_name(name: &str) -> Result<(), Error> {
	match name {
		"class" | "className" | "classList" => Err(Error::ReservedClassProperty(name.to_string())),
		_ => Ok(()),
	}
}

fn style_str<'a, T: Target>(name: &str, value: &'a PropValue<T>) -> Result<&'a str, Error> {
	match value {
		PropValue::Attribute(text) => Ok(text),
		_ => Err(Error::NonStringStyle(name.to_string())),
	}
}
