//! Projections bind one virtual tree root to one target node, plus the four ways to create them.

use crate::{diff::DomDiffer, options::ProjectionOptions, target::Target, vnode::VNode, Error};
use core::fmt::{self, Debug, Formatter};
use tracing::{instrument, trace};

/// The live binding between one virtual root and the target node it was projected into.
///
/// Owns the virtual tree that's currently materialized. Nothing else reads or writes it between updates.
pub struct Projection<T: Target> {
	target: T,
	dom_node: T::Node,
	root: VNode<T>,
	options: ProjectionOptions<T>,
}
impl<T: Target> Projection<T> {
	fn new(target: &T, root: VNode<T>, options: ProjectionOptions<T>) -> Result<Self, Error> {
		Ok(Self {
			target: target.clone(),
			dom_node: root.dom_node_or_err()?,
			root,
			options,
		})
	}

	/// The target node the root is bound to.
	#[must_use]
	pub fn dom_node(&self) -> &T::Node {
		&self.dom_node
	}

	/// The virtual tree that's currently materialized.
	#[must_use]
	pub fn root(&self) -> &VNode<T> {
		&self.root
	}

	#[must_use]
	pub fn options(&self) -> &ProjectionOptions<T> {
		&self.options
	}

	/// Diffs `next` against the current tree, applies the differences and keeps `next` as the current tree.
	///
	/// # Errors
	///
	/// Fails with [`Error::RootSelectorChanged`] if `next` has a different selector than the current root,
	/// or with any error the reconciler raises. On failure, the current tree is kept, but the target tree may be partially updated
	/// and parts of the current tree may already be unbound.
	#[instrument(skip_all, fields(selector = %self.root.selector()))]
	pub fn update(&mut self, next: VNode<T>) -> Result<(), Error> {
		if self.root.selector() != next.selector() {
			return Err(Error::RootSelectorChanged {
				previous: self.root.selector().to_string(),
				next: next.selector().to_string(),
			});
		}
		DomDiffer::new(&self.target).update_dom(&self.root, &next, &self.options)?;
		self.root = next;
		Ok(())
	}
}
impl<T: Target> Debug for Projection<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Projection").field("root", &self.root).field("options", &self.options).finish()
	}
}

/// Creates `vnode` as the last child of `parent`.
///
/// # Errors
///
/// Fails with any error the reconciler raises while creating the subtree.
pub fn append<T: Target>(target: &T, parent: &T::Node, vnode: VNode<T>, options: ProjectionOptions<T>) -> Result<Projection<T>, Error> {
	trace!(selector = %vnode.selector(), "Appending projection.");
	DomDiffer::new(target).create_dom(&vnode, parent, None, &options)?;
	Projection::new(target, vnode, options)
}

/// Creates `vnode` right before `before`, as its sibling.
///
/// # Errors
///
/// Fails with [`Error::NoParent`] if `before` is detached, or with any error the reconciler raises while creating the subtree.
pub fn insert_before<T: Target>(target: &T, before: &T::Node, vnode: VNode<T>, options: ProjectionOptions<T>) -> Result<Projection<T>, Error> {
	trace!(selector = %vnode.selector(), "Inserting projection.");
	let parent = target.parent(before).ok_or(Error::NoParent)?;
	DomDiffer::new(target).create_dom(&vnode, &parent, Some(before), &options)?;
	Projection::new(target, vnode, options)
}

/// Adopts the existing `element` as the root of `vnode`.
///
/// Only properties and children are applied. The root selector isn't, so it may not match `element`.
///
/// # Errors
///
/// Fails with any error the reconciler raises while creating the children or applying properties.
pub fn merge<T: Target>(target: &T, element: &T::Node, vnode: VNode<T>, options: ProjectionOptions<T>) -> Result<Projection<T>, Error> {
	trace!(selector = %vnode.selector(), "Merging projection.");
	let element = vnode.bind(element.clone())?;
	DomDiffer::new(target).init_properties_and_children(&element, &vnode, &options)?;
	Projection::new(target, vnode, options)
}

/// Creates `vnode` in place of `element`, which is detached right after.
///
/// # Errors
///
/// Fails with [`Error::NoParent`] if `element` is detached, or with any error the reconciler raises while creating the subtree.
pub fn replace<T: Target>(target: &T, element: &T::Node, vnode: VNode<T>, options: ProjectionOptions<T>) -> Result<Projection<T>, Error> {
	trace!(selector = %vnode.selector(), "Replacing with projection.");
	let parent = target.parent(element).ok_or(Error::NoParent)?;
	DomDiffer::new(target).create_dom(&vnode, &parent, Some(element), &options)?;
	target.remove(element);
	Projection::new(target, vnode, options)
}
