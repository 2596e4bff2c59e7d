use core::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Everything that can go wrong while projecting a virtual tree.
///
/// None of these are retried internally. A failed scheduled pass leaves the [`Projector`](`crate::Projector`)
/// in [`ProjectorState::Errored`](`crate::ProjectorState::Errored`) until it is resumed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
	#[error("The selector for the root node may not be changed ({previous:?} -> {next:?}). Consider using `merge` and adding one extra level to the virtual tree.")]
	RootSelectorChanged { previous: String, next: String },

	#[error("Property {0:?} is not supported, use `classes` instead.")]
	ReservedClassProperty(String),

	#[error("Style values must be strings (style {0:?}).")]
	NonStringStyle(String),

	#[error("Handlers may not be replaced on subsequent renders (property {0:?}). Declare event handlers outside the render function.")]
	HandlerChanged(String),

	#[error("Named animation {0:?} requires a `Transitions` strategy in the projection options.")]
	MissingTransitions(String),

	#[error("{parent} had a {child} child {}. You must add unique key properties to make them distinguishable.", .operation.describe())]
	Indistinguishable { parent: String, child: String, operation: ChildOperation },

	#[error("Node {0:?} was never created.")]
	NotCreated(String),

	#[error("Node {0:?} is already bound to a different target node. Virtual nodes may appear only once per tree.")]
	AlreadyBound(String),

	#[error("The reference node has no parent to insert into.")]
	NoParent,

	#[error("Failed to request an animation frame: {0}")]
	Scheduler(String),
}

/// The structural change that triggered a distinguishability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOperation {
	Added,
	Removed,
}
impl ChildOperation {
	fn describe(self) -> &'static str {
		match self {
			ChildOperation::Added => "added, but there is now more than one",
			ChildOperation::Removed => "removed, but there were more than one",
		}
	}
}
impl Display for ChildOperation {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			ChildOperation::Added => "added",
			ChildOperation::Removed => "removed",
		})
	}
}
