#![doc(html_root_url = "https://docs.rs/projector-dom/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod builder;
pub mod cache;
pub mod diff;
mod error;
pub mod mapping;
pub mod memory;
pub mod options;
pub mod projection;
pub mod projector;
pub mod scheduler;
pub mod target;
pub mod vnode;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use builder::{h, Child};
pub use cache::CalculationCache;
pub use diff::DomDiffer;
pub use error::{ChildOperation, Error};
pub use mapping::Mapping;
pub use options::{ProjectionOptions, Transitions, NAMESPACE_SVG, NAMESPACE_XLINK};
pub use projection::Projection;
pub use projector::{ProjectionId, Projector, ProjectorOptions, ProjectorState};
pub use scheduler::{FrameHandle, ManualScheduler, Scheduler};
pub use target::Target;
pub use vnode::{same, Detach, EnterAnimation, ExitAnimation, Handler, HookContext, Key, PropValue, Properties, Selector, VNode, Value};
