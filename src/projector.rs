//! The projector coalesces render requests into at most one pass per frame over any number of projections.

use crate::{
	options::ProjectionOptions,
	projection::{self, Projection},
	scheduler::{FrameHandle, Scheduler},
	target::Target,
	vnode::{Handler, VNode},
	Error,
};
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::rc::{Rc, Weak};
use tracing::{error, info, instrument, trace, trace_span, warn};

/// Where a [`Projector`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorState {
	/// No frame is pending.
	Idle,
	/// A frame is pending and will run a render pass.
	Scheduled,
	/// A render pass is executing. Render requests are coalesced into it.
	Rendering,
	/// The last render pass failed. Render requests are ignored until [`Projector::resume`].
	Errored,
	/// Explicitly halted. Render requests are ignored until [`Projector::resume`].
	Stopped,
}

/// Identifies a registered projection, for [`Projector::detach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectionId(u64);

pub type ErrorObserver = Rc<dyn Fn(&Error)>;

/// Configuration of a [`Projector`].
pub struct ProjectorOptions<T: Target> {
	/// Passed to every projection. The event handler interceptor is always replaced by the projector's own.
	pub projection: ProjectionOptions<T>,
	/// Receives the error of a failed scheduled render pass.
	pub on_error: Option<ErrorObserver>,
}
impl<T: Target> Default for ProjectorOptions<T> {
	fn default() -> Self {
		Self {
			projection: ProjectionOptions::default(),
			on_error: None,
		}
	}
}
impl<T: Target> ProjectorOptions<T> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn with_projection_options(self, projection: ProjectionOptions<T>) -> Self {
		Self { projection, ..self }
	}

	#[must_use]
	pub fn on_error(self, observer: impl Fn(&Error) + 'static) -> Self {
		Self {
			on_error: Some(Rc::new(observer)),
			..self
		}
	}
}

type RenderFn<T> = Box<dyn FnMut() -> VNode<T>>;

struct Registration<T: Target> {
	id: ProjectionId,
	// Empty while the projection is being updated, and after detach.
	projection: RefCell<Option<Projection<T>>>,
	detached: Cell<bool>,
	render: RefCell<RenderFn<T>>,
}

struct Inner<T: Target> {
	target: T,
	scheduler: Rc<dyn Scheduler>,
	options: ProjectionOptions<T>,
	on_error: Option<ErrorObserver>,
	state: Cell<ProjectorState>,
	pending: Cell<Option<FrameHandle>>,
	next_id: Cell<u64>,
	registrations: RefCell<Vec<Rc<Registration<T>>>>,
}

/// Manages any number of [`Projection`]s and re-renders them together, at most once per frame.
///
/// Event handlers installed through a projector's projections request a render after each invocation,
/// which is the principal trigger for re-renders. Anything else (timers, network callbacks) calls [`Projector::schedule_render`].
///
/// This is a handle: Clones refer to the same projector.
pub struct Projector<T: Target>(Rc<Inner<T>>);
impl<T: Target> Clone for Projector<T> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}
impl<T: Target> Projector<T> {
	#[must_use]
	pub fn new(target: T, scheduler: Rc<dyn Scheduler>) -> Self {
		Self::with_options(target, scheduler, ProjectorOptions::default())
	}

	#[must_use]
	pub fn with_options(target: T, scheduler: Rc<dyn Scheduler>, options: ProjectorOptions<T>) -> Self {
		let ProjectorOptions { projection, on_error } = options;
		Self(Rc::new_cyclic(|weak: &Weak<Inner<T>>| {
			let weak = weak.clone();
			let options = projection.with_event_handler_interceptor(move |_name, handler: Handler<T>, _node| {
				let weak = weak.clone();
				Handler::new(move |event| {
					if let Some(inner) = weak.upgrade() {
						Projector(inner).schedule_render();
					}
					handler.call(event)
				})
			});
			Inner {
				target,
				scheduler,
				options,
				on_error,
				state: Cell::new(ProjectorState::Idle),
				pending: Cell::new(None),
				next_id: Cell::new(0),
				registrations: RefCell::new(Vec::new()),
			}
		}))
	}

	#[must_use]
	pub fn state(&self) -> ProjectorState {
		self.0.state.get()
	}

	#[must_use]
	pub fn target(&self) -> &T {
		&self.0.target
	}

	/// Requests a render pass at the next frame, unless one is already pending or running.
	///
	/// Does nothing while [`Errored`](`ProjectorState::Errored`) or [`Stopped`](`ProjectorState::Stopped`).
	pub fn schedule_render(&self) {
		match self.state() {
			ProjectorState::Idle => (),
			state => return trace!(?state, "Not scheduling a render."),
		}

		let weak = Rc::downgrade(&self.0);
		match self.0.scheduler.request_frame(Box::new(move || {
			if let Some(inner) = weak.upgrade() {
				Projector(inner).on_frame()
			}
		})) {
			Ok(handle) => {
				trace!(?handle, "Scheduled render.");
				self.0.pending.set(Some(handle));
				self.0.state.set(ProjectorState::Scheduled);
			}
			Err(error) => {
				error!("{}", error);
				self.observe(&error);
			}
		}
	}

	fn on_frame(&self) {
		self.0.pending.set(None);
		if self.state() != ProjectorState::Scheduled {
			return trace!(state = ?self.state(), "Skipping frame.");
		}
		// Failures were already logged and observed.
		let _ = self.render_pass();
	}

	/// Renders all projections right away, cancelling a pending frame.
	///
	/// This is a no-op while a pass is already running or after a failed pass (until [`Projector::resume`]).
	/// A stopped projector renders, but stays stopped.
	///
	/// # Errors
	///
	/// Returns the error of the failed projection update. The projector is [`Errored`](`ProjectorState::Errored`) afterwards.
	pub fn render_now(&self) -> Result<(), Error> {
		if let Some(handle) = self.0.pending.take() {
			self.0.scheduler.cancel_frame(handle);
		}
		self.render_pass()
	}

	#[instrument(skip(self))]
	fn render_pass(&self) -> Result<(), Error> {
		let settle = match self.state() {
			ProjectorState::Rendering | ProjectorState::Errored => {
				trace!(state = ?self.state(), "Not rendering.");
				return Ok(());
			}
			ProjectorState::Stopped => ProjectorState::Stopped,
			ProjectorState::Idle | ProjectorState::Scheduled => ProjectorState::Idle,
		};
		self.0.state.set(ProjectorState::Rendering);

		// Registrations made during the pass are rendered starting with the next one.
		let registrations = self.0.registrations.borrow().clone();
		for registration in registrations {
			let span = trace_span!("Rendering projection", id = ?registration.id);
			let _enter = span.enter();

			let vnode = (&mut *registration.render.borrow_mut())();
			// Hooks run during the update may detach this very projection.
			let taken = registration.projection.borrow_mut().take();
			let mut projection = match taken {
				Some(projection) => projection,
				None => {
					trace!("Detached during this pass.");
					continue;
				}
			};
			let result = projection.update(vnode);
			if registration.detached.get() {
				trace!("Detached while updating, dropping the projection.");
			} else {
				*registration.projection.borrow_mut() = Some(projection);
			}
			if let Err(error) = result {
				error!("Render pass failed, rendering is suspended until the projector is resumed: {}", error);
				self.0.state.set(ProjectorState::Errored);
				self.observe(&error);
				return Err(error);
			}
		}

		// `stop` may have been called from inside the pass.
		if self.state() == ProjectorState::Rendering {
			self.0.state.set(settle);
		}
		Ok(())
	}

	fn observe(&self, error: &Error) {
		if let Some(on_error) = &self.0.on_error {
			on_error(error)
		}
	}

	/// Cancels a pending frame and ignores render requests until [`Projector::resume`].
	///
	/// Projections stay registered. A running pass isn't interrupted.
	pub fn stop(&self) {
		if let Some(handle) = self.0.pending.take() {
			self.0.scheduler.cancel_frame(handle);
		}
		info!("Projector stopped.");
		self.0.state.set(ProjectorState::Stopped);
	}

	/// Leaves [`Stopped`](`ProjectorState::Stopped`) or [`Errored`](`ProjectorState::Errored`) and schedules a render.
	pub fn resume(&self) {
		match self.state() {
			ProjectorState::Rendering => return warn!("Ignoring `resume` during a render pass."),
			ProjectorState::Scheduled => return,
			ProjectorState::Idle | ProjectorState::Errored | ProjectorState::Stopped => (),
		}
		info!("Projector resumed.");
		self.0.state.set(ProjectorState::Idle);
		self.schedule_render();
	}

	/// Renders once and appends the result to `parent`, then keeps it updated with `render`.
	///
	/// # Errors
	///
	/// Fails if the initial projection can't be created. Nothing is registered in that case.
	pub fn append(&self, parent: &T::Node, mut render: impl FnMut() -> VNode<T> + 'static) -> Result<ProjectionId, Error> {
		let projection = projection::append(&self.0.target, parent, render(), self.0.options.clone())?;
		Ok(self.register(projection, Box::new(render)))
	}

	/// Renders once and inserts the result before `before`, then keeps it updated with `render`.
	///
	/// # Errors
	///
	/// Fails if the initial projection can't be created. Nothing is registered in that case.
	pub fn insert_before(&self, before: &T::Node, mut render: impl FnMut() -> VNode<T> + 'static) -> Result<ProjectionId, Error> {
		let projection = projection::insert_before(&self.0.target, before, render(), self.0.options.clone())?;
		Ok(self.register(projection, Box::new(render)))
	}

	/// Renders once into the existing `element`, then keeps it updated with `render`.
	///
	/// # Errors
	///
	/// Fails if the initial projection can't be created. Nothing is registered in that case.
	pub fn merge(&self, element: &T::Node, mut render: impl FnMut() -> VNode<T> + 'static) -> Result<ProjectionId, Error> {
		let projection = projection::merge(&self.0.target, element, render(), self.0.options.clone())?;
		Ok(self.register(projection, Box::new(render)))
	}

	/// Renders once in place of `element`, then keeps it updated with `render`.
	///
	/// # Errors
	///
	/// Fails if the initial projection can't be created. Nothing is registered in that case.
	pub fn replace(&self, element: &T::Node, mut render: impl FnMut() -> VNode<T> + 'static) -> Result<ProjectionId, Error> {
		let projection = projection::replace(&self.0.target, element, render(), self.0.options.clone())?;
		Ok(self.register(projection, Box::new(render)))
	}

	fn register(&self, projection: Projection<T>, render: RenderFn<T>) -> ProjectionId {
		let id = ProjectionId(self.0.next_id.get());
		self.0.next_id.set(id.0 + 1);
		trace!(?id, "Registering projection.");
		self.0.registrations.borrow_mut().push(Rc::new(Registration {
			id,
			projection: RefCell::new(Some(projection)),
			detached: Cell::new(false),
			render: RefCell::new(render),
		}));
		id
	}

	/// Stops updating a projection and hands it back. The target tree is left as it is.
	///
	/// Returns [`None`] if `id` isn't registered (anymore).
	/// Also returns [`None`] when called from a hook while that same projection is being updated.
	/// It's still detached then, and dropped once the update is done.
	pub fn detach(&self, id: ProjectionId) -> Option<Projection<T>> {
		let registration = {
			let mut registrations = self.0.registrations.borrow_mut();
			let index = registrations.iter().position(|registration| registration.id == id)?;
			registrations.remove(index)
		};
		trace!(?id, "Detaching projection.");
		registration.detached.set(true);
		let projection = registration.projection.borrow_mut().take();
		projection
	}

	/// How many projections are registered.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.registrations.borrow().len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl<T: Target> Debug for Projector<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Projector")
			.field("state", &self.state())
			.field("pending", &self.0.pending.get())
			.field("projections", &self.len())
			.finish()
	}
}
