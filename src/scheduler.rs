//! Frame scheduling, the only suspension point of a [`Projector`](`crate::Projector`).

use crate::Error;
use core::{
	cell::{Cell, RefCell},
	fmt::{self, Debug, Formatter},
};
use std::collections::VecDeque;
use tracing::trace;

/// Identifies a pending frame request so that it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub i32);

/// Runs callbacks at the next frame boundary.
pub trait Scheduler {
	/// Requests `callback` to run once at the next frame boundary.
	///
	/// # Errors
	///
	/// Fails with [`Error::Scheduler`] if the host refuses the request.
	fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle, Error>;

	/// Cancels a pending request. Cancelling a request that already ran is a no-op.
	fn cancel_frame(&self, handle: FrameHandle);
}

/// A [`Scheduler`] whose frames only happen when [`ManualScheduler::run_frame`] is called.
///
/// Useful for headless hosts that drive rendering from their own loop, and for tests.
#[derive(Default)]
pub struct ManualScheduler {
	next_handle: Cell<i32>,
	requested: Cell<usize>,
	pending: RefCell<VecDeque<(FrameHandle, Box<dyn FnOnce()>)>>,
}
impl ManualScheduler {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs every callback that was pending when this was called and returns how many ran.
	///
	/// Callbacks requested while the frame runs wait for the next one.
	pub fn run_frame(&self) -> usize {
		let frame = self.pending.replace(VecDeque::new());
		let count = frame.len();
		trace!(count, "Running frame.");
		for (_, callback) in frame {
			callback()
		}
		count
	}

	/// How many requests are waiting for the next frame.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.pending.borrow().len()
	}

	/// How many frames were requested in total, including cancelled ones.
	#[must_use]
	pub fn requested(&self) -> usize {
		self.requested.get()
	}
}
impl Scheduler for ManualScheduler {
	fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Result<FrameHandle, Error> {
		let handle = FrameHandle(self.next_handle.get());
		self.next_handle.set(handle.0.wrapping_add(1));
		self.requested.set(self.requested.get() + 1);
		self.pending.borrow_mut().push_back((handle, callback));
		Ok(handle)
	}

	fn cancel_frame(&self, handle: FrameHandle) {
		self.pending.borrow_mut().retain(|(pending, _)| *pending != handle)
	}
}
impl Debug for ManualScheduler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ManualScheduler")
			.field("pending", &self.pending())
			.field("requested", &self.requested())
			.finish()
	}
}
