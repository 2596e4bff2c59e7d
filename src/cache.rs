//! Memoization of a single computation by its inputs.

use tracing::trace;

/// Remembers the result of the last computation together with the inputs it was computed from.
///
/// Handy for reusing whole virtual subtrees across renders: a reused [`VNode`](`crate::VNode`) is skipped by the reconciler.
#[derive(Debug)]
pub struct CalculationCache<I, R> {
	cached: Option<(Vec<I>, R)>,
}
impl<I, R> Default for CalculationCache<I, R> {
	fn default() -> Self {
		Self { cached: None }
	}
}
impl<I: PartialEq + Clone, R> CalculationCache<I, R> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the cached result if `inputs` equal the previous inputs element by element, otherwise `calculation`'s fresh result.
	pub fn result(&mut self, inputs: &[I], calculation: impl FnOnce() -> R) -> &R {
		let stale = match &self.cached {
			Some((cached_inputs, _)) => cached_inputs.as_slice() != inputs,
			None => true,
		};
		if stale {
			trace!("Recalculating.");
			self.cached = None;
		}
		&self.cached.get_or_insert_with(|| (inputs.to_vec(), calculation())).1
	}

	/// Forgets the cached result, so that the next [`CalculationCache::result`] call recalculates.
	pub fn invalidate(&mut self) {
		self.cached = None;
	}
}
