//! Keeps a list of derived results in sync with a list of keyed sources.

use core::fmt::{self, Debug, Formatter};
use tracing::trace;

/// Maps sources to results, reusing (and updating) the result of each source whose key was seen in the previous [`Mapping::map`] call.
///
/// Matching works like the reconciler's child matching: the next expected key is tried first,
/// then the remaining previous keys are searched circularly starting right after it.
pub struct Mapping<S, K, R> {
	get_key: Box<dyn Fn(&S) -> K>,
	create: Box<dyn FnMut(&S, usize) -> R>,
	update: Box<dyn FnMut(&S, &mut R, usize)>,
	keys: Vec<K>,
	results: Vec<R>,
}
impl<S, K: PartialEq, R> Mapping<S, K, R> {
	pub fn new(
		get_key: impl Fn(&S) -> K + 'static,
		create: impl FnMut(&S, usize) -> R + 'static,
		update: impl FnMut(&S, &mut R, usize) + 'static,
	) -> Self {
		Self {
			get_key: Box::new(get_key),
			create: Box::new(create),
			update: Box::new(update),
			keys: Vec::new(),
			results: Vec::new(),
		}
	}

	/// The results, in the order of the sources of the last [`Mapping::map`] call.
	#[must_use]
	pub fn results(&self) -> &[R] {
		&self.results
	}

	pub fn map(&mut self, sources: &[S]) {
		let new_keys: Vec<K> = sources.iter().map(|source| (self.get_key)(source)).collect();
		let mut old_results: Vec<Option<R>> = self.results.drain(..).map(Some).collect();
		let old_len = self.keys.len();
		let mut old_index = 0;

		let mut results = Vec::with_capacity(sources.len());
		for (i, (source, key)) in sources.iter().zip(&new_keys).enumerate() {
			let found = if old_index < old_len && self.keys[old_index] == *key && old_results[old_index].is_some() {
				Some(old_index)
			} else {
				(1..=old_len).map(|offset| (old_index + offset) % old_len).find(|&j| self.keys[j] == *key && old_results[j].is_some())
			};

			let result = match found.and_then(|j| old_results[j].take().map(|result| (j, result))) {
				Some((j, mut result)) => {
					(self.update)(source, &mut result, i);
					old_index = j + 1;
					result
				}
				None => {
					trace!(index = i, "Creating result.");
					(self.create)(source, i)
				}
			};
			results.push(result);
		}

		self.results = results;
		self.keys = new_keys;
	}
}
impl<S, K: Debug, R: Debug> Debug for Mapping<S, K, R> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mapping").field("keys", &self.keys).field("results", &self.results).finish()
	}
}
