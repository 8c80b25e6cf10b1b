use std::cell::RefCell;
use std::collections::BTreeSet;

use crate::{Path, Subscriber};

/// Collection frame: every path read while the frame is active becomes
/// a dependency of its subscriber.
pub(crate) struct Evaluation {
	subscriber: Subscriber,
	inner: RefCell<EvaluationInner>,
}

struct EvaluationInner {
	paths: BTreeSet<Path>,
}

impl Evaluation {
	pub fn new(subscriber: Subscriber) -> Self {
		Evaluation {
			subscriber,
			inner: RefCell::new(EvaluationInner {
				paths: BTreeSet::new(),
			}),
		}
	}

	pub fn subscriber(&self) -> &Subscriber {
		&self.subscriber
	}

	pub fn based_on(&self, path: Path) {
		self.inner.borrow_mut().paths.insert(path);
	}

	pub fn take(&self) -> BTreeSet<Path> {
		std::mem::take(&mut self.inner.borrow_mut().paths)
	}
}
