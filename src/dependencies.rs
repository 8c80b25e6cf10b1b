use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;
use serde_json::Value;
use smallvec::SmallVec;

use crate::addr::RcAddr;
use crate::{Path, Result};

/// A write observed on a dependency path.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
	pub path: Path,
	pub previous: Option<Value>,
	pub next: Option<Value>,
}

/// Callback registered against a dependency path.
///
/// Two subscribers are the same subscriber only if they share the
/// same allocation, clones included.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Subscriber {
	body: RcAddr<SubscriberBody>,
}

pub(crate) struct SubscriberBody {
	name: String,
	func: Box<dyn Fn(&Change) -> Result<()>>,
}

impl Subscriber {
	pub fn new(name: impl Into<String>, func: impl Fn(&Change) -> Result<()> + 'static) -> Self {
		Subscriber {
			body: RcAddr::new(Rc::new(SubscriberBody {
				name: name.into(),
				func: Box::new(func),
			})),
		}
	}

	pub fn name(&self) -> &str {
		&self.body.name
	}

	pub fn call(&self, change: &Change) -> Result<()> {
		(self.body.func)(change)
	}
}

impl fmt::Debug for Subscriber {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscriber")
			.field("name", &self.body.name)
			.finish()
	}
}

pub type Subscribers = SmallVec<[Subscriber; 4]>;

/// Per-instance registry from dependency path to ordered subscribers.
#[derive(Default)]
pub struct Dependencies {
	by_path: FxHashMap<Path, Subscribers>,
}

impl Dependencies {
	pub fn new() -> Self {
		Self {
			by_path: FxHashMap::default(),
		}
	}

	/// Appends `subscriber` to the list for `path` unless it is already there.
	pub fn subscribe(&mut self, path: Path, subscriber: Subscriber) -> bool {
		let list = self.by_path.entry(path).or_default();
		if list.contains(&subscriber) {
			return false;
		}

		tracing::trace!(subscriber = subscriber.name(), "subscribe");
		list.push(subscriber);
		true
	}

	pub fn unsubscribe(&mut self, path: &Path, subscriber: &Subscriber) -> bool {
		let Some(list) = self.by_path.get_mut(path) else {
			return false;
		};

		let before = list.len();
		list.retain(|s| s != subscriber);
		let removed = list.len() != before;

		if list.is_empty() {
			self.by_path.remove(path);
		}

		removed
	}

	/// Replaces the paths `subscriber` was collected on during its previous
	/// evaluation with the paths of the current one.
	pub fn swap(&mut self, subscriber: &Subscriber, prev: &BTreeSet<Path>, next: &BTreeSet<Path>) {
		prev.difference(next).for_each(|path| {
			self.unsubscribe(path, subscriber);
		});
	}

	/// Snapshot of the subscribers for `path`, in registration order.
	pub fn subscribers(&self, path: &str) -> Subscribers {
		self.by_path.get(path).cloned().unwrap_or_default()
	}

	pub fn count(&self, path: &str) -> usize {
		self.by_path.get(path).map_or(0, |list| list.len())
	}

	pub fn is_empty(&self) -> bool {
		self.by_path.is_empty()
	}

	pub fn clear(&mut self) {
		self.by_path.clear();
	}
}
