use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::component::ComponentBody;
use crate::options::{ComputedFn, WatchFn};
use crate::{Change, Component, Path, Result, Subscriber};

/// Derived value whose dependencies are collected while its getter
/// runs. Any write to one of them re-evaluates it and reports
/// `(previous, next)` to the handler.
#[derive(Clone)]
pub struct Watcher {
	body: Rc<WatcherBody>,
}

struct WatcherBody {
	owner: Weak<ComponentBody>,
	name: String,
	getter: ComputedFn,
	handler: Option<WatchFn>,
	value: RefCell<Value>,
	paths: RefCell<BTreeSet<Path>>,
	subscriber: Subscriber,
}

impl Watcher {
	pub fn new(
		owner: &Component,
		name: impl Into<String>,
		getter: ComputedFn,
		handler: Option<WatchFn>,
	) -> Result<Self> {
		let name = name.into();
		let body = Rc::new_cyclic(|this: &Weak<WatcherBody>| {
			let this = this.clone();
			let subscriber = Subscriber::new(format!("{}::watch", name), move |_| {
				match this.upgrade() {
					Some(body) => Watcher { body }.update(),
					None => Ok(()),
				}
			});

			WatcherBody {
				owner: owner.downgrade(),
				name,
				getter,
				handler,
				value: RefCell::new(Value::Null),
				paths: RefCell::new(BTreeSet::new()),
				subscriber,
			}
		});

		let watcher = Watcher { body };
		let value = watcher.evaluate(owner)?;
		*watcher.body.value.borrow_mut() = value;
		Ok(watcher)
	}

	pub fn name(&self) -> &str {
		&self.body.name
	}

	/// Value of the last evaluation.
	pub fn value(&self) -> Value {
		self.body.value.borrow().clone()
	}

	/// Re-evaluates the getter. The handler runs on every update, equal
	/// values included.
	pub fn update(&self) -> Result<()> {
		let Some(owner) = self.body.owner.upgrade().map(Component::from_body) else {
			return Ok(());
		};

		let next = self.evaluate(&owner)?;
		let previous = self.body.value.replace(next.clone());

		if let Some(handler) = &self.body.handler {
			handler(
				&owner,
				&Change {
					path: Path::new(self.body.name.clone()),
					previous: Some(previous),
					next: Some(next),
				},
			)?;
		}

		Ok(())
	}

	fn evaluate(&self, owner: &Component) -> Result<Value> {
		let body = &self.body;
		owner.track(&body.subscriber, &body.paths, || (body.getter)(owner))
	}
}

impl fmt::Debug for Watcher {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Watcher")
			.field("name", &self.body.name)
			.field("value", &*self.body.value.borrow())
			.finish()
	}
}
