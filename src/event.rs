use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::Result;

/// Event callback: listeners on concrete elements and the targets of
/// [`Component::emit`](crate::Component::emit).
#[derive(Clone)]
pub struct Handler {
	func: Rc<dyn Fn(&[Value]) -> Result<()>>,
}

impl Handler {
	pub fn new(func: impl Fn(&[Value]) -> Result<()> + 'static) -> Self {
		Handler {
			func: Rc::new(func),
		}
	}

	pub fn call(&self, args: &[Value]) -> Result<()> {
		(self.func)(args)
	}

	pub fn ptr_eq(&self, other: &Handler) -> bool {
		Rc::ptr_eq(&self.func, &other.func)
	}
}

impl fmt::Debug for Handler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Handler")
	}
}

/// Listener installed once per element and event name. Patching swaps
/// the handler it forwards to instead of re-registering the listener.
#[derive(Clone)]
pub(crate) struct Invoker {
	target: Rc<RefCell<Handler>>,
}

impl Invoker {
	pub fn new(handler: Handler) -> Self {
		Invoker {
			target: Rc::new(RefCell::new(handler)),
		}
	}

	pub fn retarget(&self, handler: Handler) {
		*self.target.borrow_mut() = handler;
	}

	pub fn listener(&self) -> Handler {
		let target = self.target.clone();
		Handler::new(move |args| {
			let handler = target.borrow().clone();
			handler.call(args)
		})
	}
}
