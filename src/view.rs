use std::fmt;

use serde_json::Value;

use crate::component::ComponentBody;
use crate::{Component, Error, Method, Path, Result};

/// Root a view reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
	Props,
	Data,
}

/// Result of resolving a key.
pub enum Field {
	Value(Value),
	/// Object or array; reads through the view stay tracked.
	Object(View),
	Method(Method),
	Absent,
}

impl Field {
	pub fn is_absent(&self) -> bool {
		matches!(self, Field::Absent)
	}

	/// Materializes the field. Objects are cloned without registering
	/// dependencies on their contents.
	pub fn into_value(self, path: &str) -> Result<Value> {
		match self {
			Field::Value(value) => Ok(value),
			Field::Object(view) => Ok(view.snapshot()),
			Field::Method(_) => Err(Error::NotAValue(path.to_owned())),
			Field::Absent => Ok(Value::Null),
		}
	}
}

impl fmt::Debug for Field {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Field::Value(value) => f.debug_tuple("Value").field(value).finish(),
			Field::Object(view) => f.debug_tuple("Object").field(&view.path).finish(),
			Field::Method(method) => f.debug_tuple("Method").field(&method.name()).finish(),
			Field::Absent => f.write_str("Absent"),
		}
	}
}

/// Tracked view of a nested object in an instance's props or data.
///
/// Views hold a path, not a reference: every access walks from the root
/// again, so replacing an intermediate object is always observed.
#[derive(Clone)]
pub struct View {
	owner: Component,
	source: Source,
	path: Path,
}

impl View {
	pub(crate) fn new(owner: Component, source: Source, path: Path) -> Self {
		View {
			owner,
			source,
			path,
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn source(&self) -> Source {
		self.source
	}

	/// Reads `key`, registering a dependency on its full path.
	pub fn get(&self, key: &str) -> Field {
		let path = self.path.join(key);
		self.owner.collect(&path);

		let body = self.owner.body();
		let store = body.store(self.source).borrow();
		let value = locate(&store, &self.path).and_then(|container| child(container, key));

		match value {
			Some(value) if value.is_object() || value.is_array() => {
				Field::Object(View::new(self.owner.clone(), self.source, path))
			}
			Some(value) => Field::Value(value.clone()),
			None => Field::Absent,
		}
	}

	pub fn read(&self, key: &str) -> Result<Value> {
		let path = self.path.join(key);
		self.get(key).into_value(path.as_str())
	}

	/// Writes `key` and notifies the subscribers of its full path.
	///
	/// Storing never fails. When the view no longer resolves to an object
	/// or an array, or the key cannot name an array slot, nothing is stored
	/// and only the notification happens.
	pub fn set(&self, key: &str, value: Value) -> Result<()> {
		let path = self.path.join(key);
		let previous = {
			let body = self.owner.body();
			let mut store = body.store(self.source).borrow_mut();
			match locate_mut(&mut store, &self.path) {
				Some(container) => write(container, key, value.clone()),
				None => None,
			}
		};

		self.owner.notify(path, previous, Some(value))
	}

	/// Removes `key`. Absent keys are left alone and notify nobody.
	pub fn delete(&self, key: &str) -> Result<()> {
		let path = self.path.join(key);
		let previous = {
			let body = self.owner.body();
			let mut store = body.store(self.source).borrow_mut();
			match locate_mut(&mut store, &self.path) {
				Some(container) => remove(container, key),
				None => None,
			}
		};

		match previous {
			Some(previous) => self.owner.notify(path, Some(previous), None),
			None => Ok(()),
		}
	}

	/// Untracked copy of the viewed value.
	pub fn snapshot(&self) -> Value {
		let body: &ComponentBody = self.owner.body();
		let store = body.store(self.source).borrow();
		locate(&store, &self.path).cloned().unwrap_or(Value::Null)
	}
}

impl fmt::Debug for View {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("View")
			.field("source", &self.source)
			.field("path", &self.path)
			.finish()
	}
}

pub(crate) fn child<'a>(container: &'a Value, key: &str) -> Option<&'a Value> {
	match container {
		Value::Object(map) => map.get(key),
		Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
		_ => None,
	}
}

fn child_mut<'a>(container: &'a mut Value, key: &str) -> Option<&'a mut Value> {
	match container {
		Value::Object(map) => map.get_mut(key),
		Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get_mut(i)),
		_ => None,
	}
}

pub(crate) fn locate<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
	path.segments().try_fold(root, child)
}

pub(crate) fn locate_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
	let mut current = root;
	for segment in path.segments() {
		current = child_mut(current, segment)?;
	}
	Some(current)
}

/// Stores `value` under `key`, returning what was there before. Arrays
/// grow with `Null` up to the index.
fn write(container: &mut Value, key: &str, value: Value) -> Option<Value> {
	match container {
		Value::Object(map) => map.insert(key.to_owned(), value),
		Value::Array(items) => {
			let index = key.parse::<usize>().ok()?;
			if index < items.len() {
				return Some(std::mem::replace(&mut items[index], value));
			}

			items.resize(index, Value::Null);
			items.push(value);
			None
		}
		_ => None,
	}
}

/// Array elements are nulled in place so that indices stay stable. An
/// element that is already `Null` still counts as present.
fn remove(container: &mut Value, key: &str) -> Option<Value> {
	if let Value::Object(map) = container {
		return map.remove(key);
	}

	let slot = child_mut(container, key)?;
	Some(std::mem::replace(slot, Value::Null))
}
