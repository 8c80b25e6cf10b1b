use std::borrow::Borrow;
use std::fmt;

/// Dot-joined location inside an instance's props or data.
///
/// Array indices are ordinary segments, `items.0.title`.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path(String);

impl Path {
	pub fn root() -> Self {
		Path(String::new())
	}

	pub fn new(path: impl Into<String>) -> Self {
		Path(path.into())
	}

	pub fn is_root(&self) -> bool {
		self.0.is_empty()
	}

	pub fn join(&self, key: &str) -> Path {
		if self.is_root() {
			Path(key.to_owned())
		} else {
			Path(format!("{}.{}", self.0, key))
		}
	}

	pub fn segments(&self) -> impl Iterator<Item = &str> {
		self.0.split('.').filter(|s| !s.is_empty())
	}

	/// Splits `a.b.c` into `(a.b, c)`.
	pub fn split_last(&self) -> Option<(Path, &str)> {
		if self.is_root() {
			return None;
		}

		Some(match self.0.rsplit_once('.') {
			Some((parent, key)) => (Path::new(parent), key),
			None => (Path::root(), self.0.as_str()),
		})
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for Path {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Path {
	fn from(path: &str) -> Self {
		Path::new(path)
	}
}

impl From<String> for Path {
	fn from(path: String) -> Self {
		Path(path)
	}
}

impl fmt::Display for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl fmt::Debug for Path {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Path({:?})", self.0)
	}
}
