use crate::Path;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A `watch` entry names neither a data field nor a computed property.
	#[error("watch target `{0}` is neither a data field nor a computed property")]
	UnknownWatchTarget(String),

	#[error("data initializer must return an object")]
	InvalidData,

	#[error("method `{0}` is not defined")]
	UnknownMethod(String),

	#[error("`{0}` is a method, not a value")]
	NotAValue(String),

	/// A subscriber re-triggered itself while it was still running.
	#[error("re-entrant update of `{path}`")]
	Cycle { path: Path },

	/// `update()` reached an instance whose render is still in progress.
	#[error("`{0}` was asked to render while rendering")]
	ReentrantRender(String),

	#[error("component is already mounted")]
	AlreadyMounted,

	#[error("component has no rendered output")]
	NotMounted,

	#[error("{0}")]
	Custom(String),
}

impl Error {
	pub fn custom(message: impl Into<String>) -> Self {
		Error::Custom(message.into())
	}
}
