mod memory;

pub use memory::MemoryBackend;

use crate::Handler;

/// Opaque handle of a concrete element owned by a [`Backend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// The concrete element layer a component renders into.
///
/// The renderer never looks inside elements; everything it does goes
/// through these operations.
pub trait Backend {
	fn create_element(&self, tag: &str) -> ElementId;

	fn set_attribute(&self, el: ElementId, key: &str, value: &str);

	fn remove_attribute(&self, el: ElementId, key: &str);

	fn set_class(&self, el: ElementId, class: &str);

	fn add_event_listener(&self, el: ElementId, name: &str, listener: Handler);

	fn remove_event_listener(&self, el: ElementId, name: &str);

	/// Replaces the whole content of `el`, children included, with `text`.
	fn set_text_content(&self, el: ElementId, text: &str);

	fn append_child(&self, parent: ElementId, child: ElementId);

	fn remove_child(&self, parent: ElementId, child: ElementId);

	/// Puts `new` at the position `old` occupies in `parent`.
	fn replace_child(&self, parent: ElementId, new: ElementId, old: ElementId);

	fn parent_node(&self, el: ElementId) -> Option<ElementId>;
}
