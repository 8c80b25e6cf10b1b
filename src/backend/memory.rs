use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write;

use serde_json::Value;

use super::{Backend, ElementId};
use crate::{Handler, Result};

/// In-process element tree. Useful for tests and for running components
/// without a real UI.
#[derive(Default)]
pub struct MemoryBackend {
	elements: RefCell<Vec<Element>>,
}

#[derive(Default)]
struct Element {
	tag: String,
	attributes: BTreeMap<String, String>,
	class: Option<String>,
	listeners: BTreeMap<String, Handler>,
	text: String,
	children: Vec<ElementId>,
	parent: Option<ElementId>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Number of elements created so far.
	pub fn created(&self) -> usize {
		self.elements.borrow().len()
	}

	pub fn tag(&self, el: ElementId) -> String {
		self.with(el, |e| e.tag.clone()).unwrap_or_default()
	}

	/// Text set directly on `el`.
	pub fn text(&self, el: ElementId) -> String {
		self.with(el, |e| e.text.clone()).unwrap_or_default()
	}

	/// Text of `el` followed by the text of its descendants.
	pub fn text_content(&self, el: ElementId) -> String {
		let mut out = self.text(el);
		for child in self.children(el) {
			out.push_str(&self.text_content(child));
		}
		out
	}

	pub fn attribute(&self, el: ElementId, key: &str) -> Option<String> {
		self.with(el, |e| e.attributes.get(key).cloned()).flatten()
	}

	pub fn class(&self, el: ElementId) -> Option<String> {
		self.with(el, |e| e.class.clone()).flatten()
	}

	pub fn children(&self, el: ElementId) -> Vec<ElementId> {
		self.with(el, |e| e.children.clone()).unwrap_or_default()
	}

	pub fn listeners(&self, el: ElementId) -> Vec<String> {
		self.with(el, |e| e.listeners.keys().cloned().collect())
			.unwrap_or_default()
	}

	/// Fires the listener registered on `el` for `name`. Returns whether
	/// there was one.
	pub fn dispatch(&self, el: ElementId, name: &str, args: &[Value]) -> Result<bool> {
		let listener = self.with(el, |e| e.listeners.get(name).cloned()).flatten();
		match listener {
			Some(listener) => listener.call(args).map(|_| true),
			None => Ok(false),
		}
	}

	/// Renders the subtree rooted at `el` as markup.
	pub fn to_html(&self, el: ElementId) -> String {
		let mut out = String::new();
		self.write_html(el, &mut out);
		out
	}

	fn write_html(&self, el: ElementId, out: &mut String) {
		let (tag, attributes, class, text) = match self.with(el, |e| {
			(e.tag.clone(), e.attributes.clone(), e.class.clone(), e.text.clone())
		}) {
			Some(parts) => parts,
			None => return,
		};

		let _ = write!(out, "<{}", tag);
		if let Some(class) = class {
			let _ = write!(out, " class=\"{}\"", class);
		}
		for (key, value) in attributes {
			let _ = write!(out, " {}=\"{}\"", key, value);
		}
		out.push('>');
		out.push_str(&text);
		for child in self.children(el) {
			self.write_html(child, out);
		}
		let _ = write!(out, "</{}>", tag);
	}

	fn with<R>(&self, el: ElementId, func: impl FnOnce(&Element) -> R) -> Option<R> {
		self.elements.borrow().get(el.0 as usize).map(func)
	}

	fn with_mut<R>(&self, el: ElementId, func: impl FnOnce(&mut Element) -> R) -> Option<R> {
		let result = self.elements.borrow_mut().get_mut(el.0 as usize).map(func);
		if result.is_none() {
			tracing::warn!(?el, "unknown element");
		}
		result
	}

	fn detach(&self, child: ElementId) {
		if let Some(parent) = self.with_mut(child, |e| e.parent.take()).flatten() {
			self.with_mut(parent, |e| e.children.retain(|c| *c != child));
		}
	}
}

impl Backend for MemoryBackend {
	fn create_element(&self, tag: &str) -> ElementId {
		let mut elements = self.elements.borrow_mut();
		elements.push(Element {
			tag: tag.to_owned(),
			..Default::default()
		});
		ElementId(elements.len() as u64 - 1)
	}

	fn set_attribute(&self, el: ElementId, key: &str, value: &str) {
		self.with_mut(el, |e| e.attributes.insert(key.to_owned(), value.to_owned()));
	}

	fn remove_attribute(&self, el: ElementId, key: &str) {
		self.with_mut(el, |e| {
			if key == "class" {
				e.class = None;
			}
			e.attributes.remove(key);
		});
	}

	fn set_class(&self, el: ElementId, class: &str) {
		self.with_mut(el, |e| e.class = Some(class.to_owned()));
	}

	fn add_event_listener(&self, el: ElementId, name: &str, listener: Handler) {
		self.with_mut(el, |e| e.listeners.insert(name.to_owned(), listener));
	}

	fn remove_event_listener(&self, el: ElementId, name: &str) {
		self.with_mut(el, |e| e.listeners.remove(name));
	}

	fn set_text_content(&self, el: ElementId, text: &str) {
		let children = self
			.with_mut(el, |e| {
				e.text = text.to_owned();
				std::mem::take(&mut e.children)
			})
			.unwrap_or_default();

		for child in children {
			self.with_mut(child, |e| e.parent = None);
		}
	}

	fn append_child(&self, parent: ElementId, child: ElementId) {
		self.detach(child);
		self.with_mut(parent, |e| e.children.push(child));
		self.with_mut(child, |e| e.parent = Some(parent));
	}

	fn remove_child(&self, parent: ElementId, child: ElementId) {
		if self.parent_node(child) != Some(parent) {
			tracing::warn!(?parent, ?child, "remove_child: not a child");
			return;
		}
		self.detach(child);
	}

	fn replace_child(&self, parent: ElementId, new: ElementId, old: ElementId) {
		if new == old {
			return;
		}

		if self.parent_node(old) != Some(parent) {
			tracing::warn!(?parent, ?old, "replace_child: not a child");
			return;
		}

		self.detach(new);
		let position = self
			.with(parent, |e| e.children.iter().position(|c| *c == old))
			.flatten()
			.unwrap_or_default();

		self.with_mut(parent, |e| e.children[position] = new);
		self.with_mut(old, |e| e.parent = None);
		self.with_mut(new, |e| e.parent = Some(parent));
	}

	fn parent_node(&self, el: ElementId) -> Option<ElementId> {
		self.with(el, |e| e.parent).flatten()
	}
}
