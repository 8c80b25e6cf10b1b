use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use fxhash::FxHashMap;
use serde_json::{Map, Value};

use crate::event::Invoker;
use crate::{Component, ElementId, Handler, Options};

/// Declarative data of a virtual node.
#[derive(Debug, Clone, Default)]
pub struct VNodeData {
	pub attrs: BTreeMap<String, String>,
	pub class: Option<String>,
	pub on: BTreeMap<String, Handler>,
	pub props: Map<String, Value>,
	pub key: Option<String>,
}

impl VNodeData {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.attrs.insert(key.into(), value.into());
		self
	}

	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class = Some(class.into());
		self
	}

	pub fn on(mut self, event: impl Into<String>, handler: Handler) -> Self {
		self.on.insert(event.into(), handler);
		self
	}

	pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.props.insert(key.into(), value.into());
		self
	}

	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}
}

#[derive(Debug)]
pub enum Child {
	Text(String),
	Node(VNode),
}

impl From<VNode> for Child {
	fn from(node: VNode) -> Self {
		Child::Node(node)
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Child::Text(text.to_owned())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Child::Text(text)
	}
}

/// Children of a virtual node. Anything that is not a sequence is
/// rendered as text.
#[derive(Debug)]
pub enum Children {
	Text(String),
	Nodes(Vec<Child>),
}

impl Children {
	pub(crate) fn has_text(&self) -> bool {
		match self {
			Children::Text(_) => true,
			Children::Nodes(nodes) => nodes.iter().any(|c| matches!(c, Child::Text(_))),
		}
	}

	pub(crate) fn is_all_text(&self) -> bool {
		match self {
			Children::Text(_) => true,
			Children::Nodes(nodes) => nodes.iter().all(|c| matches!(c, Child::Text(_))),
		}
	}

	/// Text left on the element once all string children are applied.
	/// Each string overwrites the previous one.
	pub(crate) fn last_text(&self) -> Option<&str> {
		match self {
			Children::Text(text) => Some(text),
			Children::Nodes(nodes) => nodes.iter().rev().find_map(|c| match c {
				Child::Text(text) => Some(text.as_str()),
				Child::Node(_) => None,
			}),
		}
	}
}

impl Default for Children {
	fn default() -> Self {
		Children::Nodes(Vec::new())
	}
}

impl From<()> for Children {
	fn from(_: ()) -> Self {
		Children::default()
	}
}

impl From<&str> for Children {
	fn from(text: &str) -> Self {
		Children::Text(text.to_owned())
	}
}

impl From<String> for Children {
	fn from(text: String) -> Self {
		Children::Text(text)
	}
}

impl From<Value> for Children {
	fn from(value: Value) -> Self {
		Children::Text(text_of(&value))
	}
}

impl From<Vec<Child>> for Children {
	fn from(nodes: Vec<Child>) -> Self {
		Children::Nodes(nodes)
	}
}

impl From<Vec<VNode>> for Children {
	fn from(nodes: Vec<VNode>) -> Self {
		Children::Nodes(nodes.into_iter().map(Child::Node).collect())
	}
}

/// Text form of a value: strings as-is, everything else as JSON.
pub fn text_of(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		other => other.to_string(),
	}
}

/// Description of one element or one child component instantiation.
///
/// Once handed to the renderer the node records the concrete element
/// (or child instance) it produced, so the next render can patch it.
pub struct VNode {
	tag: String,
	data: VNodeData,
	children: Children,
	component: Option<Rc<Options>>,
	pub(crate) element: Cell<Option<ElementId>>,
	pub(crate) instance: RefCell<Option<Component>>,
	pub(crate) listeners: RefCell<BTreeMap<String, Invoker>>,
}

impl VNode {
	pub fn element(tag: impl Into<String>, data: VNodeData, children: impl Into<Children>) -> Self {
		VNode {
			tag: tag.into(),
			data,
			children: children.into(),
			component: None,
			element: Cell::new(None),
			instance: RefCell::new(None),
			listeners: RefCell::new(BTreeMap::new()),
		}
	}

	pub fn component(
		tag: impl Into<String>,
		options: Rc<Options>,
		data: VNodeData,
		children: impl Into<Children>,
	) -> Self {
		VNode {
			component: Some(options),
			..VNode::element(tag, data, children)
		}
	}

	pub fn tag(&self) -> &str {
		&self.tag
	}

	pub fn data(&self) -> &VNodeData {
		&self.data
	}

	pub fn children(&self) -> &Children {
		&self.children
	}

	pub fn component_options(&self) -> Option<&Rc<Options>> {
		self.component.as_ref()
	}

	pub fn is_component(&self) -> bool {
		self.component.is_some()
	}

	/// Child instance created for a component node.
	pub fn instance(&self) -> Option<Component> {
		self.instance.borrow().clone()
	}

	/// Concrete output of this node, if it has been rendered.
	pub fn rendered(&self) -> Option<ElementId> {
		match &*self.instance.borrow() {
			Some(instance) => instance.element(),
			None => self.element.get(),
		}
	}

	/// Whether `other` describes the same node, so that its output can
	/// be patched instead of rebuilt.
	pub fn same_node(&self, other: &VNode) -> bool {
		let same_component = match (&self.component, &other.component) {
			(Some(a), Some(b)) => Rc::ptr_eq(a, b),
			(None, None) => true,
			_ => false,
		};

		same_component && self.tag == other.tag && self.data.key == other.data.key
	}
}

impl fmt::Debug for VNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("VNode")
			.field("tag", &self.tag)
			.field("component", &self.component.is_some())
			.field("data", &self.data)
			.field("children", &self.children)
			.finish()
	}
}

/// Virtual node constructor handed to render functions.
pub struct Builder<'a> {
	components: &'a FxHashMap<String, Rc<Options>>,
}

impl<'a> Builder<'a> {
	pub(crate) fn new(components: &'a FxHashMap<String, Rc<Options>>) -> Self {
		Builder { components }
	}

	/// Builds a component node when `tag` names a registered component,
	/// a plain element node otherwise.
	pub fn create_element(
		&self,
		tag: &str,
		data: VNodeData,
		children: impl Into<Children>,
	) -> VNode {
		match self.components.get(tag) {
			Some(options) => VNode::component(tag, options.clone(), data, children),
			None => VNode::element(tag, data, children),
		}
	}
}
