use std::rc::Rc;

use fxhash::FxHashMap;
use serde_json::{Map, Value};

use crate::{Builder, Change, Component, Result, VNode};

pub type RenderFn = Rc<dyn Fn(&Component, &Builder<'_>) -> Result<VNode>>;
pub type DataFn = Rc<dyn Fn() -> Value>;
pub type MethodFn = Rc<dyn Fn(&Component, &[Value]) -> Result<Value>>;
pub type ComputedFn = Rc<dyn Fn(&Component) -> Result<Value>>;
pub type WatchFn = Rc<dyn Fn(&Component, &Change) -> Result<()>>;
pub type HookFn = Rc<dyn Fn(&Component) -> Result<()>>;

/// Configuration of one component.
///
/// Cloning is cheap; every callback is shared.
#[derive(Clone)]
pub struct Options {
	pub(crate) name: Option<String>,
	pub(crate) props: Vec<String>,
	pub(crate) props_data: Map<String, Value>,
	pub(crate) data: Option<DataFn>,
	pub(crate) methods: FxHashMap<String, MethodFn>,
	pub(crate) computed: FxHashMap<String, ComputedFn>,
	pub(crate) watch: Vec<(String, WatchFn)>,
	pub(crate) components: FxHashMap<String, Rc<Options>>,
	pub(crate) render: RenderFn,
	pub(crate) mounted: Option<HookFn>,
	pub(crate) updated: Option<HookFn>,
}

impl Options {
	pub fn new(render: impl Fn(&Component, &Builder<'_>) -> Result<VNode> + 'static) -> Self {
		Options {
			name: None,
			props: Vec::new(),
			props_data: Map::new(),
			data: None,
			methods: FxHashMap::default(),
			computed: FxHashMap::default(),
			watch: Vec::new(),
			components: FxHashMap::default(),
			render: Rc::new(render),
			mounted: None,
			updated: None,
		}
	}

	/// Name used in traces.
	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	pub fn prop(mut self, name: impl Into<String>) -> Self {
		self.props.push(name.into());
		self
	}

	pub fn props<I, S>(mut self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.props.extend(names.into_iter().map(Into::into));
		self
	}

	/// Values for the declared props, as supplied by the parent.
	pub fn props_data(mut self, props_data: Map<String, Value>) -> Self {
		self.props_data = props_data;
		self
	}

	/// Initializer of the instance data. Invoked once per instance and
	/// must return an object.
	pub fn data(mut self, data: impl Fn() -> Value + 'static) -> Self {
		self.data = Some(Rc::new(data));
		self
	}

	pub fn method(
		mut self,
		name: impl Into<String>,
		method: impl Fn(&Component, &[Value]) -> Result<Value> + 'static,
	) -> Self {
		self.methods.insert(name.into(), Rc::new(method));
		self
	}

	/// Derived value, re-evaluated on every access.
	pub fn computed(
		mut self,
		name: impl Into<String>,
		getter: impl Fn(&Component) -> Result<Value> + 'static,
	) -> Self {
		self.computed.insert(name.into(), Rc::new(getter));
		self
	}

	/// Handler for changes of a data field or a computed property.
	pub fn watch(
		mut self,
		name: impl Into<String>,
		handler: impl Fn(&Component, &Change) -> Result<()> + 'static,
	) -> Self {
		self.watch.push((name.into(), Rc::new(handler)));
		self
	}

	/// Registers a child component under the tag `tag`.
	pub fn component(mut self, tag: impl Into<String>, options: Options) -> Self {
		self.components.insert(tag.into(), Rc::new(options));
		self
	}

	pub fn mounted(mut self, hook: impl Fn(&Component) -> Result<()> + 'static) -> Self {
		self.mounted = Some(Rc::new(hook));
		self
	}

	/// Invoked after every completed render pass, the first one included.
	pub fn updated(mut self, hook: impl Fn(&Component) -> Result<()> + 'static) -> Self {
		self.updated = Some(Rc::new(hook));
		self
	}

	pub(crate) fn display_name(&self) -> &str {
		self.name.as_deref().unwrap_or("<anonymous>")
	}
}

impl std::fmt::Debug for Options {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Options")
			.field("name", &self.name)
			.field("props", &self.props)
			.field("components", &self.components.keys().collect::<Vec<_>>())
			.finish()
	}
}
