use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use fxhash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};

use crate::evaluation::Evaluation;
use crate::options::MethodFn;
use crate::view::{child, Source};
use crate::{
	patch, Backend, Builder, Change, Dependencies, ElementId, Error, Field, Handler, Options, Path,
	Result, Subscriber, VNode, View, Watcher,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
	Created,
	Mounted,
	Destroyed,
}

/// A live component instance.
///
/// This handle is what render functions, computed getters, methods,
/// watch handlers and hooks receive. Clones refer to the same instance.
#[derive(Clone)]
pub struct Component {
	body: Rc<ComponentBody>,
}

pub(crate) struct ComponentBody {
	options: Options,
	backend: Rc<dyn Backend>,
	props: RefCell<Value>,
	data: RefCell<Value>,
	fields: RefCell<FxHashMap<String, Value>>,
	events: RefCell<FxHashMap<String, Handler>>,
	dependencies: RefCell<Dependencies>,
	frames: RefCell<Vec<Rc<Evaluation>>>,
	running: RefCell<FxHashSet<Subscriber>>,
	render_subscriber: Subscriber,
	render_paths: RefCell<BTreeSet<Path>>,
	watchers: RefCell<Vec<Watcher>>,
	state: Cell<Lifecycle>,
	first_render: Cell<bool>,
	rendering: Cell<bool>,
	element: Cell<Option<ElementId>>,
	vnode: RefCell<Option<VNode>>,
}

impl ComponentBody {
	pub(crate) fn store(&self, source: Source) -> &RefCell<Value> {
		match source {
			Source::Props => &self.props,
			Source::Data => &self.data,
		}
	}
}

/// A method resolved through [`Component::get`], bound to its instance.
#[derive(Clone)]
pub struct Method {
	owner: Component,
	name: String,
	func: MethodFn,
}

impl Method {
	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn call(&self, args: &[Value]) -> Result<Value> {
		(self.func)(&self.owner, args)
	}
}

impl Component {
	/// Builds an instance: props first, then data, then the dependency
	/// registry, then the `watch` declarations.
	pub fn new(options: Options, backend: Rc<dyn Backend>) -> Result<Self> {
		let props = Value::Object(
			options
				.props
				.iter()
				.map(|name| {
					let value = options.props_data.get(name).cloned().unwrap_or(Value::Null);
					(name.clone(), value)
				})
				.collect::<Map<_, _>>(),
		);

		let data = match &options.data {
			Some(init) => init(),
			None => Value::Object(Map::new()),
		};
		if !data.is_object() {
			return Err(Error::InvalidData);
		}

		let body = Rc::new_cyclic(|this: &Weak<ComponentBody>| {
			let this = this.clone();
			let render_subscriber =
				Subscriber::new(format!("{}::render", options.display_name()), move |_| {
					match this.upgrade() {
						Some(body) => Component { body }.render_pass(),
						None => Ok(()),
					}
				});

			ComponentBody {
				options,
				backend,
				props: RefCell::new(props),
				data: RefCell::new(data),
				fields: RefCell::new(FxHashMap::default()),
				events: RefCell::new(FxHashMap::default()),
				dependencies: RefCell::new(Dependencies::new()),
				frames: RefCell::new(Vec::new()),
				running: RefCell::new(FxHashSet::default()),
				render_subscriber,
				render_paths: RefCell::new(BTreeSet::new()),
				watchers: RefCell::new(Vec::new()),
				state: Cell::new(Lifecycle::Created),
				first_render: Cell::new(false),
				rendering: Cell::new(false),
				element: Cell::new(None),
				vnode: RefCell::new(None),
			}
		});

		let component = Component { body };
		component.init_watch()?;
		Ok(component)
	}

	fn init_watch(&self) -> Result<()> {
		for (key, handler) in &self.body.options.watch {
			let is_data = self.body.data.borrow().get(key).is_some();
			if is_data {
				let this = self.downgrade();
				let handler = handler.clone();
				self.watch(key.as_str(), move |change| match this.upgrade() {
					Some(body) => handler(&Component { body }, change),
					None => Ok(()),
				});
			} else if let Some(getter) = self.body.options.computed.get(key) {
				let watcher = Watcher::new(self, key.clone(), getter.clone(), Some(handler.clone()))?;
				self.body.watchers.borrow_mut().push(watcher);
			} else {
				return Err(Error::UnknownWatchTarget(key.clone()));
			}
		}

		Ok(())
	}

	pub(crate) fn body(&self) -> &ComponentBody {
		&self.body
	}

	pub(crate) fn downgrade(&self) -> Weak<ComponentBody> {
		Rc::downgrade(&self.body)
	}

	pub(crate) fn from_body(body: Rc<ComponentBody>) -> Self {
		Component { body }
	}

	pub fn options(&self) -> &Options {
		&self.body.options
	}

	pub fn name(&self) -> &str {
		self.body.options.display_name()
	}

	pub fn backend(&self) -> &Rc<dyn Backend> {
		&self.body.backend
	}

	pub fn lifecycle(&self) -> Lifecycle {
		self.body.state.get()
	}

	pub fn is_first_render(&self) -> bool {
		self.body.first_render.get()
	}

	/// Concrete output currently attached for this instance.
	pub fn element(&self) -> Option<ElementId> {
		let rendered = self.body.vnode.borrow().as_ref().and_then(VNode::rendered);
		rendered.or_else(|| self.body.element.get())
	}

	/// Tracked view of the whole props object.
	pub fn props(&self) -> View {
		View::new(self.clone(), Source::Props, Path::root())
	}

	/// Tracked view of the whole data object.
	pub fn data(&self) -> View {
		View::new(self.clone(), Source::Data, Path::root())
	}

	/// Resolves `key`: prop, data field, computed property, method, then
	/// a plain field of the instance.
	pub fn get(&self, key: &str) -> Result<Field> {
		if self.has(Source::Props, key) {
			return Ok(self.props().get(key));
		}

		if self.has(Source::Data, key) {
			return Ok(self.data().get(key));
		}

		if let Some(getter) = self.body.options.computed.get(key).cloned() {
			return getter(self).map(Field::Value);
		}

		if let Some(func) = self.body.options.methods.get(key).cloned() {
			return Ok(Field::Method(Method {
				owner: self.clone(),
				name: key.to_owned(),
				func,
			}));
		}

		Ok(self
			.body
			.fields
			.borrow()
			.get(key)
			.cloned()
			.map_or(Field::Absent, Field::Value))
	}

	/// Reads a dotted path. Every level of the traversal is tracked.
	pub fn read(&self, path: &str) -> Result<Value> {
		self.resolve(&Path::new(path))?.into_value(path)
	}

	fn resolve(&self, path: &Path) -> Result<Field> {
		let mut segments = path.segments();
		let Some(first) = segments.next() else {
			return Ok(Field::Absent);
		};

		let mut field = self.get(first)?;
		for segment in segments {
			field = match field {
				Field::Object(view) => view.get(segment),
				Field::Value(value) => child(&value, segment)
					.cloned()
					.map_or(Field::Absent, Field::Value),
				Field::Method(method) => return Err(Error::NotAValue(method.name().to_owned())),
				Field::Absent => Field::Absent,
			};
		}

		Ok(field)
	}

	/// Writes `key`: prop, then data field. Any other key becomes a plain
	/// field of the instance and notifies nobody.
	pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<()> {
		let value = value.into();
		if self.has(Source::Props, key) {
			return self.props().set(key, value);
		}

		if self.has(Source::Data, key) {
			return self.data().set(key, value);
		}

		self.body.fields.borrow_mut().insert(key.to_owned(), value);
		Ok(())
	}

	/// Writes a dotted path, e.g. `user.name`. When the parent is not an
	/// object or an array nothing is stored, but subscribers of the path
	/// are still notified.
	pub fn set_path(&self, path: &str, value: impl Into<Value>) -> Result<()> {
		let path = Path::new(path);
		let value = value.into();
		match path.split_last() {
			None => Ok(()),
			Some((parent, key)) if parent.is_root() => self.set(key, value),
			Some((parent, key)) => match self.resolve(&parent) {
				Ok(Field::Object(view)) => view.set(key, value),
				_ => self.notify(path.clone(), None, Some(value)),
			},
		}
	}

	pub fn delete(&self, key: &str) -> Result<()> {
		if self.has(Source::Props, key) {
			return self.props().delete(key);
		}

		if self.has(Source::Data, key) {
			return self.data().delete(key);
		}

		self.body.fields.borrow_mut().remove(key);
		Ok(())
	}

	pub fn delete_path(&self, path: &str) -> Result<()> {
		let path = Path::new(path);
		match path.split_last() {
			None => Ok(()),
			Some((parent, key)) if parent.is_root() => self.delete(key),
			Some((parent, key)) => match self.resolve(&parent)? {
				Field::Object(view) => view.delete(key),
				_ => Ok(()),
			},
		}
	}

	pub fn call(&self, method: &str, args: &[Value]) -> Result<Value> {
		let func = self
			.body
			.options
			.methods
			.get(method)
			.cloned()
			.ok_or_else(|| Error::UnknownMethod(method.to_owned()))?;
		func(self, args)
	}

	/// Event handler invoking `method` with the event arguments. Holds the
	/// instance weakly, so rendered listeners do not keep it alive.
	pub fn bind(&self, method: &str) -> Handler {
		let this = self.downgrade();
		let method = method.to_owned();
		Handler::new(move |args| match this.upgrade() {
			Some(body) => Component { body }.call(&method, args).map(drop),
			None => Ok(()),
		})
	}

	/// Invokes the handler the parent bound to `event`, if any.
	pub fn emit(&self, event: &str, args: &[Value]) -> Result<()> {
		let handler = self.body.events.borrow().get(event).cloned();
		match handler {
			Some(handler) => handler.call(args),
			None => Ok(()),
		}
	}

	pub(crate) fn set_listeners<I>(&self, listeners: I)
	where
		I: IntoIterator<Item = (String, Handler)>,
	{
		*self.body.events.borrow_mut() = listeners.into_iter().collect();
	}

	/// Subscribes `callback` to writes of `path`.
	pub fn watch(
		&self,
		path: impl Into<Path>,
		callback: impl Fn(&Change) -> Result<()> + 'static,
	) -> Subscriber {
		let path = path.into();
		let subscriber = Subscriber::new(path.to_string(), callback);
		self.body
			.dependencies
			.borrow_mut()
			.subscribe(path, subscriber.clone());
		subscriber
	}

	pub fn unwatch(&self, path: &Path, subscriber: &Subscriber) -> bool {
		self.body
			.dependencies
			.borrow_mut()
			.unsubscribe(path, subscriber)
	}

	pub fn subscriber_count(&self, path: &str) -> usize {
		self.body.dependencies.borrow().count(path)
	}

	/// Registers `path` as a dependency of every active collection frame.
	pub(crate) fn collect(&self, path: &Path) {
		if self.body.state.get() == Lifecycle::Destroyed {
			return;
		}

		let frames = self.body.frames.borrow();
		if frames.is_empty() {
			return;
		}

		let mut dependencies = self.body.dependencies.borrow_mut();
		for frame in frames.iter() {
			frame.based_on(path.clone());
			dependencies.subscribe(path.clone(), frame.subscriber().clone());
		}
	}

	/// Runs every subscriber of `path`, in registration order. The first
	/// error stops the notification.
	pub(crate) fn notify(
		&self,
		path: Path,
		previous: Option<Value>,
		next: Option<Value>,
	) -> Result<()> {
		let change = Change {
			path,
			previous,
			next,
		};

		let subscribers = self
			.body
			.dependencies
			.borrow()
			.subscribers(change.path.as_str());

		tracing::trace!(
			component = self.name(),
			path = %change.path,
			subscribers = subscribers.len(),
			"notify"
		);

		for subscriber in subscribers {
			self.run(&subscriber, &change)?;
		}

		Ok(())
	}

	fn run(&self, subscriber: &Subscriber, change: &Change) -> Result<()> {
		if !self.body.running.borrow_mut().insert(subscriber.clone()) {
			return Err(Error::Cycle {
				path: change.path.clone(),
			});
		}

		let result = subscriber.call(change);
		self.body.running.borrow_mut().remove(subscriber);
		result
	}

	/// Evaluates `func` inside a collection frame owned by `subscriber`.
	/// On success the paths collected last time and no longer read are
	/// unsubscribed.
	pub(crate) fn track<T>(
		&self,
		subscriber: &Subscriber,
		paths: &RefCell<BTreeSet<Path>>,
		func: impl FnOnce() -> Result<T>,
	) -> Result<T> {
		let frame = Rc::new(Evaluation::new(subscriber.clone()));
		self.body.frames.borrow_mut().push(frame.clone());

		let result = func();

		self.body
			.frames
			.borrow_mut()
			.retain(|f| !Rc::ptr_eq(f, &frame));
		let next = frame.take();

		if result.is_ok() {
			let prev = std::mem::replace(&mut *paths.borrow_mut(), next);
			self.body
				.dependencies
				.borrow_mut()
				.swap(subscriber, &prev, &paths.borrow());
		} else {
			paths.borrow_mut().extend(next);
		}

		result
	}

	/// Attaches the instance: renders for the first time, replacing
	/// `root` in its parent when there is one, then runs `mounted`.
	pub fn mount(&self, root: Option<ElementId>) -> Result<Self> {
		if self.body.state.get() != Lifecycle::Created {
			return Err(Error::AlreadyMounted);
		}

		self.body.element.set(root);
		self.body.first_render.set(true);
		let result = self.render_pass();
		self.body.first_render.set(false);
		result?;

		self.body.state.set(Lifecycle::Mounted);

		if let Some(mounted) = self.body.options.mounted.clone() {
			mounted(self)?;
		}

		Ok(self.clone())
	}

	/// Renders again and patches the previous output.
	pub fn update(&self) -> Result<()> {
		self.render_pass()
	}

	fn render_pass(&self) -> Result<()> {
		let body = &self.body;
		if body.state.get() == Lifecycle::Destroyed {
			return Ok(());
		}

		if body.rendering.replace(true) {
			return Err(Error::ReentrantRender(self.name().to_owned()));
		}

		let result = self.render_and_patch();
		body.rendering.set(false);
		result?;

		tracing::debug!(
			component = self.name(),
			first = body.first_render.get(),
			"updated"
		);

		if body.first_render.get() {
			return Ok(());
		}

		if let Some(updated) = body.options.updated.clone() {
			updated(self)?;
		}

		Ok(())
	}

	fn render_and_patch(&self) -> Result<()> {
		let body = &self.body;
		let previous = self.element();
		let parent = previous.and_then(|el| body.backend.parent_node(el));

		let vnode = self.track(&body.render_subscriber, &body.render_paths, || {
			let builder = Builder::new(&body.options.components);
			(body.options.render)(self, &builder)
		})?;

		let old = body.vnode.borrow_mut().take();
		let element = patch::patch(self, old.as_ref(), &vnode)?;
		*body.vnode.borrow_mut() = Some(vnode);
		body.element.set(Some(element));

		if let (Some(parent), Some(previous)) = (parent, previous) {
			if previous != element && body.backend.parent_node(previous) == Some(parent) {
				body.backend.replace_child(parent, element, previous);
			}
		}

		Ok(())
	}

	/// Writes the props supplied by a re-rendered parent. Only changed
	/// props notify.
	pub(crate) fn sync_props(&self, props_data: &Map<String, Value>) -> Result<()> {
		let props = self.props();
		for name in &self.body.options.props {
			let next = props_data.get(name).cloned().unwrap_or(Value::Null);
			let changed = self.body.props.borrow().get(name) != Some(&next);
			if changed {
				props.set(name, next)?;
			}
		}

		Ok(())
	}

	/// Detaches the instance from everything that could still trigger it.
	/// Child instances are destroyed too.
	pub fn destroy(&self) {
		let body = &self.body;
		if body.state.replace(Lifecycle::Destroyed) == Lifecycle::Destroyed {
			return;
		}

		body.dependencies.borrow_mut().clear();
		body.render_paths.borrow_mut().clear();
		body.watchers.borrow_mut().clear();
		body.events.borrow_mut().clear();

		let vnode = body.vnode.borrow_mut().take();
		if let Some(vnode) = vnode {
			patch::teardown(&vnode);
		}

		tracing::debug!(component = self.name(), "destroyed");
	}

	fn has(&self, source: Source, key: &str) -> bool {
		self.body.store(source).borrow().get(key).is_some()
	}
}

impl fmt::Debug for Component {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Component")
			.field("name", &self.name())
			.field("lifecycle", &self.lifecycle())
			.field("element", &self.body.element.get())
			.finish()
	}
}
