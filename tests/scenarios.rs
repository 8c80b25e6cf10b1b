use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weave::macros::enclose;
use weave::{
	children, json, Builder, Change, Component, Error, Handler, Lifecycle, MemoryBackend,
	Options, VNodeData, Value,
};

mod mock;
use mock::Spy;

fn backend() -> Rc<MemoryBackend> {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	Rc::new(MemoryBackend::new())
}

#[test]
fn counter_text_follows_assignment() {
	let backend = backend();
	let options = Options::new(|vm: &Component, h: &Builder| {
		Ok(h.create_element("span", VNodeData::new(), vm.read("count")?))
	})
	.data(|| json!({ "count": 0 }));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	assert_eq!(backend.text(vm.element().unwrap()), "0");

	vm.set("count", 5).unwrap();

	assert_eq!(backend.text(vm.element().unwrap()), "5");
}

#[test]
fn props_render_and_stay_writable() {
	let backend = backend();
	let options = Options::new(|vm: &Component, h: &Builder| {
		Ok(h.create_element("span", VNodeData::new(), vm.read("label")?))
	})
	.prop("label")
	.props_data(json!({ "label": "hi" }).as_object().cloned().unwrap_or_default());

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	assert_eq!(backend.text(vm.element().unwrap()), "hi");

	// Props are read-only by convention only.
	vm.set("label", "overwritten").unwrap();
	assert_eq!(backend.text(vm.element().unwrap()), "overwritten");
}

fn pressable() -> Options {
	Options::new(|vm: &Component, h: &Builder| {
		Ok(h.create_element(
			"button",
			VNodeData::new().on("click", vm.bind("press")),
			vm.read("x")?,
		))
	})
	.name("pressable")
	.prop("x")
	.method("press", |vm: &Component, _: &[Value]| {
		vm.emit("click", &[json!("arg")])?;
		Ok(Value::Null)
	})
}

#[test]
fn child_emit_reaches_the_parent_handler_once() {
	let backend = backend();
	let mock = mock::SharedMock::new();

	let on_click = Handler::new(enclose!((mock) move |args: &[Value]| {
		let arg = args.first().map(weave::text_of).unwrap_or_default();
		mock.get().trigger(arg);
		Ok(())
	}));

	let options = Options::new(move |_: &Component, h: &Builder| {
		let child = h.create_element(
			"pressable",
			VNodeData::new().prop("x", 1).on("click", on_click.clone()),
			(),
		);
		Ok(h.create_element("div", VNodeData::new(), children![child]))
	})
	.component("pressable", pressable());

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();

	let root = vm.element().unwrap();
	let button = backend.children(root)[0];
	assert_eq!(backend.tag(button), "button");
	assert_eq!(backend.text(button), "1");

	mock.get()
		.expect_trigger()
		.with(mockall::predicate::eq("arg".to_owned()))
		.times(1)
		.return_const(());

	assert!(backend.dispatch(button, "click", &[]).unwrap());

	mock.get().checkpoint();
}

#[test]
fn component_bindings_are_not_element_listeners() {
	let backend = backend();
	let child = Options::new(|_: &Component, h: &Builder| {
		Ok(h.create_element("span", VNodeData::new(), "child"))
	})
	.prop("x");

	let options = Options::new(|_: &Component, h: &Builder| {
		Ok(h.create_element(
			"child",
			VNodeData::new()
				.attr("id", "ignored")
				.prop("x", 1)
				.on("click", Handler::new(|_: &[Value]| Ok(()))),
			(),
		))
	})
	.component("child", child);

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let el = vm.element().unwrap();

	assert_eq!(backend.tag(el), "span");
	assert!(backend.listeners(el).is_empty());
	assert_eq!(backend.attribute(el, "id"), None);
}

#[test]
fn undeclared_watch_fails_before_mounting() {
	let options = Options::new(|_: &Component, h: &Builder| {
		Ok(h.create_element("p", VNodeData::new(), ()))
	})
	.data(|| json!({ "count": 0 }))
	.watch("countt", |_: &Component, _: &Change| Ok(()));

	assert!(matches!(
		Component::new(options, backend()),
		Err(Error::UnknownWatchTarget(_))
	));
}

/// Parent passing `label` down, with a child that counts its renders
/// and hands its instance out through `mounted`.
fn family(
	child_renders: &Rc<Cell<usize>>,
	child_slot: &Rc<RefCell<Option<Component>>>,
) -> Options {
	let child = Options::new(enclose!((child_renders) move |vm: &Component, h: &Builder| {
		child_renders.set(child_renders.get() + 1);
		Ok(h.create_element("em", VNodeData::new(), vm.read("label")?))
	}))
	.prop("label")
	.data(|| json!({ "local": 0 }))
	.mounted(enclose!((child_slot) move |vm: &Component| {
		*child_slot.borrow_mut() = Some(vm.clone());
		Ok(())
	}));

	Options::new(|vm: &Component, h: &Builder| {
		let head = h.create_element("h2", VNodeData::new(), vm.read("title")?);
		let body = if vm.read("show")? == json!(true) {
			h.create_element("labelled", VNodeData::new().prop("label", vm.read("label")?), ())
		} else {
			h.create_element("p", VNodeData::new(), "hidden")
		};
		Ok(h.create_element("section", VNodeData::new(), children![head, body]))
	})
	.data(|| json!({ "title": "t", "label": "a", "show": true }))
	.component("labelled", child)
}

#[test]
fn child_rerenders_only_when_its_props_change() {
	let backend = backend();
	let renders = Rc::new(Cell::new(0));
	let slot = Rc::new(RefCell::new(None));

	let vm = Component::new(family(&renders, &slot), backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let section = vm.element().unwrap();
	let child = slot.borrow().clone().unwrap();
	assert_eq!(backend.text_content(section), "ta");
	assert_eq!(renders.get(), 1);

	vm.set("title", "T").unwrap();
	assert_eq!(renders.get(), 1);
	assert_eq!(backend.text_content(section), "Ta");

	vm.set("label", "b").unwrap();
	assert_eq!(renders.get(), 2);
	assert_eq!(backend.text_content(section), "Tb");

	// The same instance was kept across parent renders.
	assert_eq!(slot.borrow().clone().unwrap().element(), child.element());
	assert_eq!(child.lifecycle(), Lifecycle::Mounted);
}

#[test]
fn replaced_child_is_torn_down() {
	let backend = backend();
	let renders = Rc::new(Cell::new(0));
	let slot = Rc::new(RefCell::new(None));

	let vm = Component::new(family(&renders, &slot), backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let child = slot.borrow().clone().unwrap();
	assert_eq!(child.subscriber_count("label"), 1);

	vm.set("show", false).unwrap();

	assert_eq!(child.lifecycle(), Lifecycle::Destroyed);
	assert_eq!(child.subscriber_count("label"), 0);
	assert_eq!(backend.text_content(vm.element().unwrap()), "thidden");

	child.set("label", "late").unwrap();
	assert_eq!(renders.get(), 1);

	vm.set("show", true).unwrap();
	let fresh = slot.borrow().clone().unwrap();
	assert_eq!(fresh.lifecycle(), Lifecycle::Mounted);
	assert_eq!(backend.text_content(vm.element().unwrap()), "ta");
}

#[test]
fn child_state_changes_stay_inside_the_parent() {
	let backend = backend();
	let child = Options::new(|vm: &Component, h: &Builder| {
		let tag = if vm.read("open")? == json!(true) { "strong" } else { "span" };
		Ok(h.create_element(tag, VNodeData::new(), "item"))
	})
	.data(|| json!({ "open": false }))
	.mounted(|vm: &Component| vm.set("open", true));

	let options = Options::new(|_: &Component, h: &Builder| {
		Ok(h.create_element(
			"div",
			VNodeData::new(),
			children![h.create_element("item", VNodeData::new(), ())],
		))
	})
	.component("item", child);

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let root = vm.element().unwrap();

	let children = backend.children(root);
	assert_eq!(children.len(), 1);
	assert_eq!(backend.tag(children[0]), "strong");

	vm.update().unwrap();
	let after = backend.children(root);
	assert_eq!(after, children);
}
