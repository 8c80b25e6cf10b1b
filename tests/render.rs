use std::cell::{Cell, RefCell};
use std::rc::Rc;

use weave::macros::enclose;
use weave::{
	children, handler, json, Backend, Builder, Component, Error, Lifecycle, MemoryBackend, Options,
	VNode, VNodeData, Value,
};

fn backend() -> Rc<MemoryBackend> {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	Rc::new(MemoryBackend::new())
}

fn counter() -> Options {
	Options::new(|vm: &Component, h: &Builder| {
		let count = vm.read("count")?;
		let class = if count.as_i64().unwrap_or_default() % 2 == 0 {
			"even"
		} else {
			"odd"
		};
		Ok(h.create_element(
			"button",
			VNodeData::new()
				.attr("title", weave::text_of(&count))
				.class(class)
				.on("click", vm.bind("increment")),
			count,
		))
	})
	.data(|| json!({ "count": 0 }))
	.method("increment", |vm: &Component, _: &[Value]| {
		let next = vm.read("count")?.as_i64().unwrap_or_default() + 1;
		vm.set("count", next)?;
		Ok(Value::Null)
	})
}

#[test]
fn text_follows_data_in_place() {
	let backend = backend();
	let vm = Component::new(counter(), backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();

	let el = vm.element().unwrap();
	let created = backend.created();
	assert_eq!(backend.tag(el), "button");
	assert_eq!(backend.text(el), "0");
	assert_eq!(backend.class(el).as_deref(), Some("even"));

	vm.set("count", 5).unwrap();

	assert_eq!(vm.element(), Some(el));
	assert_eq!(backend.text(el), "5");
	assert_eq!(backend.attribute(el, "title").as_deref(), Some("5"));
	assert_eq!(backend.class(el).as_deref(), Some("odd"));
	assert_eq!(backend.created(), created);
}

#[test]
fn listeners_survive_rerenders() {
	let backend = backend();
	let vm = Component::new(counter(), backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let el = vm.element().unwrap();

	assert!(backend.dispatch(el, "click", &[]).unwrap());
	assert!(backend.dispatch(el, "click", &[]).unwrap());

	assert_eq!(vm.read("count").unwrap(), json!(2));
	assert_eq!(backend.text(el), "2");
	assert_eq!(backend.listeners(el), vec!["click".to_owned()]);
}

#[test]
fn mount_replaces_the_placeholder() {
	let backend = backend();
	let container = backend.create_element("main");
	let placeholder = backend.create_element("div");
	backend.append_child(container, placeholder);

	let vm = Component::new(counter(), backend.clone())
		.unwrap()
		.mount(Some(placeholder))
		.unwrap();

	assert_eq!(backend.children(container), vec![vm.element().unwrap()]);
	assert_eq!(backend.parent_node(placeholder), None);
	assert_eq!(backend.to_html(container), "<main><button class=\"even\" title=\"0\">0</button></main>");

	assert!(matches!(vm.mount(None), Err(Error::AlreadyMounted)));
}

#[test]
fn changed_tag_is_rebuilt_in_place() {
	let backend = backend();
	let container = backend.create_element("main");
	let placeholder = backend.create_element("div");
	backend.append_child(container, placeholder);

	let options = Options::new(|vm: &Component, h: &Builder| {
		let tag = if vm.read("heading")? == json!(true) { "h1" } else { "p" };
		Ok(h.create_element(tag, VNodeData::new(), "title"))
	})
	.data(|| json!({ "heading": false }));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(Some(placeholder))
		.unwrap();
	let before = vm.element().unwrap();

	vm.set("heading", true).unwrap();

	let after = vm.element().unwrap();
	assert_ne!(before, after);
	assert_eq!(backend.tag(after), "h1");
	assert_eq!(backend.children(container), vec![after]);
}

#[test]
fn removed_attributes_and_class_are_cleared() {
	let backend = backend();
	let options = Options::new(|vm: &Component, h: &Builder| {
		let mut data = VNodeData::new();
		if vm.read("active")? == json!(true) {
			data = data.attr("aria-current", "page").class("active");
		}
		Ok(h.create_element("a", data, "link"))
	})
	.data(|| json!({ "active": true }));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let el = vm.element().unwrap();
	assert_eq!(backend.attribute(el, "aria-current").as_deref(), Some("page"));

	vm.set("active", false).unwrap();

	assert_eq!(vm.element(), Some(el));
	assert_eq!(backend.attribute(el, "aria-current"), None);
	assert_eq!(backend.class(el), None);
}

#[test]
fn last_string_child_wins() {
	let backend = backend();
	let options = Options::new(|_: &Component, h: &Builder| {
		Ok(h.create_element("p", VNodeData::new(), children!["first", "second"]))
	});

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();

	assert_eq!(backend.text(vm.element().unwrap()), "second");
}

#[test]
fn lists_are_patched_by_position() {
	let backend = backend();
	let options = Options::new(|vm: &Component, h: &Builder| {
		let items = vm.read("items")?;
		let rows: Vec<VNode> = items
			.as_array()
			.into_iter()
			.flatten()
			.map(|item| h.create_element("li", VNodeData::new(), item.clone()))
			.collect();
		Ok(h.create_element("ul", VNodeData::new(), rows))
	})
	.data(|| json!({ "items": ["a", "b"] }));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let ul = vm.element().unwrap();
	let first = backend.children(ul)[0];

	vm.set("items", json!(["a", "b", "c"])).unwrap();
	let rows = backend.children(ul);
	assert_eq!(rows.len(), 3);
	assert_eq!(rows[0], first);
	assert_eq!(backend.text_content(ul), "abc");

	vm.set("items", json!(["z"])).unwrap();
	assert_eq!(backend.children(ul), vec![first]);
	assert_eq!(backend.text_content(ul), "z");
}

#[test]
fn mixed_children_are_rebuilt() {
	let backend = backend();
	let options = Options::new(|vm: &Component, h: &Builder| {
		let children = if vm.read("plain")? == json!(true) {
			children!["just text"]
		} else {
			children![h.create_element("b", VNodeData::new(), "bold")]
		};
		Ok(h.create_element("p", VNodeData::new(), children))
	})
	.data(|| json!({ "plain": false }));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	let el = vm.element().unwrap();
	assert_eq!(backend.to_html(el), "<p><b>bold</b></p>");

	vm.set("plain", true).unwrap();
	assert_eq!(backend.to_html(el), "<p>just text</p>");

	vm.set("plain", false).unwrap();
	assert_eq!(backend.to_html(el), "<p><b>bold</b></p>");
}

#[test]
fn updated_hook_runs_after_every_rerender() {
	let passes = Rc::new(Cell::new(0));
	let options = counter().updated(enclose!((passes) move |vm: &Component| {
		assert!(vm.element().is_some());
		passes.set(passes.get() + 1);
		Ok(())
	}));

	let vm = Component::new(options, backend()).unwrap().mount(None).unwrap();
	assert_eq!(passes.get(), 0);

	vm.set("count", 1).unwrap();
	vm.update().unwrap();

	assert_eq!(passes.get(), 2);
}

#[test]
fn updating_from_inside_render_is_reported() {
	let options = Options::new(|vm: &Component, h: &Builder| {
		vm.update()?;
		Ok(h.create_element("p", VNodeData::new(), "never"))
	});

	let vm = Component::new(options, backend()).unwrap();

	match vm.mount(None) {
		Err(Error::ReentrantRender(name)) => assert_eq!(name, "<anonymous>"),
		other => panic!("unexpected {:?}", other.map(|_| ())),
	}
}

#[test]
fn writing_while_rendering_is_reported() {
	let options = Options::new(|vm: &Component, h: &Builder| {
		let count = vm.read("count")?.as_i64().unwrap_or_default();
		vm.set("count", count + 1)?;
		Ok(h.create_element("p", VNodeData::new(), json!(count)))
	})
	.data(|| json!({ "count": 0 }));

	let vm = Component::new(options, backend()).unwrap();

	assert!(matches!(vm.mount(None), Err(Error::ReentrantRender(_))));
}

#[test]
fn render_errors_propagate() {
	let options = Options::new(|_: &Component, _: &Builder| Err(Error::custom("no render")));
	let vm = Component::new(options, backend()).unwrap();

	assert!(matches!(vm.mount(None), Err(Error::Custom(_))));
	assert_eq!(vm.lifecycle(), Lifecycle::Created);
}

#[test]
fn handler_macro_captures_clones() {
	let backend = backend();
	let clicks = Rc::new(RefCell::new(Vec::<Value>::new()));
	let options = Options::new(enclose!((clicks) move |_: &Component, h: &Builder| {
		let on_click = handler!((clicks) args => {
			clicks.borrow_mut().extend(args.iter().cloned());
			Ok(())
		});
		Ok(h.create_element("button", VNodeData::new().on("click", on_click), "go"))
	}));

	let vm = Component::new(options, backend.clone())
		.unwrap()
		.mount(None)
		.unwrap();
	backend
		.dispatch(vm.element().unwrap(), "click", &[json!("x")])
		.unwrap();

	assert_eq!(*clicks.borrow(), vec![json!("x")]);
}
