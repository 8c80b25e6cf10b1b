//! Turns virtual nodes into concrete elements and reconciles a new tree
//! against the previous one.
//!
//! Matching nodes (same tag, same component, same key) keep their
//! element and get their attributes, class, listeners and children
//! diffed in place. Child lists are compared by position. Anything else
//! is rebuilt, and the instances it owned are destroyed.

use crate::event::Invoker;
use crate::{Backend, Child, Children, Component, ElementId, Error, Result, VNode};

pub(crate) fn patch(owner: &Component, old: Option<&VNode>, new: &VNode) -> Result<ElementId> {
	match old {
		Some(old) if old.same_node(new) => patch_node(owner, old, new),
		Some(old) => {
			let element = create_dom(owner, new)?;
			teardown(old);
			Ok(element)
		}
		None => create_dom(owner, new),
	}
}

pub(crate) fn create_dom(owner: &Component, vnode: &VNode) -> Result<ElementId> {
	if let Some(options) = vnode.component_options() {
		let mut options = (**options).clone();
		options.props_data = vnode.data().props.clone();

		let child = Component::new(options, owner.backend().clone())?;
		*vnode.instance.borrow_mut() = Some(child.clone());
		child.set_listeners(vnode.data().on.clone());
		child.mount(None)?;

		return child.element().ok_or(Error::NotMounted);
	}

	let backend = owner.backend();
	let el = backend.create_element(vnode.tag());
	vnode.element.set(Some(el));

	let data = vnode.data();
	for (key, value) in &data.attrs {
		backend.set_attribute(el, key, value);
	}

	if let Some(class) = &data.class {
		backend.set_class(el, class);
	}

	{
		let mut listeners = vnode.listeners.borrow_mut();
		for (name, handler) in &data.on {
			let invoker = Invoker::new(handler.clone());
			backend.add_event_listener(el, name, invoker.listener());
			listeners.insert(name.clone(), invoker);
		}
	}

	append_children(owner, el, vnode.children())?;
	Ok(el)
}

/// Applies children in order: strings overwrite the text content, nodes
/// are instantiated and appended.
fn append_children(owner: &Component, el: ElementId, children: &Children) -> Result<()> {
	let backend = owner.backend();
	match children {
		Children::Text(text) => backend.set_text_content(el, text),
		Children::Nodes(nodes) => {
			for child in nodes {
				match child {
					Child::Text(text) => backend.set_text_content(el, text),
					Child::Node(node) => {
						let child = create_dom(owner, node)?;
						backend.append_child(el, child);
					}
				}
			}
		}
	}

	Ok(())
}

fn patch_node(owner: &Component, old: &VNode, new: &VNode) -> Result<ElementId> {
	if new.is_component() {
		return patch_component(owner, old, new);
	}

	let Some(el) = old.element.get() else {
		return create_dom(owner, new);
	};
	new.element.set(Some(el));

	let backend = owner.backend();
	let (before, after) = (old.data(), new.data());

	for (key, value) in &after.attrs {
		if before.attrs.get(key) != Some(value) {
			backend.set_attribute(el, key, value);
		}
	}
	for key in before.attrs.keys() {
		if !after.attrs.contains_key(key) {
			backend.remove_attribute(el, key);
		}
	}

	if before.class != after.class {
		match &after.class {
			Some(class) => backend.set_class(el, class),
			None => backend.remove_attribute(el, "class"),
		}
	}

	patch_listeners(&**backend, el, old, new);
	patch_children(owner, el, old.children(), new.children())?;

	Ok(el)
}

fn patch_listeners(backend: &dyn Backend, el: ElementId, old: &VNode, new: &VNode) {
	let on = &new.data().on;
	let mut invokers = old.listeners.take();

	for (name, handler) in on {
		match invokers.get(name) {
			Some(invoker) => invoker.retarget(handler.clone()),
			None => {
				let invoker = Invoker::new(handler.clone());
				backend.add_event_listener(el, name, invoker.listener());
				invokers.insert(name.clone(), invoker);
			}
		}
	}

	invokers.retain(|name, _| {
		let keep = on.contains_key(name);
		if !keep {
			backend.remove_event_listener(el, name);
		}
		keep
	});

	*new.listeners.borrow_mut() = invokers;
}

fn patch_component(owner: &Component, old: &VNode, new: &VNode) -> Result<ElementId> {
	let instance = old.instance.borrow_mut().take();
	let Some(child) = instance else {
		return create_dom(owner, new);
	};

	*new.instance.borrow_mut() = Some(child.clone());
	child.set_listeners(new.data().on.clone());
	child.sync_props(&new.data().props)?;

	child.element().ok_or(Error::NotMounted)
}

fn patch_children(owner: &Component, el: ElementId, old: &Children, new: &Children) -> Result<()> {
	let backend = owner.backend();

	match (old, new) {
		(Children::Nodes(before), Children::Nodes(after)) if !old.has_text() && !new.has_text() => {
			patch_list(owner, el, before, after)
		}
		_ if old.is_all_text() && new.is_all_text() => {
			let text = new.last_text();
			if old.last_text() != text {
				backend.set_text_content(el, text.unwrap_or_default());
			}
			Ok(())
		}
		_ => {
			teardown_children(old);
			backend.set_text_content(el, "");
			append_children(owner, el, new)
		}
	}
}

fn patch_list(owner: &Component, el: ElementId, old: &[Child], new: &[Child]) -> Result<()> {
	let backend = owner.backend();
	let old = nodes(old);
	let new = nodes(new);

	for i in 0..old.len().max(new.len()) {
		match (old.get(i), new.get(i)) {
			(Some(before), Some(after)) if before.same_node(after) => {
				let previous = before.rendered();
				let current = patch_node(owner, before, after)?;
				match previous {
					// A child instance that re-rendered has already swapped
					// its own output.
					Some(previous)
						if previous != current && backend.parent_node(previous) == Some(el) =>
					{
						backend.replace_child(el, current, previous)
					}
					Some(_) => {}
					None => backend.append_child(el, current),
				}
			}
			(Some(before), Some(after)) => {
				let current = create_dom(owner, after)?;
				match before.rendered() {
					Some(previous) => backend.replace_child(el, current, previous),
					None => backend.append_child(el, current),
				}
				teardown(before);
			}
			(Some(before), None) => {
				if let Some(previous) = before.rendered() {
					backend.remove_child(el, previous);
				}
				teardown(before);
			}
			(None, Some(after)) => {
				let current = create_dom(owner, after)?;
				backend.append_child(el, current);
			}
			(None, None) => {}
		}
	}

	Ok(())
}

fn nodes(children: &[Child]) -> Vec<&VNode> {
	children
		.iter()
		.filter_map(|child| match child {
			Child::Node(node) => Some(node),
			Child::Text(_) => None,
		})
		.collect()
}

/// Destroys every instance owned by the subtree of `vnode`.
pub(crate) fn teardown(vnode: &VNode) {
	let instance = vnode.instance.borrow_mut().take();
	if let Some(instance) = instance {
		instance.destroy();
	}

	teardown_children(vnode.children());
}

fn teardown_children(children: &Children) {
	if let Children::Nodes(nodes) = children {
		for child in nodes {
			if let Child::Node(node) = child {
				teardown(node);
			}
		}
	}
}
