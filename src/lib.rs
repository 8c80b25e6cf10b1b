pub mod macros;

mod addr;
mod backend;
mod component;
mod dependencies;
mod error;
mod evaluation;
mod event;
mod options;
mod patch;
mod path;
mod view;
mod vnode;
mod watcher;

pub use backend::{Backend, ElementId, MemoryBackend};
pub use component::{Component, Lifecycle, Method};
pub use dependencies::{Change, Dependencies, Subscriber, Subscribers};
pub use error::{Error, Result};
pub use event::Handler;
pub use options::{ComputedFn, DataFn, HookFn, MethodFn, Options, RenderFn, WatchFn};
pub use path::Path;
pub use serde_json::{json, Map, Value};
pub use view::{Field, Source, View};
pub use vnode::{text_of, Builder, Child, Children, VNode, VNodeData};
pub use watcher::Watcher;
