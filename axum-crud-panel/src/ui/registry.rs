//! Component registry
//!
//! Maps string tags from the UI tree to component implementations. The
//! registry is handed to the renderer; the renderer never owns one.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ui::action::{Action, ActionHandle};
use crate::ui::element::UiElement;
use crate::ui::node::Node;
use crate::ui::path;
use crate::ui::visibility::VisibilityContext;

/// Everything a component gets for a single render call
pub struct ComponentContext<'a> {
    /// The element being rendered
    pub element: &'a UiElement,

    /// Stable key derived from the element type and its sibling index
    pub key: String,

    /// Already rendered children, in order
    pub children: Vec<Node>,

    /// Data snapshot and auth flag of this render pass
    pub visibility: VisibilityContext<'a>,

    /// Callback for dispatching actions
    pub actions: &'a ActionHandle,
}

impl<'a> ComponentContext<'a> {
    /// String prop or empty string
    pub fn text_prop(&self, key: &str) -> &'a str {
        self.element.str_prop(key).unwrap_or_default()
    }

    /// Raw prop value
    pub fn prop(&self, key: &str) -> Option<&'a Value> {
        self.element.props.get(key)
    }

    /// Look up a path in the current data snapshot
    pub fn data(&self, data_path: &str) -> Option<&'a Value> {
        path::get(self.visibility.data, data_path)
    }

    /// Action stored under a prop, if any
    pub fn action_prop(&self, key: &str) -> Option<Action> {
        self.prop(key).cloned().map(Action)
    }

    pub fn dispatch(&self, action: Action) {
        self.actions.dispatch(action);
    }
}

/// A renderable component
pub trait Component: Send + Sync {
    fn render(&self, context: ComponentContext<'_>) -> Node;
}

impl<F> Component for F
where
    F: for<'a> Fn(ComponentContext<'a>) -> Node + Send + Sync,
{
    fn render(&self, context: ComponentContext<'_>) -> Node {
        self(context)
    }
}

/// Tag to component lookup table
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<dyn Component>>,
}

impl ComponentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the component for `tag`
    pub fn register(&mut self, tag: impl Into<String>, component: impl Component + 'static) -> &mut Self {
        self.components.insert(tag.into(), Arc::new(component));
        self
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with(mut self, tag: impl Into<String>, component: impl Component + 'static) -> Self {
        self.register(tag, component);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&Arc<dyn Component>> {
        self.components.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.components.contains_key(tag)
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.components.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
