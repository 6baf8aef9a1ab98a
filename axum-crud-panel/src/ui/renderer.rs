//! Tree renderer
//!
//! Walks a UI tree, drops invisible nodes, resolves each tag against the
//! component registry and hands rendered children to their parent.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::ui::action::ActionHandle;
use crate::ui::element::{UiElement, UiTree};
use crate::ui::node::{nodes_to_html, Node};
use crate::ui::registry::{ComponentContext, ComponentRegistry};
use crate::ui::visibility::{self, VisibilityContext};

/// Something the renderer skipped without failing the whole tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderDiagnostic {
    /// No component registered for this tag
    UnknownComponent { tag: String, key: String },
}

/// Result of a render pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenderOutput {
    pub nodes: Vec<Node>,
    pub diagnostics: Vec<RenderDiagnostic>,
}

impl RenderOutput {
    pub fn to_html(&self) -> String {
        nodes_to_html(&self.nodes)
    }
}

/// Renders UI trees with an injected component registry
pub struct Renderer<'r> {
    registry: &'r ComponentRegistry,
    authenticated: bool,
    actions: ActionHandle,
}

impl<'r> Renderer<'r> {
    pub fn new(registry: &'r ComponentRegistry) -> Self {
        Self {
            registry,
            authenticated: false,
            actions: ActionHandle::noop(),
        }
    }

    /// Set the auth flag seen by `auth` visibility conditions
    pub fn authenticated(mut self, authenticated: bool) -> Self {
        self.authenticated = authenticated;
        self
    }

    /// Set the action callback handed to every component
    pub fn actions(mut self, actions: ActionHandle) -> Self {
        self.actions = actions;
        self
    }

    /// Render a tree (or nothing) against a data snapshot
    pub fn render(&self, tree: Option<&UiTree>, data: &Value) -> RenderOutput {
        let mut output = RenderOutput::default();
        if let Some(tree) = tree {
            let context = VisibilityContext::new(data, self.authenticated);
            output.nodes = self.render_siblings(tree.roots(), &context, &mut output.diagnostics);
        }
        output
    }

    fn render_siblings(
        &self,
        elements: &[UiElement],
        context: &VisibilityContext<'_>,
        diagnostics: &mut Vec<RenderDiagnostic>,
    ) -> Vec<Node> {
        elements
            .iter()
            .enumerate()
            .filter_map(|(index, element)| self.render_element(element, index, context, diagnostics))
            .collect()
    }

    fn render_element(
        &self,
        element: &UiElement,
        index: usize,
        context: &VisibilityContext<'_>,
        diagnostics: &mut Vec<RenderDiagnostic>,
    ) -> Option<Node> {
        if !visibility::is_visible(element.visible.as_ref(), context) {
            return None;
        }

        let key = format!("{}-{}", element.kind, index);
        let Some(component) = self.registry.get(&element.kind) else {
            warn!(tag = %element.kind, key = %key, "unknown component type, skipping node");
            diagnostics.push(RenderDiagnostic::UnknownComponent {
                tag: element.kind.clone(),
                key,
            });
            return None;
        };

        let children = self.render_siblings(element.children(), context, diagnostics);
        let mut node = component.render(ComponentContext {
            element,
            key: key.clone(),
            children,
            visibility: *context,
            actions: &self.actions,
        });
        node.set_key(key);
        Some(node)
    }
}
