//! UI tree types
//!
//! The JSON description that the renderer interprets. Field names are part of
//! the wire format shared with whatever produces the tree, so they are fixed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single node of a UI tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiElement {
    /// Component tag, resolved against the component registry
    #[serde(rename = "type")]
    pub kind: String,

    /// Arbitrary component properties
    #[serde(default)]
    pub props: Map<String, Value>,

    /// Child elements, rendered in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<UiElement>>,

    /// Condition controlling whether this node (and its subtree) renders
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<VisibilityCondition>,
}

impl UiElement {
    /// Create an element with no props, children or visibility condition
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            props: Map::new(),
            children: None,
            visible: None,
        }
    }

    /// Set a single prop
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Append a child element
    pub fn child(mut self, child: UiElement) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Attach a visibility condition
    pub fn visible(mut self, condition: VisibilityCondition) -> Self {
        self.visible = Some(condition);
        self
    }

    /// Read a string prop
    pub fn str_prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Children as a slice (empty when absent)
    pub fn children(&self) -> &[UiElement] {
        self.children.as_deref().unwrap_or_default()
    }
}

/// Renderer input: one element or an ordered list of siblings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiTree {
    Element(UiElement),
    Elements(Vec<UiElement>),
}

impl UiTree {
    /// The top-level siblings of this tree
    pub fn roots(&self) -> &[UiElement] {
        match self {
            UiTree::Element(element) => std::slice::from_ref(element),
            UiTree::Elements(elements) => elements,
        }
    }
}

impl From<UiElement> for UiTree {
    fn from(element: UiElement) -> Self {
        UiTree::Element(element)
    }
}

impl From<Vec<UiElement>> for UiTree {
    fn from(elements: Vec<UiElement>) -> Self {
        UiTree::Elements(elements)
    }
}

/// Authentication state a condition can require
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthState {
    SignedIn,
    SignedOut,
}

/// Strict equality test between a store path and a literal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqCondition {
    pub path: String,
    pub value: Value,
}

/// Visibility predicate
///
/// Normally exactly one key is set. When several are, they are checked in the
/// order `path`, `auth`, `eq`, `and`, `or`, `not` and the first one present
/// decides. A condition with no keys is always visible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eq: Option<EqCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<VisibilityCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<VisibilityCondition>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<VisibilityCondition>>,
}

impl VisibilityCondition {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn signed_in() -> Self {
        Self {
            auth: Some(AuthState::SignedIn),
            ..Self::default()
        }
    }

    pub fn signed_out() -> Self {
        Self {
            auth: Some(AuthState::SignedOut),
            ..Self::default()
        }
    }

    pub fn equals(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            eq: Some(EqCondition {
                path: path.into(),
                value: value.into(),
            }),
            ..Self::default()
        }
    }

    pub fn all(conditions: Vec<VisibilityCondition>) -> Self {
        Self {
            and: Some(conditions),
            ..Self::default()
        }
    }

    pub fn any(conditions: Vec<VisibilityCondition>) -> Self {
        Self {
            or: Some(conditions),
            ..Self::default()
        }
    }

    pub fn negate(condition: VisibilityCondition) -> Self {
        Self {
            not: Some(Box::new(condition)),
            ..Self::default()
        }
    }
}
