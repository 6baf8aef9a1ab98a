//! Declarative UI: a JSON tree of component descriptors, rendered against a
//! path-addressed data store.

pub mod action;
pub mod components;
pub mod element;
pub mod node;
pub mod path;
pub mod registry;
pub mod renderer;
pub mod store;
pub mod visibility;

pub use action::{Action, ActionDispatcher, ActionHandle};
pub use element::{AuthState, EqCondition, UiElement, UiTree, VisibilityCondition};
pub use node::Node;
pub use registry::{Component, ComponentContext, ComponentRegistry};
pub use renderer::{RenderDiagnostic, RenderOutput, Renderer};
pub use store::DataStore;
pub use visibility::{evaluate, VisibilityContext};
