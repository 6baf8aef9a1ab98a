//! Built-in HTML components
//!
//! Interactive components do not run anything at render time. They embed
//! their action as `data-action` JSON, and the browser script posts it back
//! to the session's action endpoint.

use serde_json::{Map, Value};

use crate::ui::action::Action;
use crate::ui::element::VisibilityCondition;
use crate::ui::node::Node;
use crate::ui::path;
use crate::ui::registry::{ComponentContext, ComponentRegistry};
use crate::ui::visibility;

impl ComponentRegistry {
    /// Registry with every built-in component
    pub fn standard() -> Self {
        ComponentRegistry::new()
            .with("Stack", stack)
            .with("Card", card)
            .with("Heading", heading)
            .with("Text", text)
            .with("Alert", alert)
            .with("Button", button)
            .with("Table", table)
            .with("Form", form)
            .with("TextField", text_field)
    }
}

/// Display form of a JSON value (strings unquoted, null empty)
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn action_attribute(action: &Action) -> String {
    action.0.to_string()
}

/// Text from the `text` prop, falling back to the value at the `path` prop
fn resolve_text(context: &ComponentContext<'_>) -> String {
    if let Some(text) = context.element.str_prop("text") {
        return text.to_string();
    }
    match context.element.str_prop("path") {
        Some(data_path) => display_value(context.data(data_path)),
        None => String::new(),
    }
}

fn stack(context: ComponentContext<'_>) -> Node {
    let direction = match context.text_prop("direction") {
        "horizontal" => "horizontal",
        _ => "vertical",
    };
    Node::element("div")
        .attr("class", format!("stack stack-{}", direction))
        .children(context.children)
}

fn card(context: ComponentContext<'_>) -> Node {
    let mut node = Node::element("section").attr("class", "card");
    if let Some(title) = context.element.str_prop("title") {
        node = node.child(
            Node::element("h2")
                .attr("class", "card-title")
                .child(Node::text(title)),
        );
    }
    if let Some(description) = context.element.str_prop("description") {
        node = node.child(
            Node::element("p")
                .attr("class", "card-description")
                .child(Node::text(description)),
        );
    }
    node.children(context.children)
}

fn heading(context: ComponentContext<'_>) -> Node {
    let level = context
        .prop("level")
        .and_then(Value::as_u64)
        .unwrap_or(2)
        .clamp(1, 6);
    Node::element(format!("h{}", level)).child(Node::text(resolve_text(&context)))
}

fn text(context: ComponentContext<'_>) -> Node {
    let content = format!(
        "{}{}{}",
        context.text_prop("prefix"),
        resolve_text(&context),
        context.text_prop("suffix")
    );
    Node::element("p").attr("class", "text").child(Node::text(content))
}

fn alert(context: ComponentContext<'_>) -> Node {
    let variant = match context.text_prop("variant") {
        variant @ ("success" | "warning" | "error") => variant,
        _ => "info",
    };
    let message = match context.element.str_prop("message") {
        Some(message) => message.to_string(),
        None => resolve_text(&context),
    };
    Node::element("div")
        .attr("class", format!("alert alert-{}", variant))
        .attr("role", "alert")
        .child(Node::text(message))
}

fn button(context: ComponentContext<'_>) -> Node {
    let variant = match context.text_prop("variant") {
        "" => "primary",
        other => other,
    };
    let mut node = Node::element("button")
        .attr("type", "button")
        .attr("class", format!("button button-{}", variant))
        .child(Node::text(context.text_prop("label")));
    if let Some(action) = context.action_prop("action") {
        node = node.attr("data-action", action_attribute(&action));
    }
    node
}

struct Column {
    key: String,
    label: String,
}

fn table_columns(context: &ComponentContext<'_>, rows: &[Value]) -> Vec<Column> {
    if let Some(Value::Array(columns)) = context.prop("columns") {
        return columns
            .iter()
            .filter_map(|column| match column {
                Value::String(key) => Some(Column {
                    key: key.clone(),
                    label: key.clone(),
                }),
                Value::Object(definition) => {
                    let key = definition.get("key")?.as_str()?.to_string();
                    let label = definition
                        .get("label")
                        .and_then(Value::as_str)
                        .unwrap_or(&key)
                        .to_string();
                    Some(Column { key, label })
                }
                _ => None,
            })
            .collect();
    }

    match rows.first() {
        Some(Value::Object(first)) => first
            .keys()
            .map(|key| Column {
                key: key.clone(),
                label: key.clone(),
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Replace `"$row.<column>"` strings with the row's value
fn bind_row(template: &Value, row: &Value) -> Value {
    match template {
        Value::String(text) => match text.strip_prefix("$row.") {
            Some(row_path) => path::get(row, row_path).cloned().unwrap_or(Value::Null),
            None => template.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(|item| bind_row(item, row)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), bind_row(value, row)))
                .collect::<Map<String, Value>>(),
        ),
        other => other.clone(),
    }
}

fn row_action_buttons(context: &ComponentContext<'_>, row: &Value) -> Vec<Node> {
    let Some(Value::Array(actions)) = context.prop("rowActions") else {
        return Vec::new();
    };

    actions
        .iter()
        .filter_map(Value::as_object)
        .filter(|definition| {
            let condition = definition
                .get("visible")
                .and_then(|v| serde_json::from_value::<VisibilityCondition>(v.clone()).ok());
            visibility::is_visible(condition.as_ref(), &context.visibility)
        })
        .map(|definition| {
            let label = definition.get("label").and_then(Value::as_str).unwrap_or_default();
            let variant = definition
                .get("variant")
                .and_then(Value::as_str)
                .unwrap_or("secondary");
            let mut node = Node::element("button")
                .attr("type", "button")
                .attr("class", format!("button button-{}", variant))
                .child(Node::text(label));
            if let Some(template) = definition.get("action") {
                let action = Action(bind_row(template, row));
                node = node.attr("data-action", action_attribute(&action));
            }
            node
        })
        .collect()
}

fn table(context: ComponentContext<'_>) -> Node {
    let rows: &[Value] = match context.element.str_prop("path").and_then(|p| context.data(p)) {
        Some(Value::Array(rows)) => rows,
        _ => &[],
    };

    if rows.is_empty() {
        let empty_text = match context.text_prop("emptyText") {
            "" => "No rows",
            other => other,
        };
        return Node::element("p")
            .attr("class", "table-empty")
            .child(Node::text(empty_text));
    }

    let columns = table_columns(&context, rows);
    let has_row_actions = matches!(context.prop("rowActions"), Some(Value::Array(a)) if !a.is_empty());

    let mut header = Node::element("tr");
    for column in &columns {
        header = header.child(Node::element("th").child(Node::text(&column.label)));
    }
    if has_row_actions {
        header = header.child(Node::element("th"));
    }

    let mut body = Node::element("tbody");
    for (index, row) in rows.iter().enumerate() {
        let mut tr = Node::element("tr").attr("data-row", index.to_string());
        for column in &columns {
            tr = tr.child(Node::element("td").child(Node::text(display_value(path::get(row, &column.key)))));
        }
        if has_row_actions {
            tr = tr.child(
                Node::element("td")
                    .attr("class", "row-actions")
                    .children(row_action_buttons(&context, row)),
            );
        }
        body = body.child(tr);
    }

    Node::element("table")
        .attr("class", "table")
        .child(Node::element("thead").child(header))
        .child(body)
}

fn form(context: ComponentContext<'_>) -> Node {
    let submit_label = match context.text_prop("submitLabel") {
        "" => "Save",
        other => other,
    };
    let mut node = Node::element("form").attr("class", "form");
    if let Some(action) = context.action_prop("action") {
        node = node.attr("data-action", action_attribute(&action));
    }
    node.children(context.children).child(
        Node::element("button")
            .attr("type", "submit")
            .attr("class", "button button-primary")
            .child(Node::text(submit_label)),
    )
}

fn text_field(context: ComponentContext<'_>) -> Node {
    let data_path = context.text_prop("path");
    let input_type = match context.text_prop("inputType") {
        "" => "text",
        other => other,
    };
    let label = match context.text_prop("label") {
        "" => data_path,
        other => other,
    };

    let mut input = Node::element("input")
        .attr("type", input_type)
        .attr("name", data_path)
        .attr("data-path", data_path)
        .attr("value", display_value(context.data(data_path)));
    if let Some(placeholder) = context.element.str_prop("placeholder") {
        input = input.attr("placeholder", placeholder);
    }

    Node::element("label")
        .attr("class", "field")
        .child(Node::element("span").child(Node::text(label)))
        .child(input)
}
