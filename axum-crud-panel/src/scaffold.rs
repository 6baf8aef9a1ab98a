//! Generated CRUD interface for a table
//!
//! Produces the UI tree for one table and the data-store document it reads.
//! Everything the tree shows comes from store paths, so the same tree is
//! reused across renders while only the store changes.

use serde_json::{json, Map, Value};

use crate::permissions::Role;
use crate::schema::{ColumnInfo, RowQuery, RowsResponse, TableSchema};
use crate::ui::element::{UiElement, UiTree, VisibilityCondition};

/// Store path of the create form values
pub const CREATE_FORM: &str = "form.create";

/// Store path of the edit form values
pub const EDIT_FORM: &str = "form.edit";

fn can(permission: &str) -> VisibilityCondition {
    VisibilityCondition::all(vec![
        VisibilityCondition::signed_in(),
        VisibilityCondition::path(format!("permissions.{}", permission)),
    ])
}

fn action(name: &str, params: Value) -> Value {
    json!({ "name": name, "params": params })
}

fn field(form: &str, column: &ColumnInfo) -> UiElement {
    let mut element = UiElement::new("TextField")
        .prop("path", format!("{}.{}", form, column.name))
        .prop("label", format!("{} ({})", column.name, column.data_type));
    if let Some(default_value) = &column.default_value {
        element = element.prop("placeholder", default_value.clone());
    }
    element
}

/// `{ "<pk>": "$row.<pk>", ... }` for row action templates
fn row_key_template(schema: &TableSchema) -> Value {
    let key: Map<String, Value> = schema
        .key_columns()
        .iter()
        .map(|column| (column.clone(), Value::String(format!("$row.{}", column))))
        .collect();
    Value::Object(key)
}

/// Build the CRUD UI tree for a table
pub fn scaffold_table_ui(schema: &TableSchema) -> UiTree {
    let has_key = !schema.key_columns().is_empty();

    let columns: Vec<Value> = schema
        .columns
        .iter()
        .map(|c| json!({ "key": c.name, "label": c.name }))
        .collect();

    let mut table = UiElement::new("Table")
        .prop("path", "rows")
        .prop("columns", columns)
        .prop("emptyText", format!("{} has no rows", schema.name));
    if has_key {
        let key = row_key_template(schema);
        table = table.prop(
            "rowActions",
            json!([
                {
                    "label": "Edit",
                    "visible": can("update"),
                    "action": action("startEdit", json!({ "key": key })),
                },
                {
                    "label": "Delete",
                    "variant": "danger",
                    "visible": can("delete"),
                    "action": action("deleteRow", json!({ "key": key })),
                }
            ]),
        );
    }

    let pagination = UiElement::new("Stack")
        .prop("direction", "horizontal")
        .child(
            UiElement::new("Button")
                .prop("label", "Previous")
                .prop("variant", "secondary")
                .prop("action", action("page", json!({ "direction": "previous" })))
                .visible(VisibilityCondition::path("query.offset")),
        )
        .child(
            UiElement::new("Text")
                .prop("path", "total")
                .prop("suffix", " rows"),
        )
        .child(
            UiElement::new("Button")
                .prop("label", "Next")
                .prop("variant", "secondary")
                .prop("action", action("page", json!({ "direction": "next" })))
                .visible(VisibilityCondition::path("hasMore")),
        )
        .child(
            UiElement::new("Button")
                .prop("label", "Refresh")
                .prop("variant", "secondary")
                .prop("action", action("refresh", json!({}))),
        );

    let create_form = schema.columns.iter().fold(
        UiElement::new("Form")
            .prop("path", CREATE_FORM)
            .prop("submitLabel", "Create")
            .prop("action", action("createRow", json!({}))),
        |form, column| form.child(field(CREATE_FORM, column)),
    );

    let mut root = UiElement::new("Stack")
        .child(UiElement::new("Heading").prop("path", "table").prop("level", 1))
        .child(
            UiElement::new("Alert")
                .prop("variant", "error")
                .prop("path", "status.error")
                .visible(VisibilityCondition::path("status.error")),
        )
        .child(
            UiElement::new("Alert")
                .prop("variant", "success")
                .prop("path", "status.message")
                .visible(VisibilityCondition::path("status.message")),
        )
        .child(
            UiElement::new("Alert")
                .prop("message", "Sign in to change data.")
                .visible(VisibilityCondition::signed_out()),
        )
        .child(table)
        .child(pagination)
        .child(
            UiElement::new("Card")
                .prop("title", "New row")
                .visible(can("create"))
                .child(create_form),
        );

    if has_key {
        let edit_form = schema
            .columns
            .iter()
            .filter(|c| !c.is_primary_key)
            .fold(
                UiElement::new("Form")
                    .prop("path", EDIT_FORM)
                    .prop("submitLabel", "Update")
                    .prop("action", action("updateRow", json!({}))),
                |form, column| form.child(field(EDIT_FORM, column)),
            );

        root = root.child(
            UiElement::new("Card")
                .prop("title", "Edit row")
                .visible(VisibilityCondition::all(vec![
                    can("update"),
                    VisibilityCondition::path("editing"),
                ]))
                .child(edit_form)
                .child(
                    UiElement::new("Button")
                        .prop("label", "Cancel")
                        .prop("variant", "secondary")
                        .prop("action", action("cancelEdit", json!({}))),
                ),
        );
    }

    UiTree::Element(root)
}

/// The store document a freshly opened table session starts from
pub fn initial_data(schema: &TableSchema, rows: &RowsResponse, role: Role, query: &RowQuery) -> Value {
    json!({
        "table": schema.name,
        "schema": schema,
        "rows": rows.rows,
        "total": rows.total,
        "hasMore": rows.has_more,
        "query": query,
        "permissions": role.permission_flags(),
        "form": { "create": {}, "edit": {} },
        "editing": null,
        "status": { "error": null, "message": null }
    })
}
