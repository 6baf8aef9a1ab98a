//! Action executor for table sessions
//!
//! Interprets the `{ "name": ..., "params": ... }` actions emitted by the
//! generated CRUD interface. Store-only actions write the session's data
//! store; mutations go to the database and then refresh the store in a
//! single batch.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::{AuthError, Identity};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::permissions::Permission;
use crate::scaffold::{CREATE_FORM, EDIT_FORM};
use crate::schema::{RowQuery, RowValues, SortOrder, TableSchema};
use crate::ui::action::Action;
use crate::ui::store::DataStore;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Unknown action: {0}")]
    Unknown(String),

    #[error("Malformed action: {0}")]
    Malformed(String),

    #[error("No row is being edited")]
    NotEditing,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Session is closed")]
    SessionClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageDirection {
    Next,
    Previous,
}

/// Actions understood by table sessions
#[derive(Debug, Clone, PartialEq)]
pub enum CrudAction {
    SetData { path: String, value: Value },
    SetMany { updates: Map<String, Value> },
    Refresh,
    Page { direction: PageDirection },
    Sort { column: String, order: SortOrder },
    StartEdit { key: RowValues },
    CancelEdit,
    CreateRow,
    UpdateRow,
    DeleteRow { key: RowValues },
}

#[derive(Deserialize)]
struct RawAction {
    name: String,
    #[serde(default)]
    params: Value,
}

#[derive(Deserialize)]
struct SetDataParams {
    path: String,
    #[serde(default)]
    value: Value,
}

#[derive(Deserialize)]
struct SetManyParams {
    updates: Map<String, Value>,
}

#[derive(Deserialize)]
struct PageParams {
    direction: PageDirection,
}

#[derive(Deserialize)]
struct SortParams {
    column: String,
    #[serde(default)]
    order: Option<SortOrder>,
}

#[derive(Deserialize)]
struct KeyParams {
    key: RowValues,
}

fn params<T: DeserializeOwned>(name: &str, params: Value) -> Result<T, ActionError> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params).map_err(|e| ActionError::Malformed(format!("{}: {}", name, e)))
}

impl CrudAction {
    pub fn parse(action: &Action) -> Result<Self, ActionError> {
        let raw: RawAction = serde_json::from_value(action.0.clone())
            .map_err(|e| ActionError::Malformed(e.to_string()))?;
        let name = raw.name.as_str();

        Ok(match name {
            "setData" => {
                let p: SetDataParams = params(name, raw.params)?;
                CrudAction::SetData {
                    path: p.path,
                    value: p.value,
                }
            }
            "setMany" => CrudAction::SetMany {
                updates: params::<SetManyParams>(name, raw.params)?.updates,
            },
            "refresh" => CrudAction::Refresh,
            "page" => CrudAction::Page {
                direction: params::<PageParams>(name, raw.params)?.direction,
            },
            "sort" => {
                let p: SortParams = params(name, raw.params)?;
                CrudAction::Sort {
                    column: p.column,
                    order: p.order.unwrap_or(SortOrder::Ascending),
                }
            }
            "startEdit" => CrudAction::StartEdit {
                key: params::<KeyParams>(name, raw.params)?.key,
            },
            "cancelEdit" => CrudAction::CancelEdit,
            "createRow" => CrudAction::CreateRow,
            "updateRow" => CrudAction::UpdateRow,
            "deleteRow" => CrudAction::DeleteRow {
                key: params::<KeyParams>(name, raw.params)?.key,
            },
            other => return Err(ActionError::Unknown(other.to_string())),
        })
    }
}

/// Executes actions for one table session
pub struct ActionExecutor {
    provider: Arc<dyn DatabaseProvider>,
    identity: Identity,
    schema: Arc<TableSchema>,
    store: Arc<DataStore>,
}

impl ActionExecutor {
    pub fn new(
        provider: Arc<dyn DatabaseProvider>,
        identity: Identity,
        schema: Arc<TableSchema>,
        store: Arc<DataStore>,
    ) -> Self {
        Self {
            provider,
            identity,
            schema,
            store,
        }
    }

    /// Run an action; failures are also written to `status.error`
    pub async fn execute(&self, action: Action) -> Result<(), ActionError> {
        let result = match CrudAction::parse(&action) {
            Ok(parsed) => self.apply(parsed).await,
            Err(error) => Err(error),
        };

        if let Err(error) = &result {
            warn!(
                table = %self.schema.name,
                user = %self.identity.user_id,
                error = %error,
                "action failed"
            );
            self.store.set_many([
                ("status.error".to_string(), Value::String(error.to_string())),
                ("status.message".to_string(), Value::Null),
            ]);
        }
        result
    }

    async fn apply(&self, action: CrudAction) -> Result<(), ActionError> {
        match action {
            CrudAction::SetData { path, value } => {
                self.store.set(&path, value);
                Ok(())
            }
            CrudAction::SetMany { updates } => {
                self.store.set_many(updates);
                Ok(())
            }
            CrudAction::Refresh => self.refresh(Vec::new()).await,
            CrudAction::Page { direction } => {
                let query = self.current_query();
                let offset = match direction {
                    PageDirection::Next => query.offset.saturating_add(query.limit),
                    PageDirection::Previous => query.offset.saturating_sub(query.limit),
                };
                self.refresh(vec![("query.offset".to_string(), json!(offset))])
                    .await
            }
            CrudAction::Sort { column, order } => {
                if self.schema.column(&column).is_none() {
                    return Err(DatabaseError::InvalidColumn(column).into());
                }
                self.refresh(vec![
                    ("query.sortBy".to_string(), Value::String(column)),
                    ("query.sortOrder".to_string(), json!(order)),
                    ("query.offset".to_string(), json!(0)),
                ])
                .await
            }
            CrudAction::StartEdit { key } => self.start_edit(key),
            CrudAction::CancelEdit => {
                self.store.set_many([
                    ("editing".to_string(), Value::Null),
                    (EDIT_FORM.to_string(), json!({})),
                ]);
                Ok(())
            }
            CrudAction::CreateRow => self.create_row().await,
            CrudAction::UpdateRow => self.update_row().await,
            CrudAction::DeleteRow { key } => self.delete_row(key).await,
        }
    }

    fn current_query(&self) -> RowQuery {
        self.store
            .get("query")
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }

    /// Reload the current page and publish it together with `extra` writes
    async fn refresh(&self, extra: Vec<(String, Value)>) -> Result<(), ActionError> {
        self.identity.require(Permission::Read)?;

        let mut query = self.current_query();
        for (path, value) in &extra {
            match path.as_str() {
                "query.offset" => query.offset = value.as_u64().unwrap_or(0),
                "query.sortBy" => query.sort_by = value.as_str().map(str::to_string),
                "query.sortOrder" => query.sort_order = serde_json::from_value(value.clone()).ok(),
                _ => {}
            }
        }

        let mut page = self.provider.get_rows(&self.schema.name, query.clone()).await?;
        // Deleting the last row of the last page leaves us past the end
        if page.rows.is_empty() && query.offset > 0 {
            query.offset = query.offset.saturating_sub(query.limit);
            page = self.provider.get_rows(&self.schema.name, query.clone()).await?;
        }

        let mut updates = extra;
        updates.push(("rows".to_string(), Value::Array(page.rows)));
        updates.push(("total".to_string(), json!(page.total)));
        updates.push(("hasMore".to_string(), json!(page.has_more)));
        updates.push(("query.offset".to_string(), json!(query.offset)));
        self.store.set_many(updates);
        Ok(())
    }

    fn start_edit(&self, key: RowValues) -> Result<(), ActionError> {
        self.identity.require(Permission::Update)?;

        let rows = self.store.get("rows").unwrap_or(Value::Null);
        let row = rows
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
            .find(|row| key.iter().all(|(column, value)| row.get(column) == Some(value)))
            .ok_or_else(|| DatabaseError::RowNotFound(self.schema.name.clone()))?;

        let form: Map<String, Value> = row
            .iter()
            .filter(|(column, _)| !self.schema.key_columns().contains(*column))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();

        self.store.set_many([
            ("editing".to_string(), Value::Object(key)),
            (EDIT_FORM.to_string(), Value::Object(form)),
            ("status.error".to_string(), Value::Null),
        ]);
        Ok(())
    }

    async fn create_row(&self) -> Result<(), ActionError> {
        self.identity.require(Permission::Create)?;

        // Blank fields are left out so column defaults apply
        let values: RowValues = self
            .form_values(CREATE_FORM)
            .into_iter()
            .filter(|(_, value)| !matches!(value, Value::Null) && value != "")
            .collect();

        self.provider.insert_row(&self.schema.name, &values).await?;
        info!(table = %self.schema.name, user = %self.identity.user_id, "row created");

        self.refresh(vec![
            (CREATE_FORM.to_string(), json!({})),
            ("status.error".to_string(), Value::Null),
            ("status.message".to_string(), json!("Row created")),
        ])
        .await
    }

    async fn update_row(&self) -> Result<(), ActionError> {
        self.identity.require(Permission::Update)?;

        let key = match self.store.get("editing") {
            Some(Value::Object(key)) => key,
            _ => return Err(ActionError::NotEditing),
        };

        // Blank fields of nullable columns are written as NULL
        let values: RowValues = self
            .form_values(EDIT_FORM)
            .into_iter()
            .filter(|(column, _)| !self.schema.key_columns().contains(column))
            .map(|(column, value)| {
                let nullable = self.schema.column(&column).is_some_and(|c| c.nullable);
                if nullable && value == "" {
                    (column, Value::Null)
                } else {
                    (column, value)
                }
            })
            .collect();

        self.provider
            .update_row(&self.schema.name, &key, &values)
            .await?;
        info!(table = %self.schema.name, user = %self.identity.user_id, "row updated");

        self.refresh(vec![
            ("editing".to_string(), Value::Null),
            (EDIT_FORM.to_string(), json!({})),
            ("status.error".to_string(), Value::Null),
            ("status.message".to_string(), json!("Row updated")),
        ])
        .await
    }

    async fn delete_row(&self, key: RowValues) -> Result<(), ActionError> {
        self.identity.require(Permission::Delete)?;

        self.provider.delete_row(&self.schema.name, &key).await?;
        info!(table = %self.schema.name, user = %self.identity.user_id, "row deleted");

        let mut extra = vec![
            ("status.error".to_string(), Value::Null),
            ("status.message".to_string(), json!("Row deleted")),
        ];
        if self.store.get("editing") == Some(Value::Object(key)) {
            extra.push(("editing".to_string(), Value::Null));
            extra.push((EDIT_FORM.to_string(), json!({})));
        }
        self.refresh(extra).await
    }

    fn form_values(&self, form_path: &str) -> RowValues {
        match self.store.get(form_path) {
            Some(Value::Object(values)) => values,
            _ => RowValues::new(),
        }
    }
}
