//! UI sessions
//!
//! A session binds one user to one table: the generated UI tree, the data
//! store it renders against, and a worker task that runs the session's
//! actions one at a time.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actions::{ActionError, ActionExecutor};
use crate::auth::Identity;
use crate::connections::{ConnectionError, ConnectionId};
use crate::database::traits::{DatabaseError, DatabaseProvider};
use crate::scaffold::{initial_data, scaffold_table_ui};
use crate::schema::RowQuery;
use crate::ui::action::{Action, ActionDispatcher, ActionHandle};
use crate::ui::element::UiTree;
use crate::ui::store::DataStore;

pub type SessionId = Uuid;

/// Sessions untouched for this long are dropped
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Open sessions kept per user; the least recently used is dropped beyond this
pub const DEFAULT_MAX_SESSIONS_PER_USER: usize = 16;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

type ActionReply = oneshot::Sender<Result<(), ActionError>>;

struct ActionEnvelope {
    action: Action,
    reply: Option<ActionReply>,
}

/// Fire-and-forget dispatcher feeding a session's worker
struct SessionDispatcher {
    session: SessionId,
    sender: mpsc::UnboundedSender<ActionEnvelope>,
}

impl ActionDispatcher for SessionDispatcher {
    fn dispatch(&self, action: Action) {
        let envelope = ActionEnvelope {
            action,
            reply: None,
        };
        if self.sender.send(envelope).is_err() {
            warn!(session = %self.session, "dropped action for closed session");
        }
    }
}

/// Public description of a session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub connection_id: ConnectionId,
    pub table: String,
}

/// One user's view of one table
pub struct UiSession {
    pub id: SessionId,
    pub owner: Identity,
    pub connection_id: ConnectionId,
    pub table: String,
    pub tree: UiTree,
    store: Arc<DataStore>,
    sender: mpsc::UnboundedSender<ActionEnvelope>,
}

impl UiSession {
    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            connection_id: self.connection_id,
            table: self.table.clone(),
        }
    }

    /// Handle that queues actions without waiting for them
    pub fn action_handle(&self) -> ActionHandle {
        ActionHandle::new(Arc::new(SessionDispatcher {
            session: self.id,
            sender: self.sender.clone(),
        }))
    }

    /// Queue an action and wait for its result
    pub async fn submit(&self, action: Action) -> Result<(), ActionError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(ActionEnvelope {
                action,
                reply: Some(reply),
            })
            .map_err(|_| ActionError::SessionClosed)?;
        response.await.map_err(|_| ActionError::SessionClosed)?
    }
}

fn spawn_worker(
    session: SessionId,
    executor: ActionExecutor,
    mut receiver: mpsc::UnboundedReceiver<ActionEnvelope>,
) {
    tokio::spawn(async move {
        while let Some(envelope) = receiver.recv().await {
            let result = executor.execute(envelope.action).await;
            match envelope.reply {
                Some(reply) => {
                    let _ = reply.send(result);
                }
                None => {
                    if let Err(error) = result {
                        debug!(session = %session, error = %error, "queued action failed");
                    }
                }
            }
        }
        debug!(session = %session, "session worker stopped");
    });
}

struct SessionEntry {
    session: Arc<UiSession>,
    last_used: Instant,
}

/// Open sessions, visible only to their owner
///
/// Idle sessions are dropped lazily whenever the registry is used, and each
/// user keeps at most `max_per_user` sessions. Dropping a session closes its
/// worker once queued actions drain.
pub struct SessionRegistry {
    page_size: u64,
    idle_timeout: Duration,
    max_per_user: usize,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
}

impl SessionRegistry {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_per_user: DEFAULT_MAX_SESSIONS_PER_USER,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Idle expiry and per-user cap (a cap of 0 is treated as 1)
    pub fn with_limits(mut self, idle_timeout: Duration, max_per_user: usize) -> Self {
        self.idle_timeout = idle_timeout;
        self.max_per_user = max_per_user.max(1);
        self
    }

    /// Load a table's schema and first page and start a session on it
    pub async fn open(
        &self,
        owner: Identity,
        connection_id: ConnectionId,
        provider: Arc<dyn DatabaseProvider>,
        table: &str,
    ) -> Result<Arc<UiSession>, SessionError> {
        let schema = Arc::new(provider.get_table_schema(table).await?);
        let query = RowQuery {
            limit: self.page_size,
            ..RowQuery::default()
        };
        let rows = provider.get_rows(table, query.clone()).await?;

        let store = Arc::new(DataStore::new(initial_data(
            &schema,
            &rows,
            owner.role,
            &query,
        )));
        let tree = scaffold_table_ui(&schema);

        let id = Uuid::new_v4();
        let (sender, receiver) = mpsc::unbounded_channel();
        let executor = ActionExecutor::new(provider, owner.clone(), schema, store.clone());
        spawn_worker(id, executor, receiver);

        let session = Arc::new(UiSession {
            id,
            owner,
            connection_id,
            table: table.to_string(),
            tree,
            store,
            sender,
        });

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.expire_idle(&mut sessions, now);
        self.evict_over_cap(&mut sessions, &session.owner);
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_used: now,
            },
        );
        info!(session = %id, user = %session.owner.user_id, table, "opened session");
        Ok(session)
    }

    /// Look up a session and mark it as used
    pub async fn get(&self, owner: &Identity, id: SessionId) -> Result<Arc<UiSession>, SessionError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.expire_idle(&mut sessions, now);
        match sessions.get_mut(&id) {
            Some(entry) if owns(owner, &entry.session) => {
                entry.last_used = now;
                Ok(entry.session.clone())
            }
            _ => Err(SessionError::NotFound(id)),
        }
    }

    /// Close a session; its worker stops once queued actions drain
    pub async fn close(&self, owner: &Identity, id: SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&id) {
            Some(entry) if owns(owner, &entry.session) => {
                sessions.remove(&id);
                info!(session = %id, "closed session");
                Ok(())
            }
            _ => Err(SessionError::NotFound(id)),
        }
    }

    /// Close every session on a connection (after it is removed)
    pub async fn close_connection(&self, connection_id: ConnectionId) {
        self.sessions
            .write()
            .await
            .retain(|_, entry| entry.session.connection_id != connection_id);
    }

    /// Drop sessions idle for longer than the timeout
    pub async fn expire(&self) {
        let mut sessions = self.sessions.write().await;
        self.expire_idle(&mut sessions, Instant::now());
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn expire_idle(&self, sessions: &mut HashMap<SessionId, SessionEntry>, now: Instant) {
        sessions.retain(|id, entry| {
            let alive = now.saturating_duration_since(entry.last_used) <= self.idle_timeout;
            if !alive {
                info!(session = %id, user = %entry.session.owner.user_id, "expired idle session");
            }
            alive
        });
    }

    // Makes room for one more session of `owner`
    fn evict_over_cap(&self, sessions: &mut HashMap<SessionId, SessionEntry>, owner: &Identity) {
        loop {
            let owned: Vec<(SessionId, Instant)> = sessions
                .iter()
                .filter(|(_, entry)| owns(owner, &entry.session))
                .map(|(id, entry)| (*id, entry.last_used))
                .collect();
            if owned.len() < self.max_per_user {
                return;
            }
            let Some((oldest, _)) = owned.into_iter().min_by_key(|(_, last_used)| *last_used) else {
                return;
            };
            sessions.remove(&oldest);
            info!(session = %oldest, user = %owner.user_id, "evicted least recently used session");
        }
    }
}

fn owns(owner: &Identity, session: &UiSession) -> bool {
    session.owner.user_id == owner.user_id && session.owner.tenant == owner.tenant
}
