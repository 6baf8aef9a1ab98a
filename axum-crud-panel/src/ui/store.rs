//! Copy-on-write data store backing a UI session
//!
//! Every write clones the current document, applies the change and publishes
//! the clone as a new `Arc`. Snapshots handed out earlier never change, so
//! consumers can compare snapshots by pointer to detect updates.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::watch;

use crate::ui::path;

/// Shared state document addressed by key paths
#[derive(Debug)]
pub struct DataStore {
    state: watch::Sender<Arc<Value>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl DataStore {
    /// Create a store with an initial document (non-objects become `{}`)
    pub fn new(initial: Value) -> Self {
        let (state, _) = watch::channel(Arc::new(normalize(initial)));
        Self { state }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Arc<Value> {
        self.state.borrow().clone()
    }

    /// Value at `path` in the current snapshot
    pub fn get(&self, path: &str) -> Option<Value> {
        path::get(&self.state.borrow(), path).cloned()
    }

    /// Write a single path
    pub fn set(&self, path: &str, value: Value) {
        self.replace_with(|document| path::set(document, path, value));
    }

    /// Write several paths as one update
    ///
    /// Subscribers see the document before or after the whole batch, never
    /// in between.
    pub fn set_many<I>(&self, updates: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut written = 0usize;
        self.replace_with(|document| {
            for (key, value) in updates {
                path::set(document, &key, value);
                written += 1;
            }
        });
        tracing::debug!(paths = written, "applied data store batch");
    }

    /// Replace the whole document, or clear it with `None`
    pub fn reset(&self, document: Option<Value>) {
        let next = normalize(document.unwrap_or(Value::Null));
        self.state.send_replace(Arc::new(next));
    }

    /// Receive every published snapshot
    pub fn subscribe(&self) -> watch::Receiver<Arc<Value>> {
        self.state.subscribe()
    }

    // Clone under the sender's lock; concurrent writers must not share a base.
    fn replace_with(&self, apply: impl FnOnce(&mut Value)) {
        self.state.send_modify(|current| {
            let mut next = Value::clone(current);
            apply(&mut next);
            *current = Arc::new(normalize(next));
        });
    }
}

fn normalize(document: Value) -> Value {
    match document {
        Value::Object(_) => document,
        _ => Value::Object(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_replaces_snapshot_without_touching_old_one() {
        let store = DataStore::new(json!({ "a": 1 }));
        let before = store.snapshot();

        store.set("b.c", json!(2));
        let after = store.snapshot();

        assert_eq!(*before, json!({ "a": 1 }));
        assert_eq!(*after, json!({ "a": 1, "b": { "c": 2 } }));
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn reads_are_stable_between_writes() {
        let store = DataStore::new(json!({ "a": 1 }));
        assert!(Arc::ptr_eq(&store.snapshot(), &store.snapshot()));
    }

    #[tokio::test]
    async fn batch_is_published_once() {
        let store = DataStore::new(json!({ "a": 1, "b": 2 }));
        let mut receiver = store.subscribe();
        receiver.borrow_and_update();

        store.set_many([("a".to_string(), json!(10)), ("b".to_string(), json!(20))]);

        assert!(receiver.has_changed().unwrap());
        let seen = receiver.borrow_and_update().clone();
        assert_eq!(*seen, json!({ "a": 10, "b": 20 }));
        assert!(!receiver.has_changed().unwrap());
    }

    #[tokio::test]
    async fn observer_never_sees_half_a_batch() {
        let store = Arc::new(DataStore::new(json!({ "a": 1, "b": 2 })));
        let mut receiver = store.subscribe();

        let observer = tokio::spawn(async move {
            let mut seen = vec![receiver.borrow_and_update().clone()];
            while receiver.changed().await.is_ok() {
                seen.push(receiver.borrow_and_update().clone());
            }
            seen
        });

        for round in 0..50 {
            store.set_many([
                ("a".to_string(), json!(round * 10)),
                ("b".to_string(), json!(round * 20)),
            ]);
            tokio::task::yield_now().await;
        }
        drop(store);

        for snapshot in observer.await.unwrap() {
            let a = snapshot["a"].as_i64().unwrap();
            let b = snapshot["b"].as_i64().unwrap();
            if a == 1 {
                assert_eq!(b, 2);
            } else {
                assert_eq!(b, a * 2);
            }
        }
    }

    #[test]
    fn concurrent_writers_keep_every_path() {
        for _ in 0..20 {
            let store = Arc::new(DataStore::default());
            let writers: Vec<_> = (0..4)
                .map(|thread| {
                    let store = Arc::clone(&store);
                    std::thread::spawn(move || {
                        for index in 0..50 {
                            if index % 2 == 0 {
                                store.set(&format!("t{}.k{}", thread, index), json!(index));
                            } else {
                                store.set_many([(format!("t{}.k{}", thread, index), json!(index))]);
                            }
                        }
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            for thread in 0..4 {
                for index in 0..50 {
                    let path = format!("t{}.k{}", thread, index);
                    assert_eq!(store.get(&path), Some(json!(index)), "lost {}", path);
                }
            }
        }
    }

    #[test]
    fn reset_round_trips_snapshot() {
        let snapshot = json!({
            "form": { "name": "Ada", "tags": ["x", "y"] },
            "count": 3,
            "flag": false
        });
        let store = DataStore::default();
        store.set("junk", json!(true));
        store.reset(Some(snapshot.clone()));

        for path in ["form", "form.name", "form.tags", "form.tags[1]", "count", "flag"] {
            assert_eq!(store.get(path).as_ref(), path::get(&snapshot, path));
        }
        assert_eq!(store.get("junk"), None);
    }

    #[test]
    fn reset_to_nothing_or_scalar_clears() {
        let store = DataStore::new(json!({ "a": 1 }));
        store.reset(None);
        assert_eq!(*store.snapshot(), json!({}));

        store.reset(Some(json!(42)));
        assert_eq!(*store.snapshot(), json!({}));
    }
}
