//! Key-path addressing into JSON documents
//!
//! Supports dot/bracket expressions (`form.address.city`, `items[0].name`,
//! `items.0.name`) and slash-separated paths (`/form/address/city`).

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

impl Segment {
    fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(index) => Some(*index),
            Segment::Key(key) => key.parse().ok(),
        }
    }

    fn as_key(&self) -> String {
        match self {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        }
    }

    fn empty_container(&self) -> Value {
        match self {
            Segment::Index(_) => Value::Array(Vec::new()),
            Segment::Key(_) => Value::Object(Map::new()),
        }
    }
}

fn parse(path: &str) -> Vec<Segment> {
    if let Some(rest) = path.strip_prefix('/') {
        return rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| Segment::Key(s.to_string()))
            .collect();
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut rest = part;
        // "items[0][1]" -> "items", 0, 1
        let key_end = rest.find('[').unwrap_or(rest.len());
        if key_end > 0 {
            segments.push(Segment::Key(rest[..key_end].to_string()));
        }
        rest = &rest[key_end..];

        while let Some(open) = rest.strip_prefix('[') {
            let Some(close) = open.find(']') else {
                segments.push(Segment::Key(open.to_string()));
                break;
            };
            let inner = open[..close].trim_matches(|c| c == '"' || c == '\'');
            match inner.parse::<usize>() {
                Ok(index) => segments.push(Segment::Index(index)),
                Err(_) => segments.push(Segment::Key(inner.to_string())),
            }
            rest = &open[close + 1..];
        }
    }
    segments
}

/// Look up the value at `path`, or `None` if any step is missing
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    parse(path)
        .iter()
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(&segment.as_key()),
            Value::Array(items) => segment.as_index().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Write `value` at `path`, creating intermediate containers as needed
///
/// Intermediates that exist but are not containers are replaced. Writing an
/// array index past the end pads with `null`.
pub fn set(root: &mut Value, path: &str, value: Value) {
    let segments = parse(path);
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut current = root;
    for (position, segment) in parents.iter().enumerate() {
        let next = &segments[position + 1];
        current = child_mut(current, segment, next);
    }
    assign(current, last, value);
}

fn child_mut<'a>(container: &'a mut Value, segment: &Segment, next: &Segment) -> &'a mut Value {
    let slot = match (container, segment.as_index()) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.as_key()).or_insert(Value::Null),
        // Scalars, and arrays addressed by a non-numeric key, become containers
        (other, _) => {
            *other = segment.empty_container();
            return child_mut(other, segment, next);
        }
    };
    if !slot.is_object() && !slot.is_array() {
        *slot = next.empty_container();
    }
    slot
}

fn ensure_container(container: &mut Value, segment: &Segment) {
    let usable = match container {
        Value::Object(_) => true,
        Value::Array(_) => segment.as_index().is_some(),
        _ => false,
    };
    if !usable {
        *container = segment.empty_container();
    }
}

fn assign(container: &mut Value, segment: &Segment, value: Value) {
    ensure_container(container, segment);
    match container {
        Value::Array(items) => {
            if let Some(index) = segment.as_index() {
                if items.len() <= index {
                    items.resize(index + 1, Value::Null);
                }
                items[index] = value;
            }
        }
        Value::Object(map) => {
            map.insert(segment.as_key(), value);
        }
        _ => {}
    }
}

/// JavaScript-style truthiness, with absent values falsy
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
