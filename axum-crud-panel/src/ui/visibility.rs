//! Visibility condition evaluation

use serde_json::Value;

use crate::ui::element::{AuthState, VisibilityCondition};
use crate::ui::path;

/// Everything a visibility condition may look at
#[derive(Debug, Clone, Copy)]
pub struct VisibilityContext<'a> {
    /// Current data store snapshot
    pub data: &'a Value,

    /// Whether the viewer is signed in
    pub authenticated: bool,
}

impl<'a> VisibilityContext<'a> {
    pub fn new(data: &'a Value, authenticated: bool) -> Self {
        Self {
            data,
            authenticated,
        }
    }
}

/// Evaluate an optional condition; a missing condition is visible
pub fn is_visible(condition: Option<&VisibilityCondition>, context: &VisibilityContext<'_>) -> bool {
    condition.map_or(true, |c| evaluate(c, context))
}

/// Evaluate a condition against the data snapshot and auth flag
///
/// Pure: the same inputs always give the same answer.
pub fn evaluate(condition: &VisibilityCondition, context: &VisibilityContext<'_>) -> bool {
    if let Some(path) = &condition.path {
        return path::is_truthy(path::get(context.data, path));
    }

    if let Some(auth) = condition.auth {
        return match auth {
            AuthState::SignedIn => context.authenticated,
            AuthState::SignedOut => !context.authenticated,
        };
    }

    if let Some(eq) = &condition.eq {
        // Absent never equals anything, not even null.
        return path::get(context.data, &eq.path) == Some(&eq.value);
    }

    if let Some(conditions) = &condition.and {
        return conditions.iter().all(|c| evaluate(c, context));
    }

    if let Some(conditions) = &condition.or {
        return conditions.iter().any(|c| evaluate(c, context));
    }

    if let Some(inner) = &condition.not {
        return !evaluate(inner, context);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(condition: VisibilityCondition, data: &Value, authenticated: bool) -> bool {
        evaluate(&condition, &VisibilityContext::new(data, authenticated))
    }

    #[test]
    fn auth_conditions_follow_flag() {
        let data = json!({});
        assert!(check(VisibilityCondition::signed_in(), &data, true));
        assert!(!check(VisibilityCondition::signed_in(), &data, false));
        assert!(check(VisibilityCondition::signed_out(), &data, false));
        assert!(!check(VisibilityCondition::signed_out(), &data, true));
    }

    #[test]
    fn not_signed_in_is_false_when_authenticated() {
        let data = json!({});
        let condition = VisibilityCondition::negate(VisibilityCondition::signed_in());
        assert!(!check(condition, &data, true));
    }

    #[test]
    fn path_uses_truthiness() {
        let data = json!({ "flags": { "on": true, "off": false, "count": 0, "name": "x" } });
        assert!(check(VisibilityCondition::path("flags.on"), &data, false));
        assert!(check(VisibilityCondition::path("flags.name"), &data, false));
        assert!(!check(VisibilityCondition::path("flags.off"), &data, false));
        assert!(!check(VisibilityCondition::path("flags.count"), &data, false));
        assert!(!check(VisibilityCondition::path("flags.missing"), &data, false));
    }

    #[test]
    fn eq_is_strict() {
        let data = json!({ "n": 1, "s": "1", "nothing": null });
        assert!(check(VisibilityCondition::equals("n", 1), &data, false));
        assert!(!check(VisibilityCondition::equals("n", "1"), &data, false));
        assert!(check(VisibilityCondition::equals("s", "1"), &data, false));
        assert!(check(VisibilityCondition::equals("nothing", Value::Null), &data, false));
        assert!(!check(VisibilityCondition::equals("absent", Value::Null), &data, false));
    }

    #[test]
    fn and_matches_conjunction_of_parts() {
        let data = json!({ "a": true, "b": 0, "c": "yes" });
        let parts = vec![
            VisibilityCondition::path("a"),
            VisibilityCondition::path("b"),
            VisibilityCondition::path("c"),
            VisibilityCondition::signed_in(),
        ];

        for authenticated in [true, false] {
            for len in 0..=parts.len() {
                let slice = parts[..len].to_vec();
                let expected = slice.iter().all(|c| check(c.clone(), &data, authenticated));
                assert_eq!(
                    check(VisibilityCondition::all(slice), &data, authenticated),
                    expected
                );
            }
        }
    }

    #[test]
    fn or_and_empty_lists() {
        let data = json!({ "a": true });
        assert!(check(VisibilityCondition::all(vec![]), &data, false));
        assert!(!check(VisibilityCondition::any(vec![]), &data, false));
        assert!(check(
            VisibilityCondition::any(vec![
                VisibilityCondition::path("missing"),
                VisibilityCondition::path("a"),
            ]),
            &data,
            false
        ));
    }

    #[test]
    fn precedence_picks_first_present_key() {
        let data = json!({ "a": true });
        // path wins over auth
        let condition = VisibilityCondition {
            path: Some("a".into()),
            auth: Some(AuthState::SignedIn),
            ..VisibilityCondition::default()
        };
        assert!(check(condition, &data, false));

        // auth wins over not
        let condition = VisibilityCondition {
            auth: Some(AuthState::SignedOut),
            not: Some(Box::new(VisibilityCondition::default())),
            ..VisibilityCondition::default()
        };
        assert!(check(condition, &data, false));
    }

    #[test]
    fn empty_condition_is_visible() {
        let data = json!({});
        assert!(check(VisibilityCondition::default(), &data, false));
        assert!(is_visible(None, &VisibilityContext::new(&data, false)));
    }
}
