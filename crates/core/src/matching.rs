//! Structural prototype matching.
//!
//! Matching compares a value against a prototype field by field:
//!
//! - every prototype key must exist in the value (+1);
//! - a wildcard (`null`) prototype field accepts any value;
//! - a nested object prototype field requires an object value and adds the
//!   nested score;
//! - any other prototype field requires deep equality (+1 more).
//!
//! Value fields the prototype does not mention are ignored. A conflict
//! disqualifies the whole match.

use serde_json::{Map, Value};

use crate::tag::Prototype;

/// Score `value` against `prototype`, or `None` when they conflict.
///
/// Higher scores mean the prototype pins down more of the value. The empty
/// prototype matches everything with a score of zero.
#[must_use]
pub fn match_score(value: &Map<String, Value>, prototype: &Map<String, Value>) -> Option<usize> {
    prototype.iter().try_fold(0usize, |score, (key, expected)| {
        let actual = value.get(key)?;
        let field = match expected {
            Value::Null => 1,
            Value::Object(nested) => {
                let Value::Object(inner) = actual else {
                    return None;
                };
                1 + match_score(inner, nested)?
            }
            concrete if concrete == actual => 2,
            _ => return None,
        };
        Some(score + field)
    })
}

/// Whether `value` structurally matches `prototype`.
#[must_use]
pub fn matches(value: &Map<String, Value>, prototype: &Prototype) -> bool {
    match_score(value, prototype.as_map()).is_some()
}

/// Pick the candidate whose prototype scores highest against `value`.
///
/// Ties go to the candidate yielded first.
pub fn best_match<'a, T>(
    value: &Map<String, Value>,
    candidates: impl IntoIterator<Item = (T, &'a Prototype)>,
) -> Option<T> {
    candidates
        .into_iter()
        .filter_map(|(item, prototype)| {
            match_score(value, prototype.as_map()).map(|score| (score, item))
        })
        .fold(None, |best: Option<(usize, T)>, (score, item)| match best {
            Some((top, _)) if top >= score => best,
            _ => Some((score, item)),
        })
        .map(|(_, item)| item)
}
