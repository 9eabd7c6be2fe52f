//! Query matching, update application and projection

use std::cmp::Ordering;

use crate::document::{Document, Value};
use crate::driver::{DriverError, DriverResult};

const QUERY_OPERATORS: [&str; 8] = ["in", "nin", "ne", "exists", "gt", "gte", "lt", "lte"];
const UPDATE_OPERATORS: [&str; 3] = ["set", "unset", "inc"];

fn operator<'k>(key: &'k str, prefix: &str, known: &[&str]) -> Option<&'k str> {
    key.strip_prefix(prefix).filter(|op| known.contains(op))
}

/// Truthiness of option flags and projection values
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Int(n)) => *n != 0,
        Some(Value::Float(n)) => *n != 0.0,
        Some(_) => true,
    }
}

/// Resolve a dotted path
pub(crate) fn lookup<'d>(doc: &'d Document, path: &str) -> Option<&'d Value> {
    match path.split_once('.') {
        None => doc.get(path),
        Some((head, rest)) => lookup(doc.get_document(head)?, rest),
    }
}

fn is_operator_document(doc: &Document, prefix: &str) -> bool {
    !doc.is_empty() && doc.keys().all(|k| operator(k, prefix, &QUERY_OPERATORS).is_some())
}

/// Whether `doc` satisfies every constraint in `query`
pub(crate) fn matches(doc: &Document, query: &Document, prefix: &str) -> bool {
    query.iter().all(|(key, condition)| {
        let actual = lookup(doc, key);
        match condition {
            Value::Document(ops) if is_operator_document(ops, prefix) => ops.iter().all(|(op, arg)| {
                let op = operator(op, prefix, &QUERY_OPERATORS).unwrap_or_default();
                match_operator(op, actual, arg)
            }),
            expected => value_matches(actual, expected),
        }
    })
}

fn value_matches(actual: Option<&Value>, expected: &Value) -> bool {
    match actual {
        Some(Value::Array(items)) if !matches!(expected, Value::Array(_)) => items.contains(expected),
        Some(value) => value == expected,
        None => expected.is_null(),
    }
}

fn compare(actual: Option<&Value>, arg: &Value) -> Option<Ordering> {
    match (actual?, arg) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn match_operator(op: &str, actual: Option<&Value>, arg: &Value) -> bool {
    match op {
        "in" => arg
            .as_array()
            .map_or(false, |values| values.iter().any(|v| value_matches(actual, v))),
        "nin" => !match_operator("in", actual, arg),
        "ne" => !value_matches(actual, arg),
        "exists" => actual.is_some() == truthy(Some(arg)),
        "gt" => compare(actual, arg) == Some(Ordering::Greater),
        "gte" => matches!(compare(actual, arg), Some(Ordering::Greater | Ordering::Equal)),
        "lt" => compare(actual, arg) == Some(Ordering::Less),
        "lte" => matches!(compare(actual, arg), Some(Ordering::Less | Ordering::Equal)),
        _ => false,
    }
}

fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if doc.get_document(head).is_none() {
                doc.insert(head, Document::new());
            }
            if let Some(inner) = doc.get_document_mut(head) {
                set_path(inner, rest, value);
            }
        }
    }
}

fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(inner) = doc.get_document_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

/// True when `update` is made of update operators rather than a
/// replacement document
pub(crate) fn is_operator_update(update: &Document, prefix: &str) -> bool {
    update
        .keys()
        .any(|k| operator(k, prefix, &UPDATE_OPERATORS).is_some())
}

/// Apply an update document in place
pub(crate) fn apply_update(doc: &mut Document, update: &Document, prefix: &str) -> DriverResult<()> {
    if !is_operator_update(update, prefix) {
        let id = doc.get("_id").cloned();
        let mut replacement = Document::new();
        if let Some(id) = id {
            replacement.insert("_id", id);
        }
        replacement.extend(
            update
                .iter()
                .filter(|(k, _)| *k != "_id")
                .map(|(k, v)| (k.to_string(), v.clone())),
        );
        *doc = replacement;
        return Ok(());
    }

    for (key, args) in update.iter() {
        let op = operator(key, prefix, &UPDATE_OPERATORS).ok_or_else(|| {
            DriverError::InvalidDocument(format!("cannot mix update operators and field {}", key))
        })?;
        let args = args.as_document().ok_or_else(|| {
            DriverError::InvalidDocument(format!("{} expects a document", key))
        })?;

        for (field, value) in args.iter() {
            match op {
                "set" => set_path(doc, field, value.clone()),
                "unset" => remove_path(doc, field),
                "inc" => {
                    let next = match (lookup(doc, field), value) {
                        (None, v) => v.clone(),
                        (Some(Value::Int(a)), Value::Int(b)) => {
                            Value::Int(a.checked_add(*b).ok_or_else(|| {
                                DriverError::InvalidDocument(format!(
                                    "increment of {} overflows a 64-bit integer",
                                    field
                                ))
                            })?)
                        }
                        (Some(current), v) => match (current.as_f64(), v.as_f64()) {
                            (Some(a), Some(b)) => Value::Float(a + b),
                            _ => {
                                return Err(DriverError::InvalidDocument(format!(
                                    "cannot increment non-numeric field {}",
                                    field
                                )))
                            }
                        },
                    };
                    set_path(doc, field, next);
                }
                _ => {}
            }
        }
    }
    Ok(())
}

/// Seed document for an upsert: the plain equality constraints of the query
pub(crate) fn upsert_seed(criteria: &Document, prefix: &str) -> Document {
    criteria
        .iter()
        .filter(|(key, value)| {
            !key.contains('.')
                && !matches!(value, Value::Document(ops) if is_operator_document(ops, prefix))
        })
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Apply a field projection. Empty projection returns the whole document.
pub(crate) fn project(doc: &Document, fields: &Document) -> Document {
    if fields.is_empty() {
        return doc.clone();
    }

    let include = fields
        .iter()
        .any(|(k, v)| k != "_id" && truthy(Some(v)));

    if include {
        let keep_id = fields.get("_id").map_or(true, |v| truthy(Some(v)));
        doc.iter()
            .filter(|(k, _)| (*k == "_id" && keep_id) || truthy(fields.get(k)))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    } else {
        doc.iter()
            .filter(|(k, _)| !fields.contains_key(k))
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}
