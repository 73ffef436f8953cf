//! Query filter evaluation for the in-memory backend
//!
//! Supported: implicit equality, `$eq $ne $gt $gte $lt $lte $in $nin
//! $exists`, top-level `$and` / `$or` / `$nor`, dotted paths. A field whose
//! value is an array matches when any element matches.

use bson::{Bson, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use std::cmp::Ordering;

use super::compare::{compare_values, lookup_path, values_equal};

/// Returns true when `doc` satisfies `filter`
pub fn matches(doc: &BsonDocument, filter: &BsonDocument) -> Result<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in clauses(condition, key)? {
                    if !matches(doc, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => {
                let mut any = false;
                for clause in clauses(condition, key)? {
                    if matches(doc, clause)? {
                        any = true;
                        break;
                    }
                }
                any
            }
            "$nor" => {
                let mut none = true;
                for clause in clauses(condition, key)? {
                    if matches(doc, clause)? {
                        none = false;
                        break;
                    }
                }
                none
            }
            op if op.starts_with('$') => {
                return Err(DocStoreError::Query(format!(
                    "unsupported top-level operator '{}'",
                    op
                )))
            }
            path => field_matches(lookup_path(doc, path), condition)?,
        };
        if !matched {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(condition: &'a Bson, op: &str) -> Result<Vec<&'a BsonDocument>> {
    let items = condition
        .as_array()
        .ok_or_else(|| DocStoreError::Query(format!("'{}' expects an array", op)))?;
    if items.is_empty() {
        return Err(DocStoreError::Query(format!("'{}' requires at least one clause", op)));
    }
    items
        .iter()
        .map(|item| {
            item.as_document()
                .ok_or_else(|| DocStoreError::Query(format!("'{}' clauses must be documents", op)))
        })
        .collect()
}

fn is_operator_document(condition: &Bson) -> Option<&BsonDocument> {
    match condition {
        Bson::Document(doc) if doc.keys().next().is_some_and(|k| k.starts_with('$')) => Some(doc),
        _ => None,
    }
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> Result<bool> {
    let Some(operators) = is_operator_document(condition) else {
        return Ok(equals(value, condition));
    };

    for (op, operand) in operators {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => ordered(value, operand, |o| o == Ordering::Greater),
            "$gte" => ordered(value, operand, |o| o != Ordering::Less),
            "$lt" => ordered(value, operand, |o| o == Ordering::Less),
            "$lte" => ordered(value, operand, |o| o != Ordering::Greater),
            "$in" => in_list(value, operand, op)?,
            "$nin" => !in_list(value, operand, op)?,
            "$exists" => {
                let wanted = match operand {
                    Bson::Boolean(b) => *b,
                    Bson::Int32(n) => *n != 0,
                    Bson::Int64(n) => *n != 0,
                    _ => true,
                };
                value.is_some() == wanted
            }
            other => {
                return Err(DocStoreError::Query(format!(
                    "unsupported query operator '{}'",
                    other
                )))
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Equality where a missing field equals null and arrays match by element
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(actual) => {
            if values_equal(actual, expected) {
                return true;
            }
            match actual {
                Bson::Array(items) => items.iter().any(|item| values_equal(item, expected)),
                _ => false,
            }
        }
    }
}

fn ordered(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let Some(actual) = value else {
        return false;
    };
    let check = |candidate: &Bson| compare_values(candidate, operand).is_some_and(&accept);
    match actual {
        Bson::Array(items) => items.iter().any(check),
        other => check(other),
    }
}

fn in_list(value: Option<&Bson>, operand: &Bson, op: &str) -> Result<bool> {
    let candidates = operand
        .as_array()
        .ok_or_else(|| DocStoreError::Query(format!("'{}' expects an array", op)))?;
    Ok(candidates.iter().any(|candidate| equals(value, candidate)))
}
