//! Aggregation pipeline evaluation for the in-memory backend
//!
//! Stages: `$match`, `$group`, `$sort`, `$skip`, `$limit`, `$count`.
//! `$group` accumulators: `$count`, `$sum`, `$avg`, `$min`, `$max`,
//! `$first`, `$last`. Groups come out in order of first appearance.

use bson::{Bson, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use std::cmp::Ordering;

use super::compare::{compare_by_spec, lookup_path, sort_order, values_equal};
use super::filter;

/// Run `pipeline` over `docs`
pub fn run(docs: Vec<BsonDocument>, pipeline: &[BsonDocument]) -> Result<Vec<BsonDocument>> {
    pipeline.iter().try_fold(docs, |docs, stage| apply_stage(docs, stage))
}

fn apply_stage(docs: Vec<BsonDocument>, stage: &BsonDocument) -> Result<Vec<BsonDocument>> {
    let mut entries = stage.iter();
    let (name, spec) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Err(DocStoreError::Query(format!(
                "a pipeline stage must have exactly one field: {}",
                stage
            )))
        }
    };

    match name.as_str() {
        "$match" => {
            let condition = spec_document(name, spec)?;
            let mut kept = Vec::with_capacity(docs.len());
            for doc in docs {
                if filter::matches(&doc, condition)? {
                    kept.push(doc);
                }
            }
            Ok(kept)
        }
        "$group" => group(docs, spec_document(name, spec)?),
        "$sort" => {
            let order = spec_document(name, spec)?;
            if order.is_empty() {
                return Err(DocStoreError::Query("$sort requires at least one key".to_string()));
            }
            let mut docs = docs;
            docs.sort_by(|a, b| compare_by_spec(a, b, order));
            Ok(docs)
        }
        "$skip" => {
            let n = spec_count(name, spec)?;
            Ok(docs.into_iter().skip(n).collect())
        }
        "$limit" => {
            let n = spec_count(name, spec)?;
            if n == 0 {
                return Err(DocStoreError::Query("$limit must be positive".to_string()));
            }
            Ok(docs.into_iter().take(n).collect())
        }
        "$count" => {
            let field = spec
                .as_str()
                .filter(|f| !f.is_empty() && !f.starts_with('$'))
                .ok_or_else(|| {
                    DocStoreError::Query("$count expects a non-empty field name".to_string())
                })?;
            if docs.is_empty() {
                return Ok(Vec::new());
            }
            let mut out = BsonDocument::new();
            out.insert(field, int_bson(docs.len() as i64));
            Ok(vec![out])
        }
        other => Err(DocStoreError::Query(format!(
            "unsupported pipeline stage '{}'",
            other
        ))),
    }
}

fn spec_document<'a>(stage: &str, spec: &'a Bson) -> Result<&'a BsonDocument> {
    spec.as_document()
        .ok_or_else(|| DocStoreError::Query(format!("{} expects a document", stage)))
}

fn spec_count(stage: &str, spec: &Bson) -> Result<usize> {
    let n = match spec {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        Bson::Double(f) if f.fract() == 0.0 => *f as i64,
        _ => -1,
    };
    usize::try_from(n)
        .map_err(|_| DocStoreError::Query(format!("{} expects a non-negative integer", stage)))
}

/// Evaluate a group key or accumulator operand against one document
fn evaluate(doc: &BsonDocument, expr: &Bson) -> Bson {
    match expr {
        Bson::String(s) if s.starts_with('$') => {
            lookup_path(doc, &s[1..]).cloned().unwrap_or(Bson::Null)
        }
        Bson::Document(fields) => {
            let mut out = BsonDocument::new();
            for (key, value) in fields {
                out.insert(key.clone(), evaluate(doc, value));
            }
            Bson::Document(out)
        }
        literal => literal.clone(),
    }
}

#[derive(Debug, Clone, Copy)]
enum AccumulatorKind {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
}

#[derive(Debug, Clone)]
struct AccumulatorSpec {
    output: String,
    kind: AccumulatorKind,
    operand: Bson,
}

impl AccumulatorSpec {
    fn parse(output: &str, spec: &Bson) -> Result<Self> {
        let invalid = || {
            DocStoreError::Query(format!(
                "accumulator '{}' must be a single-operator document",
                output
            ))
        };
        let spec = spec.as_document().ok_or_else(invalid)?;
        let mut entries = spec.iter();
        let (op, operand) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => return Err(invalid()),
        };
        let kind = match op.as_str() {
            "$count" => AccumulatorKind::Count,
            "$sum" => AccumulatorKind::Sum,
            "$avg" => AccumulatorKind::Avg,
            "$min" => AccumulatorKind::Min,
            "$max" => AccumulatorKind::Max,
            "$first" => AccumulatorKind::First,
            "$last" => AccumulatorKind::Last,
            other => {
                return Err(DocStoreError::Query(format!(
                    "unsupported accumulator '{}'",
                    other
                )))
            }
        };
        Ok(Self {
            output: output.to_string(),
            kind,
            operand: operand.clone(),
        })
    }
}

/// Running numeric total that keeps integer width while it can
#[derive(Debug, Clone, Copy, Default)]
struct NumericSum {
    int: i64,
    float: f64,
    saw_float: bool,
    seen: u64,
}

impl NumericSum {
    fn add(&mut self, value: &Bson) {
        match value {
            Bson::Int32(n) => {
                self.int = self.int.saturating_add(i64::from(*n));
                self.seen += 1;
            }
            Bson::Int64(n) => {
                self.int = self.int.saturating_add(*n);
                self.seen += 1;
            }
            Bson::Double(f) => {
                self.float += f;
                self.saw_float = true;
                self.seen += 1;
            }
            // Non-numeric values are ignored
            _ => {}
        }
    }

    fn total(&self) -> Bson {
        if self.saw_float {
            Bson::Double(self.int as f64 + self.float)
        } else {
            int_bson(self.int)
        }
    }

    fn average(&self) -> Bson {
        if self.seen == 0 {
            Bson::Null
        } else {
            Bson::Double((self.int as f64 + self.float) / self.seen as f64)
        }
    }
}

#[derive(Debug, Clone)]
enum AccumulatorState {
    Count(i64),
    Sum(NumericSum),
    Value(Option<Bson>),
}

impl AccumulatorState {
    fn new(kind: AccumulatorKind) -> Self {
        match kind {
            AccumulatorKind::Count => AccumulatorState::Count(0),
            AccumulatorKind::Sum | AccumulatorKind::Avg => AccumulatorState::Sum(NumericSum::default()),
            _ => AccumulatorState::Value(None),
        }
    }

    fn update(&mut self, spec: &AccumulatorSpec, doc: &BsonDocument) {
        match self {
            AccumulatorState::Count(n) => *n += 1,
            AccumulatorState::Sum(sum) => sum.add(&evaluate(doc, &spec.operand)),
            AccumulatorState::Value(current) => {
                let value = evaluate(doc, &spec.operand);
                let replace = match (spec.kind, current.as_ref()) {
                    (_, None) => true,
                    (AccumulatorKind::First, Some(_)) => false,
                    (AccumulatorKind::Last, Some(_)) => true,
                    (AccumulatorKind::Min, Some(existing)) => {
                        sort_order(Some(&value), Some(existing)) == Ordering::Less
                    }
                    (AccumulatorKind::Max, Some(existing)) => {
                        sort_order(Some(&value), Some(existing)) == Ordering::Greater
                    }
                    _ => false,
                };
                if replace {
                    *current = Some(value);
                }
            }
        }
    }

    fn finish(self, kind: AccumulatorKind) -> Bson {
        match self {
            AccumulatorState::Count(n) => int_bson(n),
            AccumulatorState::Sum(sum) => match kind {
                AccumulatorKind::Avg => sum.average(),
                _ => sum.total(),
            },
            AccumulatorState::Value(value) => value.unwrap_or(Bson::Null),
        }
    }
}

fn group(docs: Vec<BsonDocument>, spec: &BsonDocument) -> Result<Vec<BsonDocument>> {
    let key_expr = spec
        .get("_id")
        .ok_or_else(|| DocStoreError::Query("$group requires an _id expression".to_string()))?;

    let accumulators = spec
        .iter()
        .filter(|(field, _)| field.as_str() != "_id")
        .map(|(field, acc)| AccumulatorSpec::parse(field, acc))
        .collect::<Result<Vec<_>>>()?;

    let mut groups: Vec<(Bson, Vec<AccumulatorState>)> = Vec::new();
    for doc in &docs {
        let key = evaluate(doc, key_expr);
        let index = match groups.iter().position(|(existing, _)| values_equal(existing, &key)) {
            Some(index) => index,
            None => {
                let states = accumulators.iter().map(|a| AccumulatorState::new(a.kind)).collect();
                groups.push((key, states));
                groups.len() - 1
            }
        };
        for (state, acc) in groups[index].1.iter_mut().zip(&accumulators) {
            state.update(acc, doc);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, states)| {
            let mut out = BsonDocument::new();
            out.insert("_id", key);
            for (state, acc) in states.into_iter().zip(&accumulators) {
                out.insert(acc.output.clone(), state.finish(acc.kind));
            }
            out
        })
        .collect())
}

fn int_bson(n: i64) -> Bson {
    match i32::try_from(n) {
        Ok(small) => Bson::Int32(small),
        Err(_) => Bson::Int64(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn todos() -> Vec<BsonDocument> {
        vec![
            doc! { "title": "a", "status": "DONE", "points": 1 },
            doc! { "title": "b", "status": "OPEN", "points": 3 },
            doc! { "title": "c", "status": "DONE", "points": 2.5 },
            doc! { "title": "d", "status": "OPEN", "points": 5 },
            doc! { "title": "e", "status": "IN PROGRESS" },
        ]
    }

    #[test]
    fn test_group_count_by_status() {
        let out = run(
            todos(),
            &[doc! { "$group": { "_id": "$status", "docs": { "$count": {} } } }],
        )
        .unwrap();

        assert_eq!(
            out,
            vec![
                doc! { "_id": "DONE", "docs": 2 },
                doc! { "_id": "OPEN", "docs": 2 },
                doc! { "_id": "IN PROGRESS", "docs": 1 },
            ]
        );
    }

    #[test]
    fn test_group_accumulators() {
        let out = run(
            todos(),
            &[doc! { "$group": {
                "_id": "$status",
                "total": { "$sum": "$points" },
                "n": { "$sum": 1 },
                "avg": { "$avg": "$points" },
                "first": { "$first": "$title" },
                "last": { "$last": "$title" },
                "lowest": { "$min": "$points" },
                "highest": { "$max": "$points" },
            } }],
        )
        .unwrap();

        let done = &out[0];
        assert_eq!(done.get("total"), Some(&Bson::Double(3.5)));
        assert_eq!(done.get("n"), Some(&Bson::Int32(2)));
        assert_eq!(done.get("avg"), Some(&Bson::Double(1.75)));
        assert_eq!(done.get_str("first").unwrap(), "a");
        assert_eq!(done.get_str("last").unwrap(), "c");
        assert_eq!(done.get("lowest"), Some(&Bson::Int32(1)));
        assert_eq!(done.get("highest"), Some(&Bson::Double(2.5)));

        let open = &out[1];
        assert_eq!(open.get("total"), Some(&Bson::Int32(8)));

        // No numeric points: sum is 0, average is null
        let in_progress = &out[2];
        assert_eq!(in_progress.get("total"), Some(&Bson::Int32(0)));
        assert_eq!(in_progress.get("avg"), Some(&Bson::Null));
    }

    #[test]
    fn test_group_null_key_collects_everything() {
        let out = run(todos(), &[doc! { "$group": { "_id": Bson::Null, "docs": { "$count": {} } } }])
            .unwrap();
        assert_eq!(out, vec![doc! { "_id": Bson::Null, "docs": 5 }]);
    }

    #[test]
    fn test_match_sort_skip_limit() {
        let out = run(
            todos(),
            &[
                doc! { "$match": { "status": { "$in": ["DONE", "OPEN"] } } },
                doc! { "$sort": { "title": -1 } },
                doc! { "$skip": 1 },
                doc! { "$limit": 2 },
            ],
        )
        .unwrap();

        let titles: Vec<&str> = out.iter().map(|d| d.get_str("title").unwrap()).collect();
        assert_eq!(titles, vec!["c", "b"]);
    }

    #[test]
    fn test_count_stage() {
        let out = run(
            todos(),
            &[doc! { "$match": { "status": "OPEN" } }, doc! { "$count": "open" }],
        )
        .unwrap();
        assert_eq!(out, vec![doc! { "open": 2 }]);

        let none = run(
            todos(),
            &[doc! { "$match": { "status": "ARCHIVED" } }, doc! { "$count": "n" }],
        )
        .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_empty_pipeline_is_identity() {
        assert_eq!(run(todos(), &[]).unwrap().len(), 5);
    }

    #[test]
    fn test_rejects_unknown_stage_and_accumulator() {
        assert!(run(todos(), &[doc! { "$lookup": {} }]).is_err());
        assert!(run(
            todos(),
            &[doc! { "$group": { "_id": "$status", "all": { "$push": "$title" } } }]
        )
        .is_err());
        assert!(run(todos(), &[doc! { "$group": { "docs": { "$count": {} } } }]).is_err());
        assert!(run(todos(), &[doc! { "$limit": 0 }]).is_err());
        assert!(run(todos(), &[doc! { "$skip": -1 }]).is_err());
        assert!(run(todos(), &[doc! { "$match": {}, "$limit": 1 }]).is_err());
    }
}
