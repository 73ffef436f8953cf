//! Value lookup and ordering for in-memory evaluation

use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

/// Resolve a dotted field path such as `"meta.owner"`
pub fn lookup_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            Bson::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

fn as_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse().ok(),
        _ => None,
    }
}

/// NaN sorts before every other number and equal to itself
fn numeric_order(x: f64, y: f64) -> Ordering {
    match (x.is_nan(), y.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

/// Canonical rank of a BSON type in cross-type sort order
fn type_rank(value: &Bson) -> u8 {
    match value {
        Bson::MinKey => 0,
        Bson::Null | Bson::Undefined => 1,
        Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_) => 2,
        Bson::String(_) | Bson::Symbol(_) => 3,
        Bson::Document(_) => 4,
        Bson::Array(_) => 5,
        Bson::Binary(_) => 6,
        Bson::ObjectId(_) => 7,
        Bson::Boolean(_) => 8,
        Bson::DateTime(_) => 9,
        Bson::Timestamp(_) => 10,
        Bson::RegularExpression(_) => 11,
        Bson::MaxKey => 13,
        _ => 12,
    }
}

/// Equality with numeric widths treated as one type
pub fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_f64(a), as_f64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

/// Ordering between two values of the same comparable type
///
/// Returns `None` when the types differ, which makes range operators
/// such as `$gt` fail to match.
pub fn compare_values(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::Timestamp(x), Bson::Timestamp(y)) => {
            Some((x.time, x.increment).cmp(&(y.time, y.increment)))
        }
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Total order used by `$sort`; a missing field sorts like null
pub fn sort_order(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let a = a.unwrap_or(&Bson::Null);
    let b = b.unwrap_or(&Bson::Null);
    if let (Some(x), Some(y)) = (as_f64(a), as_f64(b)) {
        return numeric_order(x, y);
    }
    compare_values(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b)))
}

/// Compare two documents by a `{ field: 1 | -1 }` specification
pub fn compare_by_spec(a: &BsonDocument, b: &BsonDocument, spec: &BsonDocument) -> Ordering {
    for (field, direction) in spec {
        let descending = as_f64(direction).map(|d| d < 0.0).unwrap_or(false);
        let ordering = sort_order(lookup_path(a, field), lookup_path(b, field));
        let ordering = if descending { ordering.reverse() } else { ordering };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_lookup_nested_path() {
        let doc = doc! { "meta": { "owner": "rob", "tags": ["a", "b"] } };
        assert_eq!(lookup_path(&doc, "meta.owner"), Some(&Bson::String("rob".into())));
        assert_eq!(lookup_path(&doc, "meta.tags.1"), Some(&Bson::String("b".into())));
        assert_eq!(lookup_path(&doc, "meta.missing"), None);
        assert_eq!(lookup_path(&doc, "meta.owner.deeper"), None);
    }

    #[test]
    fn test_numeric_equality_across_widths() {
        assert!(values_equal(&Bson::Int32(3), &Bson::Int64(3)));
        assert!(values_equal(&Bson::Int64(3), &Bson::Double(3.0)));
        assert!(!values_equal(&Bson::Int32(3), &Bson::String("3".into())));
    }

    #[test]
    fn test_compare_mismatched_types() {
        assert_eq!(compare_values(&Bson::Int32(1), &Bson::String("1".into())), None);
        assert_eq!(
            compare_values(&Bson::String("a".into()), &Bson::String("b".into())),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_sort_order_missing_is_lowest() {
        assert_eq!(sort_order(None, Some(&Bson::Int32(0))), Ordering::Less);
        assert_eq!(
            sort_order(Some(&Bson::Int32(10)), Some(&Bson::String("a".into()))),
            Ordering::Less
        );
    }

    #[test]
    fn test_sort_order_nan_and_decimal() {
        let decimal = |s: &str| Bson::Decimal128(s.parse().unwrap());
        let mut values = vec![
            Bson::Int32(5),
            decimal("2.5"),
            Bson::Double(f64::NAN),
            Bson::Int64(-1),
            decimal("NaN"),
            Bson::Double(3.0),
        ];
        values.sort_by(|a, b| sort_order(Some(a), Some(b)));

        assert!(values[..2].iter().all(|v| as_f64(v).is_some_and(f64::is_nan)));
        assert_eq!(
            &values[2..],
            &[Bson::Int64(-1), decimal("2.5"), Bson::Double(3.0), Bson::Int32(5)]
        );

        // Transitive across NaN: NaN < 1 < 2 implies NaN < 2
        let nan = Bson::Double(f64::NAN);
        assert_eq!(sort_order(Some(&nan), Some(&Bson::Int32(1))), Ordering::Less);
        assert_eq!(sort_order(Some(&Bson::Int32(1)), Some(&decimal("2"))), Ordering::Less);
        assert_eq!(sort_order(Some(&nan), Some(&decimal("2"))), Ordering::Less);
        assert_eq!(sort_order(Some(&nan), Some(&decimal("NaN"))), Ordering::Equal);
    }

    #[test]
    fn test_decimal_compares_with_other_numbers() {
        let four = || Bson::Decimal128("4.0".parse().unwrap());
        assert!(values_equal(&four(), &Bson::Int32(4)));
        assert_eq!(
            compare_values(&four(), &Bson::Double(4.5)),
            Some(Ordering::Less)
        );
        // Range filters still never match NaN
        assert_eq!(compare_values(&Bson::Double(f64::NAN), &Bson::Int32(1)), None);
    }

    #[test]
    fn test_compare_by_spec_multiple_keys() {
        let a = doc! { "status": "OPEN", "n": 1 };
        let b = doc! { "status": "OPEN", "n": 2 };
        let spec = doc! { "status": 1, "n": -1 };
        assert_eq!(compare_by_spec(&a, &b, &spec), Ordering::Greater);
    }
}
