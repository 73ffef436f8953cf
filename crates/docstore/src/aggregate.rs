//! Group-and-count aggregation
//!
//! Builds `[{ $group: { _id: "$<field>", <count_field>: { $count: {} } } }]`
//! and decodes the resulting rows into [`GroupCount`] pairs.

use bson::{doc, Bson, Document as BsonDocument};
use docstore_common::{DocStoreError, Result};
use serde::Serialize;

/// Output field holding the per-group count unless overridden
pub const DEFAULT_COUNT_FIELD: &str = "docs";

/// One row of a group-by-count result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupCount {
    pub key: Bson,
    pub count: u64,
}

impl GroupCount {
    /// Group key as a string, if it is one
    pub fn key_str(&self) -> Option<&str> {
        self.key.as_str()
    }
}

/// Pipeline that counts documents per distinct value of one field
#[derive(Debug, Clone)]
pub struct GroupCountPipeline {
    field: String,
    count_field: String,
    filter: Option<BsonDocument>,
}

impl GroupCountPipeline {
    pub fn by_field(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            count_field: DEFAULT_COUNT_FIELD.to_string(),
            filter: None,
        }
    }

    /// Rename the output count field
    pub fn count_field(mut self, name: impl Into<String>) -> Self {
        self.count_field = name.into();
        self
    }

    /// Restrict the grouped documents with a leading `$match`
    pub fn matching(mut self, filter: BsonDocument) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn to_pipeline(&self) -> Vec<BsonDocument> {
        let mut stages = Vec::with_capacity(2);
        if let Some(filter) = &self.filter {
            stages.push(doc! { "$match": filter.clone() });
        }
        let mut group = doc! { "_id": format!("${}", self.field) };
        group.insert(self.count_field.clone(), doc! { "$count": {} });
        stages.push(doc! { "$group": group });
        stages
    }

    /// Decode result rows produced by [`Self::to_pipeline`]
    pub fn parse_rows(&self, rows: Vec<BsonDocument>) -> Result<Vec<GroupCount>> {
        rows.into_iter()
            .map(|mut row| {
                let key = row.remove("_id").unwrap_or(Bson::Null);
                let count = row
                    .get(&self.count_field)
                    .and_then(bson_to_count)
                    .ok_or_else(|| {
                        DocStoreError::Deserialization(format!(
                            "group row is missing numeric field '{}': {}",
                            self.count_field, row
                        ))
                    })?;
                Ok(GroupCount { key, count })
            })
            .collect()
    }
}

/// Sum of every group's count
pub fn total_count(groups: &[GroupCount]) -> u64 {
    groups.iter().map(|g| g.count).sum()
}

fn bson_to_count(value: &Bson) -> Option<u64> {
    match value {
        Bson::Int32(n) => u64::try_from(*n).ok(),
        Bson::Int64(n) => u64::try_from(*n).ok(),
        Bson::Double(f) if *f >= 0.0 && f.fract() == 0.0 => Some(*f as u64),
        _ => None,
    }
}
