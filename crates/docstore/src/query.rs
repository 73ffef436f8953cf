//! Query builder for find operations

use bson::Document as BsonDocument;

/// Filter, sort and pagination for a find
///
/// `limit` follows driver semantics: 0 means no limit and a negative value
/// means its absolute value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    filter: BsonDocument,
    sort: Option<BsonDocument>,
    skip: Option<u64>,
    limit: Option<i64>,
}

impl FindQuery {
    /// Query matching every document
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter document
    pub fn filter(mut self, filter: BsonDocument) -> Self {
        self.filter = filter;
        self
    }

    /// Set the sort order
    pub fn sort(mut self, sort: BsonDocument) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Set the number of documents to skip
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Set the maximum number of documents to return
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn get_filter(&self) -> &BsonDocument {
        &self.filter
    }

    pub fn get_sort(&self) -> Option<&BsonDocument> {
        self.sort.as_ref()
    }

    pub fn get_skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn get_limit(&self) -> Option<i64> {
        self.limit
    }

    /// The limit as a plain count, `None` when unbounded
    pub fn effective_limit(&self) -> Option<u64> {
        match self.limit {
            None | Some(0) => None,
            Some(n) => Some(n.unsigned_abs()),
        }
    }
}

impl From<BsonDocument> for FindQuery {
    fn from(filter: BsonDocument) -> Self {
        Self::new().filter(filter)
    }
}
