//! Forward-only document cursor shared by every backend
//!
//! A [`Cursor`] wraps a boxed stream of documents. `has_next` peeks by
//! pulling one document into a buffer; that buffered document is returned
//! by the following `next_document` or drain. Once the underlying stream
//! ends the cursor stays exhausted.

use bson::Document as BsonDocument;
use docstore_common::Result;
use futures::stream::{self, BoxStream, Stream, StreamExt};

pub struct Cursor {
    stream: BoxStream<'static, Result<BsonDocument>>,
    buffered: Option<BsonDocument>,
    exhausted: bool,
}

impl Cursor {
    /// Wrap a backend stream
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<BsonDocument>> + Send + 'static,
    {
        Self {
            stream: stream.boxed(),
            buffered: None,
            exhausted: false,
        }
    }

    /// Cursor over documents that are already materialized
    pub fn from_documents(docs: Vec<BsonDocument>) -> Self {
        Self::from_stream(stream::iter(docs.into_iter().map(Ok)))
    }

    /// Returns true if another document is available
    pub async fn has_next(&mut self) -> Result<bool> {
        if self.buffered.is_some() {
            return Ok(true);
        }
        self.buffered = self.pull().await?;
        Ok(self.buffered.is_some())
    }

    /// Returns the next document, or `None` once the cursor is exhausted
    pub async fn next_document(&mut self) -> Result<Option<BsonDocument>> {
        if let Some(doc) = self.buffered.take() {
            return Ok(Some(doc));
        }
        self.pull().await
    }

    /// Drain every remaining document
    pub async fn to_vec(&mut self) -> Result<Vec<BsonDocument>> {
        let mut docs = Vec::new();
        while let Some(doc) = self.next_document().await? {
            docs.push(doc);
        }
        Ok(docs)
    }

    /// True once the underlying stream has ended and nothing is buffered
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.buffered.is_none()
    }

    async fn pull(&mut self) -> Result<Option<BsonDocument>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.stream.next().await {
            Some(item) => item.map(Some),
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("buffered", &self.buffered.is_some())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use docstore_common::DocStoreError;

    fn numbered(n: i32) -> Vec<BsonDocument> {
        (0..n).map(|i| doc! { "n": i }).collect()
    }

    #[tokio::test]
    async fn test_has_next_does_not_consume() {
        let mut cursor = Cursor::from_documents(numbered(3));
        assert!(cursor.has_next().await.unwrap());
        assert!(cursor.has_next().await.unwrap());

        let docs = cursor.to_vec().await.unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].get_i32("n").unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_after_drain() {
        let mut cursor = Cursor::from_documents(numbered(2));
        cursor.to_vec().await.unwrap();

        assert!(cursor.is_exhausted());
        assert!(!cursor.has_next().await.unwrap());
        assert!(cursor.next_document().await.unwrap().is_none());
        assert!(cursor.to_vec().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_next_then_drain_rest() {
        let mut cursor = Cursor::from_documents(numbered(4));
        let first = cursor.next_document().await.unwrap().unwrap();
        assert_eq!(first.get_i32("n").unwrap(), 0);

        let rest = cursor.to_vec().await.unwrap();
        assert_eq!(rest.len(), 3);
        assert_eq!(rest[0].get_i32("n").unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_cursor() {
        let mut cursor = Cursor::from_documents(Vec::new());
        assert!(!cursor.has_next().await.unwrap());
        assert!(cursor.is_exhausted());
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let items = vec![
            Ok(doc! { "n": 1 }),
            Err(DocStoreError::Database("cursor killed".to_string())),
        ];
        let mut cursor = Cursor::from_stream(stream::iter(items));
        assert!(cursor.next_document().await.unwrap().is_some());
        assert!(cursor.next_document().await.is_err());
    }
}
