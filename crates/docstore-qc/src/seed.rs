//! Todo model and the fixed data set the CRUD suite runs against

use bson::oid::ObjectId;
use docstore::config::DEFAULT_COLLECTION;
use docstore::Document;
use serde::{Deserialize, Serialize};

/// Number of documents inserted by [`seed_todos`]
pub const SEED_COUNT: u64 = 8;

/// Owner of every seeded todo
pub const SEED_USER: &str = "rob";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TodoStatus {
    #[serde(rename = "DONE")]
    Done,
    #[serde(rename = "IN PROGRESS")]
    InProgress,
    #[serde(rename = "OPEN")]
    Open,
}

impl TodoStatus {
    pub const ALL: [TodoStatus; 3] = [TodoStatus::Done, TodoStatus::InProgress, TodoStatus::Open];

    /// Tag as stored in the `status` field
    pub fn as_str(&self) -> &'static str {
        match self {
            TodoStatus::Done => "DONE",
            TodoStatus::InProgress => "IN PROGRESS",
            TodoStatus::Open => "OPEN",
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub title: String,
    pub status: TodoStatus,
}

impl Todo {
    pub fn new(title: impl Into<String>, status: TodoStatus) -> Self {
        Self {
            id: None,
            user: None,
            title: title.into(),
            status,
        }
    }

    pub fn owned_by(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl Document for Todo {
    fn collection_name() -> &'static str {
        DEFAULT_COLLECTION
    }

    fn get_id(&self) -> Option<ObjectId> {
        self.id
    }

    fn set_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }
}

/// The eight seeded todos, in insertion order
pub fn seed_todos() -> Vec<Todo> {
    [
        ("Do some TDD setup", TodoStatus::Done),
        ("Do some Teardown", TodoStatus::Done),
        ("Add some sample data", TodoStatus::InProgress),
        ("Do Mongoose CRUD", TodoStatus::InProgress),
        ("Show some find Operators", TodoStatus::Open),
        ("Do some Aggregation", TodoStatus::Open),
        ("Do some more Aggregation", TodoStatus::Open),
        ("Do even more Aggregation", TodoStatus::Open),
    ]
    .into_iter()
    .map(|(title, status)| Todo::new(title, status).owned_by(SEED_USER))
    .collect()
}

/// The todo inserted by the "create document" case
pub fn extra_todo() -> Todo {
    Todo::new("Do some TDD", TodoStatus::InProgress)
}
