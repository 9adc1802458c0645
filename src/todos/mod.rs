//! Todo records and their persistence seam.
//!
//! Storage sits outside the trust protocol; handlers only see the
//! [`TodoRepository`] trait. The shipped implementation keeps everything in
//! memory.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::protocol::body::NewTodo;

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const UNCOMPLETED: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub detail: String,
    pub created_date: String,
    pub updated_date: String,
    pub status_completed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<String>,
}

impl Todo {
    /// A fresh, uncompleted todo. `created_date` is taken from the caller's
    /// signed timestamp, rendered in its own offset.
    pub fn create(new: NewTodo, signed_at: DateTime<FixedOffset>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: new.title,
            detail: new.detail,
            created_date: signed_at.format(DATE_FORMAT).to_string(),
            updated_date: now.format(DATE_FORMAT).to_string(),
            status_completed: UNCOMPLETED.to_string(),
            completed_date: None,
        }
    }
}

#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// All todos newest first, or only the one with `id`.
    async fn list(&self, id: Option<&str>) -> Result<Vec<Todo>>;

    async fn insert(&self, todo: Todo) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTodoRepository {
    todos: Arc<RwLock<Vec<Todo>>>,
}

impl MemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for MemoryTodoRepository {
    async fn list(&self, id: Option<&str>) -> Result<Vec<Todo>> {
        let todos = self.todos.read().await;
        let mut found: Vec<Todo> = todos
            .iter()
            .rev()
            .filter(|t| id.map_or(true, |id| t.id == id))
            .cloned()
            .collect();
        // stable sort keeps insertion order (newest first) among equal timestamps
        found.sort_by(|a, b| b.updated_date.cmp(&a.updated_date));
        Ok(found)
    }

    async fn insert(&self, todo: Todo) -> Result<()> {
        let mut todos = self.todos.write().await;
        todos.push(todo);
        Ok(())
    }
}
