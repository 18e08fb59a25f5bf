use chrono::{DateTime, Utc};
use log::info;

use crate::error::AppError;
use crate::models::{CreateTask, Task, TaskPriority, TaskStatus, TaskUpdate, User};
use crate::repository::{Fields, TasksRepository};

#[derive(Clone)]
pub struct TasksService {
    repo: TasksRepository,
}

impl TasksService {
    pub fn new(repo: TasksRepository) -> Self {
        Self { repo }
    }

    /// Creates a task owned by `owner`.
    pub async fn create(&self, input: CreateTask, owner: &User) -> Result<Task, AppError> {
        let task = self.repo.create(input.into_fields(owner)).await?;
        info!("User {} created task {}", owner.id, task.id);
        Ok(task)
    }

    /// Applies the fields present in `changes` to task `id`.
    pub async fn update(&self, id: i32, changes: TaskUpdate) -> Result<Task, AppError> {
        let task = self.repo.get_by_id(id).await?;
        let task = self.repo.update(&task, changes.into_fields()).await?;
        info!("Updated task {}", task.id);
        Ok(task)
    }

    pub async fn search(&self, term: &str) -> Result<Vec<Task>, AppError> {
        Ok(self.repo.search(term).await?)
    }

    /// Tasks matching every given criterion; `None` means no constraint.
    pub async fn list_by_filters(
        &self,
        created_after: Option<DateTime<Utc>>,
        status: Option<TaskStatus>,
        priority: Option<TaskPriority>,
    ) -> Result<Vec<Task>, AppError> {
        let filters = Fields::new()
            .set_opt("status", status)
            .set_opt("priority", priority);
        Ok(self.repo.get_by_filters(created_after, filters).await?)
    }

    pub async fn list_for_owner(&self, owner: &User) -> Result<Vec<Task>, AppError> {
        Ok(self.repo.get_by_owner(owner.id).await?)
    }
}
