pub mod task;
pub mod user;

pub use task::{
    parse_timestamp, CreateTask, Task, TaskFilterQuery, TaskPriority, TaskSearchQuery, TaskStatus,
    TaskUpdate,
};
pub use user::{User, UserRead};
