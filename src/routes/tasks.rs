use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{parse_timestamp, CreateTask, TaskFilterQuery, TaskSearchQuery, TaskUpdate},
    services::TasksService,
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use validator::Validate;

/// Retrieves tasks matching the given filters.
///
/// ## Query Parameters:
/// - `created_at` (optional): only tasks created at or after this instant. Accepts
///   RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC) or `YYYY-MM-DD`.
/// - `status` (optional): `pending` or `done`.
/// - `priority` (optional): 1 (lowest) to 5 (highest).
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects.
/// - `400 Bad Request`: unparseable `created_at`, `status` or `priority`.
/// - `401 Unauthorized`: missing, expired or invalid bearer token.
#[get("/tasks")]
pub async fn get_tasks(
    _current: CurrentUser,
    tasks: web::Data<TasksService>,
    query: web::Query<TaskFilterQuery>,
) -> Result<impl Responder, AppError> {
    let TaskFilterQuery {
        created_at,
        status,
        priority,
    } = query.into_inner();

    let created_after = match created_at.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Invalid created_at value: {}", raw))
        })?),
    };

    let found = tasks.list_by_filters(created_after, status, priority).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Case-insensitive substring search over task titles and descriptions.
#[get("/tasks/search")]
pub async fn search_tasks(
    _current: CurrentUser,
    tasks: web::Data<TasksService>,
    query: web::Query<TaskSearchQuery>,
) -> Result<impl Responder, AppError> {
    let found = tasks.search(&query.search_term).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Creates a task owned by the caller.
#[post("/tasks")]
pub async fn create_task(
    current: CurrentUser,
    tasks: web::Data<TasksService>,
    task_data: web::Json<CreateTask>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks.create(task_data.into_inner(), &current.0).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Partially updates a task. Fields that are absent or `null` keep their value.
#[put("/tasks/{id}")]
pub async fn update_task(
    _current: CurrentUser,
    tasks: web::Data<TasksService>,
    task_id: web::Path<i32>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = tasks
        .update(task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}
