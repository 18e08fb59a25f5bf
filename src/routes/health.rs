use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::warn;
use serde_json::json;

use crate::db::Database;

/// Health check endpoint
///
/// Reports the API status, whether the database answers, and the current time.
/// Responds 503 while the database is unreachable.
#[get("/health")]
pub async fn health(database: web::Data<Database>) -> impl Responder {
    match database.ping().await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "status": "ok",
            "database": "up",
            "timestamp": Utc::now()
        })),
        Err(e) => {
            warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "status": "degraded",
                "database": "down",
                "timestamp": Utc::now()
            }))
        }
    }
}
