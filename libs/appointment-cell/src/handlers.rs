// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AppointmentError, BookAppointmentRequest, MyAppointmentsQuery};
use crate::services::booking::BookingOrchestrator;

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let patient_id = parse_subject(&user)?;
    let orchestrator = BookingOrchestrator::new(&state);

    let view = orchestrator
        .book(patient_id, request, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "appointment": view
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_my_appointments(
    State(state): State<Arc<AppConfig>>,
    Query(query): Query<MyAppointmentsQuery>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = parse_subject(&user)?;
    let page = query.page;
    let page_size = query.limit;

    let orchestrator = BookingOrchestrator::new(&state);

    let (appointments, total) = orchestrator
        .list_mine(patient_id, query, auth.token())
        .await
        .map_err(map_appointment_error)?;

    let mut body = json!({
        "success": true,
        "appointments": appointments
    });

    if let Some(page) = page {
        body["total"] = json!(total);
        body["page"] = json!(page.max(1));
        body["pageSize"] = json!(page_size.unwrap_or(10).clamp(1, 100));
    }

    Ok(Json(body))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppConfig>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patient_id = parse_subject(&user)?;
    let orchestrator = BookingOrchestrator::new(&state);

    let view = orchestrator
        .cancel(patient_id, appointment_id, auth.token())
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": view
    })))
}

fn parse_subject(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Token subject is not a valid user id".to_string()))
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::MissingField(field) => {
            AppError::ValidationError(format!("Missing required field: {}", field))
        }
        AppointmentError::InvalidDate(raw) => {
            AppError::ValidationError(format!("Invalid slot date (expected YYYY-MM-DD): {}", raw))
        }
        AppointmentError::InvalidSlotTime(raw) => {
            AppError::ValidationError(format!("Invalid slot time: {}", raw))
        }
        AppointmentError::InvalidStatusFilter(raw) => {
            AppError::ValidationError(format!("Invalid status filter: {}", raw))
        }
        AppointmentError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        AppointmentError::DoctorUnavailable => {
            AppError::BadRequest("Doctor is not available for booking".to_string())
        }
        AppointmentError::SlotTaken => {
            AppError::Conflict("Appointment slot is already booked".to_string())
        }
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::InvalidTransition(status) => {
            AppError::BadRequest(format!("Appointment cannot be canceled from status {}", status))
        }
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}
