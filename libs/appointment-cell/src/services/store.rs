// libs/appointment-cell/src/services/store.rs
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, SlotTime};
use crate::services::lifecycle::AppointmentLifecycleService;

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<AppointmentStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Durable record of booking requests and their lifecycle state.
pub struct AppointmentStore {
    supabase: SupabaseClient,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Persist an admitted booking with status `upcoming`. A 409 from the
    /// partial unique index over `(doctor_id, slot_date, slot_time)` scoped
    /// to non-terminal statuses maps to `SlotTaken`: the second concurrent
    /// writer loses here even when both passed the guard's pre-check.
    pub async fn create(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        slot_time: &SlotTime,
        complaint: Option<String>,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let now = Utc::now();

        let appointment_data = json!({
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "slot_date": slot_date,
            "slot_time": slot_time.as_str(),
            "status": AppointmentStatus::Upcoming.to_string(),
            "complaint": complaint,
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339()
        });

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(appointment_data),
                Some(headers),
            )
            .await
            .map_err(|e| match e {
                SupabaseError::Conflict(_) => {
                    warn!(
                        "Storage-level slot conflict for doctor {} at {} {}",
                        doctor_id, slot_date, slot_time
                    );
                    AppointmentError::SlotTaken
                }
                other => AppointmentError::Database(other.to_string()),
            })?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| AppointmentError::Database("Failed to create appointment".to_string()))?;

        let appointment: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

        info!(
            "Appointment {} created for patient {} with doctor {} at {} {}",
            appointment.id, patient_id, doctor_id, slot_date, slot_time
        );
        Ok(appointment)
    }

    /// List a patient's appointments, newest-created-first. The date range is
    /// inclusive on both ends; when a page is requested the exact total comes
    /// back alongside it.
    pub async fn list_for_patient(
        &self,
        patient_id: Uuid,
        filter: &ListFilter,
        auth_token: &str,
    ) -> Result<(Vec<Appointment>, Option<i64>), AppointmentError> {
        debug!("Listing appointments for patient {}", patient_id);

        let mut query_parts = vec![format!("patient_id=eq.{}", patient_id)];

        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from) = filter.from {
            query_parts.push(format!("slot_date=gte.{}", from));
        }
        if let Some(to) = filter.to {
            query_parts.push(format!("slot_date=lte.{}", to));
        }

        let mut path = format!(
            "/rest/v1/appointments?{}&order=created_at.desc",
            query_parts.join("&")
        );

        if let Some(page) = filter.page {
            let page = page.max(1);
            let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
            let offset = (page - 1) * limit;
            path.push_str(&format!("&limit={}&offset={}", limit, offset));

            let (result, total): (Vec<Value>, Option<i64>) = self
                .supabase
                .request_with_count(Method::GET, &path, Some(auth_token))
                .await
                .map_err(|e| AppointmentError::Database(e.to_string()))?;

            return Ok((parse_appointments(result)?, total));
        }

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok((parse_appointments(result)?, None))
    }

    pub async fn get(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let row = result.into_iter().next().ok_or(AppointmentError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))
    }

    /// Owner-initiated cancellation. A foreign-owned appointment reads as
    /// absent; a terminal one fails the transition check. The PATCH is
    /// conditioned on a non-terminal status so a concurrent cancel (or
    /// completion) cannot be double-applied.
    pub async fn cancel(
        &self,
        appointment_id: Uuid,
        requesting_patient_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, AppointmentError> {
        let current = self.get(appointment_id, auth_token).await?;

        if current.patient_id != requesting_patient_id {
            debug!(
                "Cancel refused: appointment {} not owned by {}",
                appointment_id, requesting_patient_id
            );
            return Err(AppointmentError::NotFound);
        }

        self.lifecycle.validate_cancellation(&current.status)?;

        let update_data = json!({
            "status": AppointmentStatus::Canceled.to_string(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let path = format!(
            "/rest/v1/appointments?id=eq.{}&status=in.(pending,upcoming)",
            appointment_id
        );
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, Some(auth_token), Some(update_data), Some(headers))
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        // Empty result means another writer reached a terminal status first.
        let row = result
            .into_iter()
            .next()
            .ok_or(AppointmentError::InvalidTransition(current.status))?;

        let canceled: Appointment = serde_json::from_value(row)
            .map_err(|e| AppointmentError::Database(format!("Failed to parse appointment: {}", e)))?;

        info!("Appointment {} canceled by owner {}", appointment_id, requesting_patient_id);
        Ok(canceled)
    }
}

fn parse_appointments(rows: Vec<Value>) -> Result<Vec<Appointment>, AppointmentError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).map_err(|e| {
                AppointmentError::Database(format!("Failed to parse appointment: {}", e))
            })
        })
        .collect()
}
