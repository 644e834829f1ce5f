// libs/appointment-cell/src/services/guard.rs
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::models::{Doctor, DoctorError};
use doctor_cell::services::doctor::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{AppointmentError, SlotTime};

/// Decides admission of a booking request before it is persisted. This is the
/// fast-path rejection; the storage layer's partial unique index remains the
/// authoritative guarantee against concurrent writers.
pub struct SlotConflictGuard {
    supabase: SupabaseClient,
    doctors: DoctorService,
}

impl SlotConflictGuard {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            doctors: DoctorService::new(config),
        }
    }

    /// Admit or reject a `(doctor, date, time)` booking. Returns the fetched
    /// doctor on admission so the orchestrator can enrich the response
    /// without a second lookup.
    pub async fn admit(
        &self,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        slot_time: &SlotTime,
        auth_token: &str,
    ) -> Result<Doctor, AppointmentError> {
        let doctor = self
            .doctors
            .get_doctor(doctor_id, auth_token)
            .await
            .map_err(|e| match e {
                DoctorError::NotFound => AppointmentError::DoctorNotFound,
                other => AppointmentError::Database(other.to_string()),
            })?;

        if !doctor.is_bookable() {
            debug!(
                "Doctor {} not bookable: active={} status={} slots={}",
                doctor_id, doctor.is_active, doctor.availability_status, doctor.available_slots
            );
            return Err(AppointmentError::DoctorUnavailable);
        }

        if self.slot_is_held(doctor_id, slot_date, slot_time, auth_token).await? {
            warn!(
                "Slot conflict for doctor {} at {} {}",
                doctor_id, slot_date, slot_time
            );
            return Err(AppointmentError::SlotTaken);
        }

        Ok(doctor)
    }

    /// Any appointment in a non-terminal status holds the composite key.
    async fn slot_is_held(
        &self,
        doctor_id: Uuid,
        slot_date: NaiveDate,
        slot_time: &SlotTime,
        auth_token: &str,
    ) -> Result<bool, AppointmentError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&slot_date=eq.{}&slot_time=eq.{}&status=in.(pending,upcoming)&limit=1",
            doctor_id,
            slot_date,
            urlencoding::encode(slot_time.as_str()),
        );

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        Ok(!result.is_empty())
    }
}
