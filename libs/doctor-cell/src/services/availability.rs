// libs/doctor-cell/src/services/availability.rs
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;

use crate::models::{Doctor, DoctorError, SetAvailabilityRequest};
use crate::services::doctor::db_error;

const DEACTIVATION_REASON: &str = "Deactivated by administrator";

/// Administrative writes against the availability ledger. Every mutation
/// stamps `last_updated`/`updated_by` from the acting admin identity, which is
/// a required parameter rather than a defaulted string.
pub struct AvailabilityService {
    supabase: SupabaseClient,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Set a doctor's availability. Forward-looking only: existing
    /// appointments are never touched, a non-available status merely makes
    /// subsequent guard checks fail.
    pub async fn set_availability(
        &self,
        doctor_id: Uuid,
        request: SetAvailabilityRequest,
        acting_admin: &User,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let status = request.status.parse::<crate::models::AvailabilityStatus>()?;
        let slots = status.resolve_slots(request.available_slots);
        let now = Utc::now();

        debug!(
            "Setting availability for doctor {}: status={} slots={}",
            doctor_id, status, slots
        );

        let update_data = json!({
            "availability_status": status.to_string(),
            "available_slots": slots,
            "availability_reason": request.reason.unwrap_or_default(),
            "expected_back_time": request.expected_back_time,
            "last_updated": now.to_rfc3339(),
            "updated_by": acting_admin.id,
            "updated_at": now.to_rfc3339()
        });

        let doctor = self.patch_doctor(doctor_id, update_data, auth_token).await?;

        info!(
            "Availability updated for doctor {} by {}: {} ({} slots)",
            doctor_id, acting_admin.id, status, slots
        );
        Ok(doctor)
    }

    /// Flip the hard kill-switch. Deactivation forces the unavailable state;
    /// reactivation deliberately does not restore a bookable status, an
    /// explicit `set_availability` call is required afterwards.
    pub async fn toggle_active(
        &self,
        doctor_id: Uuid,
        acting_admin: &User,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let current = self.get_doctor(doctor_id, auth_token).await?;
        let now = Utc::now();

        let update_data = if current.is_active {
            json!({
                "is_active": false,
                "availability_status": crate::models::AvailabilityStatus::TemporarilyUnavailable.to_string(),
                "available_slots": 0,
                "availability_reason": DEACTIVATION_REASON,
                "last_updated": now.to_rfc3339(),
                "updated_by": acting_admin.id,
                "updated_at": now.to_rfc3339()
            })
        } else {
            json!({
                "is_active": true,
                "last_updated": now.to_rfc3339(),
                "updated_by": acting_admin.id,
                "updated_at": now.to_rfc3339()
            })
        };

        // Condition the flip on the state we read so two admins toggling the
        // same doctor cannot both apply against a stale value.
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&is_active=eq.{}",
            doctor_id, current.is_active
        );
        let doctor = self
            .patch_path(&path, update_data, auth_token)
            .await?
            .ok_or(DoctorError::ConcurrentUpdate)?;

        info!(
            "Doctor {} toggled to is_active={} by {}",
            doctor_id, doctor.is_active, acting_admin.id
        );
        Ok(doctor)
    }

    async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(db_error)?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row)
            .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
    }

    async fn patch_doctor(
        &self,
        doctor_id: Uuid,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Doctor, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        self.patch_path(&path, update_data, auth_token)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    async fn patch_path(
        &self,
        path: &str,
        update_data: Value,
        auth_token: &str,
    ) -> Result<Option<Doctor>, DoctorError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(Method::PATCH, path, Some(auth_token), Some(update_data), Some(headers))
            .await
            .map_err(db_error)?;

        match result.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e))),
            None => Ok(None),
        }
    }
}
