// libs/doctor-cell/src/services/doctor.rs
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};

use crate::models::{Doctor, DoctorError};

pub struct DoctorService {
    supabase: SupabaseClient,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Public doctor directory, ordered by name.
    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        debug!("Listing doctors");

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=full_name.asc", None, None)
            .await
            .map_err(db_error)?;

        parse_doctors(result)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid, auth_token: &str) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor: {}", doctor_id);

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

    /// Batched lookup for denormalized display fields. One `id=in.(...)`
    /// query regardless of how many appointments reference the doctors.
    pub async fn get_doctors_by_ids(
        &self,
        doctor_ids: &[Uuid],
        auth_token: &str,
    ) -> Result<Vec<Doctor>, DoctorError> {
        if doctor_ids.is_empty() {
            return Ok(Vec::new());
        }

        let ids = doctor_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/rest/v1/doctors?id=in.({})", ids);

        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, Some(auth_token), None)
            .await
            .map_err(db_error)?;

        parse_doctors(result)
    }
}

fn parse_doctors(rows: Vec<Value>) -> Result<Vec<Doctor>, DoctorError> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row)
                .map_err(|e| DoctorError::Database(format!("Failed to parse doctor: {}", e)))
        })
        .collect()
}

pub(crate) fn db_error(e: SupabaseError) -> DoctorError {
    match e {
        SupabaseError::NotFound(_) => DoctorError::NotFound,
        SupabaseError::Conflict(_) => DoctorError::ConcurrentUpdate,
        other => DoctorError::Database(other.to_string()),
    }
}
