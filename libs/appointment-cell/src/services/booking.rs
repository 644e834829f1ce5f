// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use doctor_cell::services::doctor::DoctorService;
use shared_config::AppConfig;

use crate::models::{
    AppointmentError, AppointmentView, BookAppointmentRequest, DoctorSummary, MyAppointmentsQuery,
    SlotTime,
};
use crate::services::guard::SlotConflictGuard;
use crate::services::store::{AppointmentStore, ListFilter};

/// Thin composition over the guard and the store. All writes flow one way:
/// request -> guard (reads ledger + store) -> store -> response.
pub struct BookingOrchestrator {
    guard: SlotConflictGuard,
    store: AppointmentStore,
    doctors: DoctorService,
}

impl BookingOrchestrator {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            guard: SlotConflictGuard::new(config),
            store: AppointmentStore::new(config),
            doctors: DoctorService::new(config),
        }
    }

    pub async fn book(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<AppointmentView, AppointmentError> {
        let doctor_id = request
            .doctor_id
            .ok_or(AppointmentError::MissingField("doctor_id"))?;
        let slot_date_raw = request
            .slot_date
            .ok_or(AppointmentError::MissingField("slot_date"))?;
        let slot_time_raw = request
            .slot_time
            .ok_or(AppointmentError::MissingField("slot_time"))?;

        // Calendar-day parse, never a locale-sensitive constructor: a client
        // in UTC-5 and one in UTC+9 book the same stored day.
        let slot_date = NaiveDate::parse_from_str(&slot_date_raw, "%Y-%m-%d")
            .map_err(|_| AppointmentError::InvalidDate(slot_date_raw))?;
        let slot_time: SlotTime = slot_time_raw.parse()?;

        info!(
            "Booking request: patient {} doctor {} at {} {}",
            patient_id, doctor_id, slot_date, slot_time
        );

        let doctor = self
            .guard
            .admit(doctor_id, slot_date, &slot_time, auth_token)
            .await?;

        let appointment = self
            .store
            .create(patient_id, doctor_id, slot_date, &slot_time, request.complaint, auth_token)
            .await?;

        Ok(AppointmentView {
            appointment,
            doctor: Some(DoctorSummary::from(&doctor)),
        })
    }

    pub async fn list_mine(
        &self,
        patient_id: Uuid,
        query: MyAppointmentsQuery,
        auth_token: &str,
    ) -> Result<(Vec<AppointmentView>, Option<i64>), AppointmentError> {
        let filter = ListFilter {
            status: query.status.as_deref().map(str::parse).transpose()?,
            from: query.from,
            to: query.to,
            page: query.page,
            limit: query.limit,
        };

        let (appointments, total) = self
            .store
            .list_for_patient(patient_id, &filter, auth_token)
            .await?;

        // One batched lookup for the display fields, regardless of row count.
        let mut doctor_ids: Vec<Uuid> = appointments.iter().map(|a| a.doctor_id).collect();
        doctor_ids.sort_unstable();
        doctor_ids.dedup();

        let doctors = self
            .doctors
            .get_doctors_by_ids(&doctor_ids, auth_token)
            .await
            .map_err(|e| AppointmentError::Database(e.to_string()))?;

        let by_id: HashMap<Uuid, DoctorSummary> = doctors
            .iter()
            .map(|d| (d.id, DoctorSummary::from(d)))
            .collect();

        debug!(
            "Listed {} appointments for patient {} ({} doctors)",
            appointments.len(),
            patient_id,
            by_id.len()
        );

        let views = appointments
            .into_iter()
            .map(|appointment| {
                let doctor = by_id.get(&appointment.doctor_id).cloned();
                AppointmentView { appointment, doctor }
            })
            .collect();

        Ok((views, total))
    }

    pub async fn cancel(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<AppointmentView, AppointmentError> {
        let appointment = self
            .store
            .cancel(appointment_id, patient_id, auth_token)
            .await?;

        Ok(AppointmentView {
            appointment,
            doctor: None,
        })
    }
}
