// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::models::Doctor;

// ==============================================================================
// SLOT MODEL
// ==============================================================================

/// The fixed set of bookable time labels per day. Slots are an enumerated
/// label set, not generated from working hours.
pub const SLOT_TIMES: [&str; 12] = [
    "10:00 AM", "10:30 AM", "11:00 AM", "11:30 AM", "12:00 PM", "12:30 PM",
    "02:00 PM", "02:30 PM", "03:00 PM", "03:30 PM", "04:00 PM", "04:30 PM",
];

/// A validated slot label drawn from `SLOT_TIMES`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotTime(String);

impl SlotTime {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SlotTime {
    type Error = AppointmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if SLOT_TIMES.contains(&value.as_str()) {
            Ok(SlotTime(value))
        } else {
            Err(AppointmentError::InvalidSlotTime(value))
        }
    }
}

impl FromStr for SlotTime {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SlotTime::try_from(s.to_string())
    }
}

impl From<SlotTime> for String {
    fn from(value: SlotTime) -> Self {
        value.0
    }
}

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Timezone-free calendar day, transmitted as YYYY-MM-DD.
    pub slot_date: NaiveDate,
    pub slot_time: SlotTime,
    pub status: AppointmentStatus,
    pub complaint: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Reachable-but-unused initial alternative to `upcoming`, reserved for
    /// pre-authorization flows.
    Pending,
    Upcoming,
    Completed,
    Canceled,
}

impl AppointmentStatus {
    /// Non-terminal statuses still occupy the slot's uniqueness constraint.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Canceled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Pending => write!(f, "pending"),
            AppointmentStatus::Upcoming => write!(f, "upcoming"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Canceled => write!(f, "canceled"),
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = AppointmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "upcoming" => Ok(AppointmentStatus::Upcoming),
            "completed" => Ok(AppointmentStatus::Completed),
            "canceled" => Ok(AppointmentStatus::Canceled),
            other => Err(AppointmentError::InvalidStatusFilter(other.to_string())),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Booking request body. Fields are optional at the serde level so that
/// missing ones fail with an explicit 400 from the orchestrator's validation
/// rather than a body-decode rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Option<Uuid>,
    #[serde(alias = "slotDate")]
    pub slot_date: Option<String>,
    #[serde(alias = "slotTime")]
    pub slot_time: Option<String>,
    pub complaint: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyAppointmentsQuery {
    pub status: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Doctor display fields denormalized onto booking responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub full_name: String,
    pub speciality: String,
    pub avatar_url: Option<String>,
}

impl From<&Doctor> for DoctorSummary {
    fn from(doctor: &Doctor) -> Self {
        Self {
            full_name: doctor.full_name.clone(),
            speciality: doctor.speciality.clone(),
            avatar_url: doctor.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid slot date: {0}")]
    InvalidDate(String),

    #[error("Invalid slot time: {0}")]
    InvalidSlotTime(String),

    #[error("Invalid status filter: {0}")]
    InvalidStatusFilter(String),

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Doctor is not available for booking")]
    DoctorUnavailable,

    #[error("Slot already booked")]
    SlotTaken,

    #[error("Appointment not found")]
    NotFound,

    #[error("Invalid status transition from {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Database error: {0}")]
    Database(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_accepts_enumerated_labels() {
        for label in SLOT_TIMES {
            let slot: SlotTime = label.parse().unwrap();
            assert_eq!(slot.as_str(), label);
        }
    }

    #[test]
    fn slot_time_rejects_unknown_labels() {
        for label in ["9:00 AM", "10:00", "13:00 PM", "", "10:15 AM"] {
            assert!(label.parse::<SlotTime>().is_err(), "{label} should be rejected");
        }
    }

    #[test]
    fn slot_time_serde_round_trip() {
        let slot: SlotTime = serde_json::from_str("\"10:00 AM\"").unwrap();
        assert_eq!(slot.as_str(), "10:00 AM");
        assert_eq!(serde_json::to_string(&slot).unwrap(), "\"10:00 AM\"");

        assert!(serde_json::from_str::<SlotTime>("\"midnight\"").is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Upcoming.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Canceled.is_terminal());
    }

    #[test]
    fn slot_date_is_timezone_free() {
        // The same wire value parses to the same calendar day no matter what
        // offset the client lives in.
        let date: NaiveDate = serde_json::from_str("\"2025-03-10\"").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2025-03-10\"");
    }

    #[test]
    fn status_filter_parsing() {
        assert_eq!("upcoming".parse::<AppointmentStatus>().unwrap(), AppointmentStatus::Upcoming);
        assert!(matches!(
            "scheduled".parse::<AppointmentStatus>(),
            Err(AppointmentError::InvalidStatusFilter(_))
        ));
    }

    #[test]
    fn booking_request_accepts_camel_case_aliases() {
        let request: BookAppointmentRequest = serde_json::from_str(
            r#"{"doctorId":"1e9f8c6e-5b7a-4f3d-9c2b-8a1d0e4f6a2b","slotDate":"2025-06-01","slotTime":"10:00 AM"}"#,
        )
        .unwrap();
        assert!(request.doctor_id.is_some());
        assert_eq!(request.slot_date.as_deref(), Some("2025-06-01"));
        assert_eq!(request.slot_time.as_deref(), Some("10:00 AM"));
        assert!(request.complaint.is_none());
    }
}
