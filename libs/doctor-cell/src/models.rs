// libs/doctor-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// DOCTOR + AVAILABILITY LEDGER MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub full_name: String,
    pub speciality: String,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub availability_status: AvailabilityStatus,
    pub available_slots: i32,
    pub availability_reason: Option<String>,
    pub expected_back_time: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Doctor {
    /// Single source of truth for bookability, used by the conflict guard and
    /// by any UI affordance alike.
    pub fn is_bookable(&self) -> bool {
        self.is_active
            && self.availability_status == AvailabilityStatus::Available
            && self.available_slots > 0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    Available,
    TemporarilyUnavailable,
    OnLeave,
    Busy,
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AvailabilityStatus::Available => write!(f, "available"),
            AvailabilityStatus::TemporarilyUnavailable => write!(f, "temporarily_unavailable"),
            AvailabilityStatus::OnLeave => write!(f, "on_leave"),
            AvailabilityStatus::Busy => write!(f, "busy"),
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DoctorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(AvailabilityStatus::Available),
            "temporarily_unavailable" => Ok(AvailabilityStatus::TemporarilyUnavailable),
            "on_leave" => Ok(AvailabilityStatus::OnLeave),
            "busy" => Ok(AvailabilityStatus::Busy),
            other => Err(DoctorError::InvalidStatus(other.to_string())),
        }
    }
}

impl AvailabilityStatus {
    /// Slots adopted by an availability change: a non-available status always
    /// zeroes the counter, `available` adopts the requested count clamped ≥ 0.
    pub fn resolve_slots(&self, requested: Option<i32>) -> i32 {
        match self {
            AvailabilityStatus::Available => requested.unwrap_or(0).max(0),
            _ => 0,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Admin request to change a doctor's availability. `status` arrives as a raw
/// string so unknown values fail with a 400 rather than a body-decode error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetAvailabilityRequest {
    pub status: String,
    pub reason: Option<String>,
    pub expected_back_time: Option<DateTime<Utc>>,
    pub available_slots: Option<i32>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid availability status: {0}")]
    InvalidStatus(String),

    #[error("Doctor record was modified concurrently")]
    ConcurrentUpdate,

    #[error("Database error: {0}")]
    Database(String),
}
