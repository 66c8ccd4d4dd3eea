//! Driver shift ledger: gig jobs, derived statistics and route reordering.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Settings;

/// IRS standard mileage rate used for deductions, in dollars per mile.
pub const IRS_MILEAGE_RATE: f64 = 0.67;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    UberEats,
    DoorDash,
    GrubHub,
    #[serde(other)]
    Other,
}

impl Platform {
    /// Lenient name match used for screenshot extraction.
    pub fn from_label(label: &str) -> Self {
        let normalized: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "ubereats" | "uber" => Platform::UberEats,
            "doordash" | "dasher" => Platform::DoorDash,
            "grubhub" => Platform::GrubHub,
            _ => Platform::Other,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::UberEats => write!(f, "UberEats"),
            Platform::DoorDash => write!(f, "DoorDash"),
            Platform::GrubHub => write!(f, "GrubHub"),
            Platform::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
}

/// One accepted gig delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(default = "new_job_id")]
    pub id: String,
    pub platform: Platform,
    #[serde(default)]
    pub restaurant: String,
    pub pay: f64,
    /// Trip length in miles.
    pub distance: f64,
    #[serde(default)]
    pub address: String,
    #[serde(default = "active")]
    pub status: JobStatus,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// 1-10 score from the intelligence service.
    #[serde(default)]
    pub profit_score: Option<u8>,
    /// Minutes.
    #[serde(default)]
    pub estimated_time: Option<u32>,
}

fn new_job_id() -> String {
    Uuid::new_v4().to_string()
}

fn active() -> JobStatus {
    JobStatus::Active
}

impl Job {
    pub fn new(platform: Platform, restaurant: impl Into<String>, pay: f64, distance: f64) -> Self {
        Self {
            id: new_job_id(),
            platform,
            restaurant: restaurant.into(),
            pay,
            distance,
            address: String::new(),
            status: JobStatus::Active,
            timestamp: Utc::now(),
            profit_score: None,
            estimated_time: None,
        }
    }

    /// Pay per mile, or 0 for zero-length trips.
    pub fn pay_per_mile(&self) -> f64 {
        if self.distance > 0.0 {
            self.pay / self.distance
        } else {
            0.0
        }
    }
}

/// Aggregate numbers for the current shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShiftStats {
    pub total_earnings: f64,
    pub total_miles: f64,
    pub jobs_completed: usize,
    pub active_hours: f64,
    pub profit_per_hour: f64,
    /// Mileage deduction at the IRS rate.
    pub mileage_deduction: f64,
    pub estimated_tax: f64,
}

impl ShiftStats {
    pub fn compute(jobs: &[Job], tracked_miles: f64, active_hours: f64, settings: &Settings) -> Self {
        let completed = jobs.iter().filter(|j| j.status == JobStatus::Completed);
        let (total_earnings, jobs_completed) =
            completed.fold((0.0, 0), |(sum, count), job| (sum + job.pay, count + 1));
        let profit_per_hour = if active_hours > 0.0 {
            total_earnings / active_hours
        } else {
            0.0
        };

        Self {
            total_earnings,
            total_miles: tracked_miles,
            jobs_completed,
            active_hours,
            profit_per_hour,
            mileage_deduction: tracked_miles * IRS_MILEAGE_RATE,
            estimated_tax: total_earnings * settings.tax_rate / 100.0,
        }
    }
}

/// Reorder jobs after a route optimization.
///
/// Active jobs follow `ordered_ids`; ids that match no active job are
/// ignored, active jobs missing from the list keep their relative order at
/// the end, and non-active jobs come last.
pub fn apply_route_order(jobs: Vec<Job>, ordered_ids: &[String]) -> Vec<Job> {
    let (mut active, rest): (Vec<Job>, Vec<Job>) =
        jobs.into_iter().partition(|j| j.status == JobStatus::Active);

    let mut ordered = Vec::with_capacity(active.len() + rest.len());
    let mut seen = HashSet::new();
    for id in ordered_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some(idx) = active.iter().position(|j| &j.id == id) {
            ordered.push(active.remove(idx));
        }
    }
    ordered.extend(active);
    ordered.extend(rest);
    ordered
}
