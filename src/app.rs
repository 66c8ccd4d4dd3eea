//! Root application state and its reducer.
//!
//! All transitions go through [`AppState::reduce`], a pure function of the
//! previous state and one [`AppEvent`]. Anything time- or id-dependent is
//! carried inside the event so the reducer stays deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::geo::{GeoFix, MileageTracker};
use crate::notifications::{Notification, NotificationFeed, NotificationKind};
use crate::shift::{Job, JobStatus, ShiftStats};
use crate::triage::is_high_value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppMode {
    #[default]
    Home,
    Shift,
    Fleet,
    Copilot,
    Live,
    Customer,
    CustomerApp,
    Analytics,
    Settings,
    Billing,
    LiveTracking,
}

impl AppMode {
    /// Modes in which location fixes count toward trip mileage.
    pub fn tracks_location(self) -> bool {
        matches!(self, AppMode::Shift | AppMode::LiveTracking)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SwitchMode(AppMode),
    AddJob(Job),
    CompleteJob(String),
    /// Replace the job list, e.g. after a route reorder.
    ReplaceJobs(Vec<Job>),
    UpdateSettings(Settings),
    Notify(Notification),
    DismissNotification(String),
    ExpireNotifications(DateTime<Utc>),
    LocationFix(GeoFix),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub mode: AppMode,
    pub jobs: Vec<Job>,
    pub settings: Settings,
    pub notifications: NotificationFeed,
    pub mileage: MileageTracker,
}

impl AppState {
    pub fn new(settings: Settings, jitter_threshold: f64) -> Self {
        Self {
            mode: AppMode::default(),
            jobs: Vec::new(),
            settings,
            notifications: NotificationFeed::unbounded(),
            mileage: MileageTracker::new(jitter_threshold),
        }
    }

    pub fn reduce(mut self, event: AppEvent) -> Self {
        match event {
            AppEvent::SwitchMode(mode) => {
                if self.mode.tracks_location() && !mode.tracks_location() {
                    self.mileage.suspend();
                }
                debug!(from = ?self.mode, to = ?mode, "mode switched");
                self.mode = mode;
            }
            AppEvent::AddJob(job) => {
                if self.settings.notifications.high_value_alerts && is_high_value(job.pay, job.distance) {
                    self.notifications.push(Notification {
                        id: format!("high-value-{}", job.id),
                        title: "High Value Order".into(),
                        message: format!(
                            "{} offer: ${:.2} for {:.1} mi",
                            job.platform, job.pay, job.distance
                        ),
                        timestamp: job.timestamp,
                        kind: NotificationKind::Success,
                    });
                }
                self.jobs.insert(0, job);
            }
            AppEvent::CompleteJob(id) => {
                if let Some(job) = self
                    .jobs
                    .iter_mut()
                    .find(|j| j.id == id && j.status != JobStatus::Completed)
                {
                    job.status = JobStatus::Completed;
                }
            }
            AppEvent::ReplaceJobs(jobs) => self.jobs = jobs,
            AppEvent::UpdateSettings(settings) => self.settings = settings,
            AppEvent::Notify(notification) => self.notifications.push(notification),
            AppEvent::DismissNotification(id) => {
                self.notifications.dismiss(&id);
            }
            AppEvent::ExpireNotifications(now) => self.notifications.expire(now),
            AppEvent::LocationFix(fix) => {
                if self.mode.tracks_location() {
                    self.mileage.record(fix);
                }
            }
        }
        self
    }

    pub fn tracked_miles(&self) -> f64 {
        self.mileage.total_miles()
    }

    pub fn stats(&self, active_hours: f64) -> ShiftStats {
        ShiftStats::compute(&self.jobs, self.tracked_miles(), active_hours, &self.settings)
    }
}
