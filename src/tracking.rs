//! Live mileage tracking fed by a location source.
//!
//! The location source is anything that can push [`GeoFix`]es into an mpsc
//! channel. A source that never produces (no hardware, permission denied)
//! leaves the total at zero rather than failing.

use anyhow::{Context, Result, bail};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::geo::{FixOutcome, GeoFix, MileageTracker};

/// Handle to a running mileage watch.
pub struct MileageWatch {
    total: watch::Receiver<f64>,
    handle: JoinHandle<MileageTracker>,
    cancel: CancellationToken,
}

impl MileageWatch {
    /// Start consuming fixes from `fixes` on the current runtime.
    pub fn spawn(jitter_threshold: f64, mut fixes: mpsc::Receiver<GeoFix>, cancel: CancellationToken) -> Self {
        let (total_tx, total_rx) = watch::channel(0.0);
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            let mut tracker = MileageTracker::new(jitter_threshold);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    fix = fixes.recv() => {
                        let Some(fix) = fix else {
                            debug!("location source closed");
                            break;
                        };
                        if let FixOutcome::Accepted { miles } = tracker.record(fix) {
                            debug!(miles, total = tracker.total_miles(), "fix accepted");
                            total_tx.send_replace(tracker.total_miles());
                        }
                    }
                }
            }
            info!(total_miles = tracker.total_miles(), "mileage watch stopped");
            tracker
        });

        Self {
            total: total_rx,
            handle,
            cancel,
        }
    }

    /// Latest accumulated total in miles.
    pub fn total_miles(&self) -> f64 {
        *self.total.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<f64> {
        self.total.clone()
    }

    /// Stop the watch and return the final tracker state.
    pub async fn stop(self) -> Result<MileageTracker> {
        self.cancel.cancel();
        self.handle.await.context("mileage watch task panicked")
    }

    /// Wait for the location source to close on its own.
    pub async fn join(self) -> Result<MileageTracker> {
        self.handle.await.context("mileage watch task panicked")
    }
}

/// Parse a `lat,lon` line. Blank lines and `#` comments yield `None`.
pub fn parse_fix_line(line: &str) -> Result<Option<GeoFix>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let Some((lat, lon)) = line.split_once(',') else {
        bail!("expected `lat,lon`, got `{line}`");
    };
    let lat: f64 = lat.trim().parse().with_context(|| format!("invalid latitude in `{line}`"))?;
    let lon: f64 = lon.trim().parse().with_context(|| format!("invalid longitude in `{line}`"))?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        bail!("coordinates out of range: `{line}`");
    }
    Ok(Some(GeoFix::new(lat, lon)))
}
