//! Terminal output: a spinner for running simulations and styled summaries.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::fleet::{DriverStatus, Fleet, OrderStatus};
use crate::intelligence::advice::{
    DeliveryVerification, EarningsAnalysis, EarningsForecast, OfferRecommendation, Recommendation,
    StackAnalysis,
};
use crate::notifications::{NotificationFeed, NotificationKind};
use crate::shift::{Job, ShiftStats};
use crate::triage::{Offer, OfferMetrics};

/// Spinner shown while the fleet simulation runs.
pub struct SimulationProgress {
    pb: ProgressBar,
    delivered: u32,
    green: Style,
    yellow: Style,
}

impl SimulationProgress {
    pub fn start(label: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(label.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self {
            pb,
            delivered: 0,
            green: Style::new().green().bold(),
            yellow: Style::new().yellow(),
        }
    }

    /// Refresh the spinner from a fleet snapshot.
    pub fn update(&mut self, fleet: &Fleet) {
        if fleet.deliveries > self.delivered {
            if let Some(latest) = fleet.notifications.latest() {
                self.pb
                    .println(format!("  {} {}", self.yellow.apply_to("→"), latest.message));
            }
            self.delivered = fleet.deliveries;
        }
        self.pb.set_message(format!(
            "{} busy · {} delivered · {} pending",
            fleet.busy_count(),
            fleet.deliveries,
            fleet.pending_orders().count()
        ));
    }

    pub fn finish(&self, settled: bool) {
        self.pb.finish_and_clear();
        if settled {
            println!("  {} All dispatched orders delivered", self.green.apply_to("✓"));
        } else {
            println!("  {} Stopped before every order was delivered", self.yellow.apply_to("!"));
        }
    }
}

fn heading(text: &str) {
    println!();
    println!("{}", Style::new().cyan().bold().apply_to(format!("─── {text} ───")));
}

pub fn print_fleet(fleet: &Fleet) {
    heading("Drivers");
    for d in &fleet.drivers {
        let style = match d.status {
            DriverStatus::Idle => Style::new().green(),
            DriverStatus::Busy => Style::new().yellow(),
            DriverStatus::Offline => Style::new().dim(),
            DriverStatus::PendingApproval => Style::new().magenta(),
        };
        println!(
            "  {:<16} {:<18} ${:>7.2}",
            d.name,
            style.apply_to(d.status.to_string()),
            d.earnings
        );
    }

    heading("Orders");
    for o in &fleet.orders {
        let style = match o.status {
            OrderStatus::Delivered => Style::new().green(),
            OrderStatus::Disputed => Style::new().red(),
            OrderStatus::Pending => Style::new().dim(),
            OrderStatus::Assigned | OrderStatus::PickedUp => Style::new().yellow(),
        };
        println!(
            "  #{:<6} {:<16} {:<12} ${:>6.2}",
            o.short_id(),
            o.customer,
            style.apply_to(o.status.to_string()),
            o.amount
        );
    }

    print_notifications(&fleet.notifications);
}

pub fn print_notifications(feed: &NotificationFeed) {
    if feed.is_empty() {
        return;
    }
    heading("Notifications");
    for n in feed.items() {
        let style = match n.kind {
            NotificationKind::Success => Style::new().green(),
            NotificationKind::Warning => Style::new().yellow(),
            NotificationKind::Error => Style::new().red(),
            NotificationKind::Info => Style::new().cyan(),
        };
        println!("  {} {}", style.apply_to(&n.title), n.message);
    }
}

pub fn print_offer(offer: &Offer, metrics: &OfferMetrics, recommendation: Option<&OfferRecommendation>) {
    heading("Offer");
    println!(
        "  ${:.2} for {:.1} mi, ~{:.0} min",
        offer.pay, offer.distance, offer.estimated_minutes
    );
    println!("  $/mile   {:>8.2}", metrics.dollars_per_mile);
    println!("  $/hour   {:>8.2}", metrics.dollars_per_hour);
    println!("  net      {:>8.2}", metrics.net_profit);
    if metrics.high_value {
        println!("  {}", Style::new().green().bold().apply_to("★ High value order"));
    }
    if let Some(rec) = recommendation {
        let style = match rec.recommendation {
            Recommendation::Take => Style::new().green().bold(),
            Recommendation::Stack => Style::new().yellow().bold(),
            Recommendation::Decline => Style::new().red().bold(),
        };
        println!("  {} {}", style.apply_to(format!("{:?}", rec.recommendation)), rec.reasoning);
    }
}

pub fn print_route(jobs: &[Job], order: &[String]) {
    heading("Route");
    for (i, id) in order.iter().enumerate() {
        if let Some(job) = jobs.iter().find(|j| &j.id == id) {
            println!(
                "  {}. {:<20} ${:>6.2} {:>5.1} mi  ${:.2}/mi",
                i + 1,
                job.restaurant,
                job.pay,
                job.distance,
                job.pay_per_mile()
            );
        }
    }
}

pub fn print_stack(stack: &StackAnalysis) {
    heading("Stack");
    println!("  jobs     {}", stack.recommended_job_ids.join(", "));
    println!(
        "  total    ${:.2} over {:.1} mi ({:?})",
        stack.total_projected_pay, stack.total_distance, stack.efficiency_rating
    );
    println!("  {}", stack.reasoning);
    println!("  {} {}", Style::new().yellow().apply_to("tip:"), stack.strategy_tip);
}

pub fn print_mileage(miles: f64, accepted: u64, discarded: u64) {
    heading("Mileage");
    println!("  {miles:.3} mi from {accepted} moves ({discarded} fixes discarded)");
}

pub fn print_shift(stats: &ShiftStats) {
    heading("Shift");
    println!("  earnings {:>9.2}  ({} jobs)", stats.total_earnings, stats.jobs_completed);
    println!("  miles    {:>9.1}", stats.total_miles);
    println!("  $/hour   {:>9.2}  over {:.1} h", stats.profit_per_hour, stats.active_hours);
    println!("  deduct   {:>9.2}", stats.mileage_deduction);
    println!("  est. tax {:>9.2}", stats.estimated_tax);
}

pub fn print_forecast(forecast: &EarningsForecast) {
    heading("Forecast");
    println!("  ${:.2}/h, peak {}", forecast.predicted_rate, forecast.peak_time);
    println!("  {}", forecast.reasoning);
}

pub fn print_analysis(analysis: &EarningsAnalysis) {
    heading("Insights");
    println!("  best hours  {}", analysis.best_hours);
    println!("  best zones  {}", analysis.best_zones.join(", "));
    println!("  top day     {}", analysis.top_performing_day);
    for share in &analysis.platform_comparison {
        println!(
            "  {:<10} ${:>8.2} {:>5.1}%",
            share.platform.to_string(),
            share.total_earnings,
            share.percentage
        );
    }
    println!("  {} {}", Style::new().yellow().apply_to("tip:"), analysis.efficiency_tip);
}

pub fn print_verification(verdict: &DeliveryVerification) {
    heading("Proof of delivery");
    let mark = if verdict.verified {
        Style::new().green().bold().apply_to("✓ verified")
    } else {
        Style::new().red().bold().apply_to("✗ rejected")
    };
    println!("  {mark} {}", verdict.reason);
}

pub fn warn(message: &str) {
    eprintln!("  {} {message}", Style::new().yellow().apply_to("!"));
}
