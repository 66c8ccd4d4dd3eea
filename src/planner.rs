//! Local heuristics used when the intelligence service is unavailable or its
//! answer could not be used.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::fleet::{Assignment, DriverStatus, Fleet};
use crate::intelligence::advice::{DispatchPlan, EfficiencyRating, StackAnalysis};
use crate::shift::{Job, JobStatus};

/// Pay per mile at or above which a job is worth stacking.
pub const STACK_MIN_RATE: f64 = 1.5;
/// Pay per mile at or above which a stack is rated high.
pub const HIGH_EFFICIENCY_RATE: f64 = 2.0;

fn by_value(a: &Job, b: &Job) -> Ordering {
    b.pay_per_mile()
        .total_cmp(&a.pay_per_mile())
        .then_with(|| a.distance.total_cmp(&b.distance))
}

/// Active job ids, highest pay per mile first; ties go to the shorter trip.
pub fn plan_route(jobs: &[Job]) -> Vec<String> {
    let mut active: Vec<&Job> = jobs.iter().filter(|j| j.status == JobStatus::Active).collect();
    active.sort_by(|a, b| by_value(a, b));
    active.into_iter().map(|j| j.id.clone()).collect()
}

/// Jobs at or above [`STACK_MIN_RATE`], or the single best job when none
/// qualifies. `None` for an empty candidate list.
pub fn plan_stack(jobs: &[Job]) -> Option<StackAnalysis> {
    let mut ranked: Vec<&Job> = jobs.iter().collect();
    ranked.sort_by(|a, b| by_value(a, b));
    let best = *ranked.first()?;

    let mut chosen: Vec<&Job> = ranked
        .iter()
        .copied()
        .filter(|j| j.pay_per_mile() >= STACK_MIN_RATE)
        .collect();
    let fallback = chosen.is_empty();
    if fallback {
        chosen.push(best);
    }

    let total_pay: f64 = chosen.iter().map(|j| j.pay).sum();
    let total_distance: f64 = chosen.iter().map(|j| j.distance).sum();
    let rate = if total_distance > 0.0 {
        total_pay / total_distance
    } else {
        0.0
    };
    let efficiency_rating = if rate >= HIGH_EFFICIENCY_RATE {
        EfficiencyRating::High
    } else if rate >= STACK_MIN_RATE {
        EfficiencyRating::Medium
    } else {
        EfficiencyRating::Low
    };

    let reasoning = if fallback {
        format!(
            "No job reaches ${STACK_MIN_RATE:.2}/mi; {} at ${:.2}/mi is the best available.",
            best.restaurant,
            best.pay_per_mile()
        )
    } else {
        format!(
            "{} of {} jobs pay at least ${STACK_MIN_RATE:.2}/mi, averaging ${rate:.2}/mi together.",
            chosen.len(),
            jobs.len()
        )
    };

    Some(StackAnalysis {
        recommended_job_ids: chosen.iter().map(|j| j.id.clone()).collect(),
        reasoning,
        total_projected_pay: total_pay,
        total_distance,
        efficiency_rating,
        strategy_tip: format!("Start with {}; it pays the most per mile.", best.restaurant),
    })
}

/// Greedy nearest-idle-driver matching in the dispatch plane.
///
/// Pending orders are taken in fleet order; each gets the closest idle driver
/// not already used in this plan. Orders or drivers without a position are
/// skipped.
pub fn plan_dispatch(fleet: &Fleet) -> DispatchPlan {
    let mut used: HashSet<&str> = HashSet::new();
    let mut assignments = Vec::new();

    for order in fleet.pending_orders() {
        let Some(target) = order.coordinates else {
            continue;
        };
        let nearest = fleet
            .drivers
            .iter()
            .filter(|d| d.status == DriverStatus::Idle && !used.contains(d.id.as_str()))
            .filter_map(|d| d.coordinates.map(|p| (d, p.distance_to(target))))
            .min_by(|(_, a), (_, b)| a.total_cmp(b));

        if let Some((driver, _)) = nearest {
            used.insert(driver.id.as_str());
            assignments.push(Assignment::new(order.id.clone(), driver.id.clone()));
        }
    }

    DispatchPlan { assignments }
}
