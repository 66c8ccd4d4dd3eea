use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::model::{
    Assignment, DispatchOrder, Driver, DriverId, DriverStatus, FleetScenario, OrderId, OrderStatus,
    short_id,
};
use crate::notifications::{NotificationFeed, NotificationKind};

/// Tunables for the position-update loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionParams {
    /// Plane units a busy driver moves per tick.
    pub step: f64,
    /// Distance below which a driver has arrived at its order.
    pub arrival_threshold: f64,
    /// Earnings credited to a driver on delivery.
    pub completion_bonus: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            step: 0.3,
            arrival_threshold: 1.0,
            completion_bonus: 25.0,
        }
    }
}

/// Everything that can change fleet state. Events are applied one at a time
/// by [`Dispatcher::next`].
#[derive(Debug, Clone, PartialEq)]
pub enum FleetEvent {
    /// Replace the whole fleet with a freshly generated scenario.
    LoadScenario(FleetScenario),
    /// Advance every busy driver one step toward its order.
    Tick,
    /// A driver reached its order's drop-off point.
    DeliveryCompleted { driver_id: DriverId, order_id: OrderId },
    ApplyAssignments(Vec<Assignment>),
    ApproveDriver(DriverId),
    RejectDriver(DriverId),
    ResolveDispute(OrderId),
}

/// Result of applying a batch of assignments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentReport {
    pub applied: Vec<Assignment>,
    pub rejected: Vec<Assignment>,
}

/// Drivers, orders and the dispatch notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fleet {
    pub drivers: Vec<Driver>,
    pub orders: Vec<DispatchOrder>,
    pub notifications: NotificationFeed,
    pub motion: MotionParams,
    /// Number of deliveries completed since the scenario was loaded.
    pub deliveries: u32,
}

impl Fleet {
    pub fn new(motion: MotionParams, notification_limit: usize) -> Self {
        Self {
            drivers: Vec::new(),
            orders: Vec::new(),
            notifications: NotificationFeed::capped(notification_limit),
            motion,
            deliveries: 0,
        }
    }

    pub fn driver(&self, id: &str) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == id)
    }

    pub fn order(&self, id: &str) -> Option<&DispatchOrder> {
        self.orders.iter().find(|o| o.id == id)
    }

    pub fn busy_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|d| d.status == DriverStatus::Busy)
            .count()
    }

    pub fn online_count(&self) -> usize {
        self.drivers
            .iter()
            .filter(|d| d.status != DriverStatus::Offline)
            .count()
    }

    pub fn pending_orders(&self) -> impl Iterator<Item = &DispatchOrder> {
        self.orders.iter().filter(|o| o.status == OrderStatus::Pending)
    }

    pub fn pending_approvals(&self) -> impl Iterator<Item = &Driver> {
        self.drivers
            .iter()
            .filter(|d| d.status == DriverStatus::PendingApproval)
    }

    pub fn disputes(&self) -> impl Iterator<Item = &DispatchOrder> {
        self.orders.iter().filter(|o| o.status == OrderStatus::Disputed)
    }

    /// Checks the busy/assigned cross-reference invariants.
    pub fn is_consistent(&self) -> bool {
        let busy_ok = self.drivers.iter().all(|d| match (d.status, &d.active_order_id) {
            (DriverStatus::Busy, Some(order_id)) => self
                .order(order_id)
                .is_some_and(|o| o.status != OrderStatus::Delivered),
            (DriverStatus::Busy, None) => false,
            _ => true,
        });
        let assigned_ok = self
            .orders
            .iter()
            .filter(|o| o.status == OrderStatus::Assigned)
            .all(|o| o.assigned_driver_id.is_some());
        busy_ok && assigned_ok
    }
}

/// Applies [`FleetEvent`]s to a [`Fleet`].
pub struct Dispatcher;

impl Dispatcher {
    /// Apply one event and return the follow-up events it produced.
    ///
    /// Follow-ups are never applied here; the caller queues them so that a
    /// tick cannot mutate the collections it is iterating over.
    pub fn next(fleet: &mut Fleet, event: FleetEvent) -> Vec<FleetEvent> {
        match event {
            FleetEvent::LoadScenario(scenario) => {
                Self::load(fleet, scenario);
                Vec::new()
            }
            FleetEvent::Tick => Self::tick(fleet),
            FleetEvent::DeliveryCompleted {
                driver_id,
                order_id,
            } => {
                Self::complete_delivery(fleet, &driver_id, &order_id);
                Vec::new()
            }
            FleetEvent::ApplyAssignments(assignments) => {
                let report = Self::apply_assignments(fleet, assignments);
                info!(
                    applied = report.applied.len(),
                    rejected = report.rejected.len(),
                    "assignment batch applied"
                );
                Vec::new()
            }
            FleetEvent::ApproveDriver(id) => {
                if !Self::approve_driver(fleet, &id) {
                    warn!(driver_id = %id, "no pending application to approve");
                }
                Vec::new()
            }
            FleetEvent::RejectDriver(id) => {
                if !Self::reject_driver(fleet, &id) {
                    warn!(driver_id = %id, "no pending application to reject");
                }
                Vec::new()
            }
            FleetEvent::ResolveDispute(id) => {
                if !Self::resolve_dispute(fleet, &id) {
                    warn!(order_id = %id, "no open dispute to resolve");
                }
                Vec::new()
            }
        }
    }

    fn load(fleet: &mut Fleet, mut scenario: FleetScenario) {
        let repaired = Self::reconcile(&mut scenario);
        if repaired > 0 {
            warn!(repaired, "scenario had broken driver/order links, repaired");
        }
        info!(
            drivers = scenario.drivers.len(),
            orders = scenario.orders.len(),
            "fleet scenario loaded"
        );
        fleet.drivers = scenario.drivers;
        fleet.orders = scenario.orders;
        fleet.deliveries = 0;
        fleet.notifications.notify(
            "System Updated",
            "Fleet data and pending approvals refreshed.",
            NotificationKind::Info,
        );
    }

    /// Make a scenario's cross-references hold before it replaces the fleet.
    ///
    /// A driver stays busy only if both ends are positioned and its order is
    /// open and not claimed by anyone else; the order is then marked assigned
    /// to it. Other busy drivers go idle, and assigned or picked-up orders
    /// nobody is working on go back to pending. Returns the number of
    /// records changed.
    fn reconcile(scenario: &mut FleetScenario) -> usize {
        let mut repaired = 0;
        let mut claims: HashMap<OrderId, DriverId> = HashMap::new();

        for driver in scenario.drivers.iter_mut() {
            let claim = match (driver.status, &driver.active_order_id) {
                (DriverStatus::Busy, Some(order_id)) if driver.coordinates.is_some() => {
                    let open = scenario.orders.iter().any(|o| {
                        &o.id == order_id
                            && o.coordinates.is_some()
                            && matches!(
                                o.status,
                                OrderStatus::Pending | OrderStatus::Assigned | OrderStatus::PickedUp
                            )
                            && o.assigned_driver_id.as_ref().is_none_or(|d| d == &driver.id)
                    });
                    (open && !claims.contains_key(order_id)).then(|| order_id.clone())
                }
                _ => None,
            };

            if let Some(order_id) = claim {
                claims.insert(order_id, driver.id.clone());
            } else if driver.status == DriverStatus::Busy || driver.active_order_id.is_some() {
                debug!(driver = %driver.name, "driver has no deliverable order");
                if driver.status == DriverStatus::Busy {
                    driver.status = DriverStatus::Idle;
                }
                driver.active_order_id = None;
                repaired += 1;
            }
        }

        for order in scenario.orders.iter_mut() {
            match claims.get(&order.id) {
                Some(driver_id) => {
                    let status = match order.status {
                        OrderStatus::PickedUp => OrderStatus::PickedUp,
                        _ => OrderStatus::Assigned,
                    };
                    if order.status != status || order.assigned_driver_id.as_ref() != Some(driver_id) {
                        order.status = status;
                        order.assigned_driver_id = Some(driver_id.clone());
                        repaired += 1;
                    }
                }
                None if matches!(order.status, OrderStatus::Assigned | OrderStatus::PickedUp) => {
                    debug!(order_id = %order.id, "order has no driver, back to pending");
                    order.status = OrderStatus::Pending;
                    order.assigned_driver_id = None;
                    repaired += 1;
                }
                None => {}
            }
        }

        repaired
    }

    /// Move every busy driver one step toward its order.
    ///
    /// Orders are read from the state as it was before the tick; arrivals
    /// are reported as [`FleetEvent::DeliveryCompleted`] follow-ups.
    fn tick(fleet: &mut Fleet) -> Vec<FleetEvent> {
        let MotionParams {
            step,
            arrival_threshold,
            ..
        } = fleet.motion;
        let orders = &fleet.orders;
        let mut arrivals = Vec::new();

        for driver in fleet.drivers.iter_mut() {
            if driver.status != DriverStatus::Busy {
                continue;
            }
            let (Some(order_id), Some(position)) = (&driver.active_order_id, driver.coordinates)
            else {
                continue;
            };
            let Some(order) = orders.iter().find(|o| &o.id == order_id) else {
                continue;
            };
            if order.status == OrderStatus::Delivered {
                continue;
            }
            let Some(target) = order.coordinates else {
                continue;
            };

            if position.distance_to(target) < arrival_threshold {
                arrivals.push(FleetEvent::DeliveryCompleted {
                    driver_id: driver.id.clone(),
                    order_id: order.id.clone(),
                });
            } else {
                driver.coordinates = Some(position.step_toward(target, step));
            }
        }

        arrivals
    }

    /// Mark the order delivered and free the driver, at most once per order.
    fn complete_delivery(fleet: &mut Fleet, driver_id: &str, order_id: &str) -> bool {
        let Some(order_idx) = fleet.orders.iter().position(|o| o.id == order_id) else {
            warn!(order_id, "completion for unknown order");
            return false;
        };
        if fleet.orders[order_idx].status == OrderStatus::Delivered {
            debug!(order_id, "order already delivered, ignoring duplicate completion");
            return false;
        }
        let Some(driver) = fleet.drivers.iter_mut().find(|d| d.id == driver_id) else {
            warn!(driver_id, "completion for unknown driver");
            return false;
        };
        if driver.status != DriverStatus::Busy || driver.active_order_id.as_deref() != Some(order_id)
        {
            debug!(driver_id, order_id, "driver no longer on this order, ignoring completion");
            return false;
        }

        let order = &mut fleet.orders[order_idx];
        order.status = OrderStatus::Delivered;
        driver.status = DriverStatus::Idle;
        driver.active_order_id = None;
        driver.earnings += fleet.motion.completion_bonus;
        fleet.deliveries += 1;

        info!(driver = %driver.name, order_id, earnings = driver.earnings, "delivery completed");
        let message = format!("{} delivered Order #{}", driver.name, short_id(order_id));
        fleet
            .notifications
            .notify("Delivery Complete", message, NotificationKind::Success);
        true
    }

    fn apply_assignments(fleet: &mut Fleet, assignments: Vec<Assignment>) -> AssignmentReport {
        let mut report = AssignmentReport::default();
        let mut used_drivers: HashSet<DriverId> = HashSet::new();
        let mut used_orders: HashSet<OrderId> = HashSet::new();

        for assignment in assignments {
            let order_idx = fleet.orders.iter().position(|o| {
                o.id == assignment.order_id
                    && o.status == OrderStatus::Pending
                    && o.coordinates.is_some()
            });
            let driver_idx = fleet
                .drivers
                .iter()
                .position(|d| d.id == assignment.driver_id && d.status == DriverStatus::Idle);

            let (Some(order_idx), Some(driver_idx)) = (order_idx, driver_idx) else {
                warn!(
                    order_id = %assignment.order_id,
                    driver_id = %assignment.driver_id,
                    "rejecting assignment: order not pending or driver not idle"
                );
                report.rejected.push(assignment);
                continue;
            };
            if used_drivers.contains(&assignment.driver_id)
                || used_orders.contains(&assignment.order_id)
            {
                warn!(
                    order_id = %assignment.order_id,
                    driver_id = %assignment.driver_id,
                    "rejecting duplicate assignment in batch"
                );
                report.rejected.push(assignment);
                continue;
            }

            let order = &mut fleet.orders[order_idx];
            order.status = OrderStatus::Assigned;
            order.assigned_driver_id = Some(assignment.driver_id.clone());
            let driver = &mut fleet.drivers[driver_idx];
            driver.status = DriverStatus::Busy;
            driver.active_order_id = Some(assignment.order_id.clone());

            info!(order_id = %assignment.order_id, driver = %driver.name, "order dispatched");
            let message = format!(
                "Order #{} assigned to {}",
                short_id(&assignment.order_id),
                driver.name
            );
            fleet
                .notifications
                .notify("Order Dispatched", message, NotificationKind::Success);

            used_drivers.insert(assignment.driver_id.clone());
            used_orders.insert(assignment.order_id.clone());
            report.applied.push(assignment);
        }

        if !report.rejected.is_empty() {
            let message = format!(
                "{} of {} assignments could not be applied.",
                report.rejected.len(),
                report.applied.len() + report.rejected.len()
            );
            fleet
                .notifications
                .notify("Dispatch Rejected", message, NotificationKind::Warning);
        }

        report
    }

    fn approve_driver(fleet: &mut Fleet, id: &str) -> bool {
        let Some(driver) = fleet
            .drivers
            .iter_mut()
            .find(|d| d.id == id && d.status == DriverStatus::PendingApproval)
        else {
            return false;
        };
        driver.status = DriverStatus::Idle;
        fleet.notifications.notify(
            "Admin Action",
            "Driver approved successfully.",
            NotificationKind::Success,
        );
        true
    }

    fn reject_driver(fleet: &mut Fleet, id: &str) -> bool {
        let before = fleet.drivers.len();
        fleet
            .drivers
            .retain(|d| !(d.id == id && d.status == DriverStatus::PendingApproval));
        if fleet.drivers.len() == before {
            return false;
        }
        fleet
            .notifications
            .notify("Admin Action", "Driver application rejected.", NotificationKind::Warning);
        true
    }

    fn resolve_dispute(fleet: &mut Fleet, id: &str) -> bool {
        let before = fleet.orders.len();
        fleet
            .orders
            .retain(|o| !(o.id == id && o.status == OrderStatus::Disputed));
        if fleet.orders.len() == before {
            return false;
        }
        fleet.notifications.notify(
            "Admin Action",
            "Dispute resolved and archived.",
            NotificationKind::Success,
        );
        true
    }

    /// Apply a batch of assignments and report which ones took effect.
    pub fn assign(fleet: &mut Fleet, assignments: Vec<Assignment>) -> AssignmentReport {
        Self::apply_assignments(fleet, assignments)
    }
}
