use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Point;

pub type DriverId = String;
pub type OrderId = String;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Availability of a driver in the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverStatus {
    Idle,
    Busy,
    Offline,
    PendingApproval,
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverStatus::Idle => write!(f, "idle"),
            DriverStatus::Busy => write!(f, "busy"),
            DriverStatus::Offline => write!(f, "offline"),
            DriverStatus::PendingApproval => write!(f, "pending_approval"),
        }
    }
}

/// Lifecycle of a dispatch order.
///
/// pending → assigned → (picked_up) → delivered, with `disputed` as a side
/// branch resolved by an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
    PickedUp,
    Delivered,
    Disputed,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Assigned => write!(f, "assigned"),
            OrderStatus::PickedUp => write!(f, "picked_up"),
            OrderStatus::Delivered => write!(f, "delivered"),
            OrderStatus::Disputed => write!(f, "disputed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    #[serde(default = "new_id")]
    pub id: DriverId,
    pub name: String,
    pub status: DriverStatus,
    #[serde(default)]
    pub current_location: String,
    #[serde(default)]
    pub coordinates: Option<Point>,
    #[serde(default)]
    pub active_order_id: Option<OrderId>,
    #[serde(default)]
    pub earnings: f64,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl Driver {
    pub fn new(name: impl Into<String>, status: DriverStatus, coordinates: Option<Point>) -> Self {
        Self {
            id: new_id(),
            name: name.into(),
            status,
            current_location: String::new(),
            coordinates,
            active_order_id: None,
            earnings: 0.0,
            rating: None,
        }
    }

    /// Whether the driver can take part in dispatch at all.
    pub fn is_available(&self) -> bool {
        !matches!(self.status, DriverStatus::Offline | DriverStatus::PendingApproval)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOrder {
    #[serde(default = "new_id")]
    pub id: OrderId,
    pub customer: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Point>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default = "pending")]
    pub status: OrderStatus,
    #[serde(default)]
    pub assigned_driver_id: Option<DriverId>,
    #[serde(default)]
    pub items: Vec<String>,
}

fn pending() -> OrderStatus {
    OrderStatus::Pending
}

impl DispatchOrder {
    pub fn new(customer: impl Into<String>, amount: f64, coordinates: Option<Point>) -> Self {
        Self {
            id: new_id(),
            customer: customer.into(),
            address: String::new(),
            coordinates,
            amount,
            status: OrderStatus::Pending,
            assigned_driver_id: None,
            items: Vec::new(),
        }
    }

    /// First four characters of the id, as shown in notifications.
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    match id.char_indices().nth(4) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

/// One order-to-driver match produced by a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub order_id: OrderId,
    pub driver_id: DriverId,
}

impl Assignment {
    pub fn new(order_id: impl Into<OrderId>, driver_id: impl Into<DriverId>) -> Self {
        Self {
            order_id: order_id.into(),
            driver_id: driver_id.into(),
        }
    }
}

/// Drivers and orders making up one fleet snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetScenario {
    #[serde(default)]
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub orders: Vec<DispatchOrder>,
}
