//! Local fleet scenario generator, used when no intelligence service is
//! configured or the service returned nothing usable.

use rand::Rng;

use super::model::{DispatchOrder, Driver, DriverStatus, FleetScenario, OrderStatus};
use crate::geo::Point;

const DRIVER_NAMES: &[&str] = &["Maria Lopez", "Dev Patel", "Sam Okafor", "Lena Novak", "Tom Reyes"];
const CUSTOMERS: &[&str] = &[
    "Ava Chen",
    "Noah Kim",
    "Mia Rossi",
    "Liam Walsh",
    "Zoe Adams",
    "Eli Brooks",
    "Ivy Turner",
];
const STREETS: &[&str] = &["Main St", "Oak Ave", "Harbor Rd", "5th St", "Elm Ct", "Market St"];
const MENU: &[&str] = &["Burrito Bowl", "Pad Thai", "Pepperoni Pizza", "Sushi Combo", "Cheeseburger", "Pho"];

pub const SCENARIO_DRIVERS: usize = 4;
pub const SCENARIO_ORDERS: usize = 6;

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn random_point<R: Rng + ?Sized>(rng: &mut R) -> Point {
    Point::new(rng.random_range(10.0..=90.0), rng.random_range(10.0..=90.0))
}

/// Generate four drivers and six pending orders inside the 10-90 square.
///
/// At least one driver is idle so the scenario can always be dispatched.
pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> FleetScenario {
    let drivers = (0..SCENARIO_DRIVERS)
        .map(|i| {
            let status = if i == 0 {
                DriverStatus::Idle
            } else {
                match rng.random_range(0..4) {
                    0 => DriverStatus::Offline,
                    _ => DriverStatus::Idle,
                }
            };
            let mut driver = Driver::new(DRIVER_NAMES[i % DRIVER_NAMES.len()], status, Some(random_point(rng)));
            driver.current_location = format!("{} {}", rng.random_range(100..999), pick(rng, STREETS));
            driver.earnings = (rng.random_range(0.0..150.0_f64) * 100.0).round() / 100.0;
            driver.rating = Some((rng.random_range(3.5..=5.0_f64) * 10.0).round() / 10.0);
            driver
        })
        .collect();

    let orders = (0..SCENARIO_ORDERS)
        .map(|_| {
            let amount = (rng.random_range(8.0..35.0_f64) * 100.0).round() / 100.0;
            let mut order = DispatchOrder::new(pick(rng, CUSTOMERS), amount, Some(random_point(rng)));
            order.address = format!("{} {}", rng.random_range(100..999), pick(rng, STREETS));
            order.items = (0..rng.random_range(1..=3))
                .map(|_| pick(rng, MENU).to_string())
                .collect();
            order
        })
        .collect();

    with_admin_queue(FleetScenario { drivers, orders })
}

/// Seed the administration queue with one applicant and one dispute.
pub fn with_admin_queue(mut scenario: FleetScenario) -> FleetScenario {
    let mut applicant = Driver::new("New Guy", DriverStatus::PendingApproval, Some(Point::new(50.0, 50.0)));
    applicant.id = "d-pending-1".into();
    applicant.current_location = "Main St".into();
    applicant.rating = Some(0.0);
    scenario.drivers.push(applicant);

    let mut dispute = DispatchOrder::new("Angry Customer", 15.0, None);
    dispute.id = "o-dispute-1".into();
    dispute.address = "123 Bad Ln".into();
    dispute.status = OrderStatus::Disputed;
    dispute.items = vec!["Cold Pizza".into()];
    scenario.orders.push(dispute);

    scenario
}
