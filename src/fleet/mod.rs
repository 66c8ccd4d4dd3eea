mod dispatch;
mod model;
pub mod scenario;
mod sim;

pub use dispatch::{AssignmentReport, Dispatcher, Fleet, FleetEvent, MotionParams};
pub use model::{
    Assignment, DispatchOrder, Driver, DriverId, DriverStatus, FleetScenario, OrderId, OrderStatus,
};
pub use sim::{FleetSimulation, StepReport};
