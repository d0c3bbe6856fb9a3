//! Scenario events: scripted world changes scheduled by tick

pub mod handler;
pub mod types;

pub use handler::ScenarioEventHandler;
pub use types::{EventSchedule, EventSpec, ScenarioEvent, ScheduledEvent};
