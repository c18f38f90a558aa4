mod checkin;
mod manager;
mod model;

pub use checkin::Progress;
pub use manager::{is_active, PlanManager};
pub use model::{CheckIn, NewPlan, Plan, PlanStatus};
