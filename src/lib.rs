pub mod clock;
pub mod config;
pub mod database;
pub mod errors;
pub mod store;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use errors::AppError;
pub use store::CampaignStore;
