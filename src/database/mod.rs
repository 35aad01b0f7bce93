pub mod connector;
pub mod models;

pub use connector::{DB, connect, connect_with_settings, create_schema, ping};
pub use models::{customer, mailing, message, operator, tag};
