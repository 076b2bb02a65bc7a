//! Tenant API endpoints, split into sub-modules by domain

mod assistant;
mod auth;
mod billing;
mod integrations;
mod subscription;
mod team;
mod work_orders;

pub use assistant::ask_assistant;
pub use auth::login;
pub use billing::create_checkout;
pub use integrations::connect_quickbooks;
pub use subscription::get_subscription;
pub use team::{add_team_member, list_team_members};
pub use work_orders::{create_work_order, list_work_orders};
