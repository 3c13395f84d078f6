//! Balances and the analytics page.

mod aggregation;
mod page;

pub use aggregation::balance;
pub use page::{budget_endpoint, get_analytics_page};
