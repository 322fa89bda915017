//! Dashboard module
//!
//! Provides the landing page: summary cards for the current month, the entry
//! form, the filterable transaction list and the charts. Open dashboards
//! redraw themselves when the transactions change.

mod aggregation;
mod cards;
mod charts;
mod events;
mod handlers;
mod list;

pub use events::get_dashboard_events;
pub use handlers::{get_dashboard_page, get_dashboard_transactions};
