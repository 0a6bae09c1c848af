//! Panel domain types and the business-day calendar.

pub mod calendar;
pub mod panel;

pub use panel::{Panel, PanelError};
