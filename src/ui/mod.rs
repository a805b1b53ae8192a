//! Widgets of the monitor window.

pub mod charts;
pub mod summary;
pub mod theme;
