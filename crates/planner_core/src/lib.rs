pub mod calendar;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod session;
pub mod status;
pub mod storage;
pub mod store;
pub mod timefmt;
pub mod week_view;
