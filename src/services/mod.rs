pub mod chart_service;
pub mod poll_service;
pub mod series_service;
pub mod window_service;
