pub mod budget_service;
pub mod stats_service;
pub mod trend_service;
