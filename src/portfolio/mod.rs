pub mod portfolio_model;
pub mod valuation_service;

pub use portfolio_model::*;
pub use valuation_service::PortfolioService;
