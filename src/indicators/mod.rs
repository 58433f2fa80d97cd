pub mod indicators_errors;
pub mod indicators_model;
pub mod indicators_repository;
pub mod indicators_service;
pub mod indicators_traits;
pub mod normalizer;
pub mod scraper_client;

pub use indicators_errors::*;
pub use indicators_model::*;
pub use indicators_repository::IndicatorSnapshotRepository;
pub use indicators_service::IndicatorService;
pub use indicators_traits::*;
pub use scraper_client::IndicatorScraper;
