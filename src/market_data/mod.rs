pub mod brapi_provider;
pub mod market_data_errors;
pub mod market_data_model;
pub mod market_data_service;
pub mod market_data_traits;
pub mod quote_cache;

pub use brapi_provider::BrapiProvider;
pub use market_data_errors::*;
pub use market_data_model::*;
pub use market_data_service::MarketDataService;
pub use market_data_traits::*;
pub use quote_cache::QuoteCache;
