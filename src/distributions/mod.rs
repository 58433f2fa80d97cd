pub mod crediting_service;
pub mod distributions_errors;
pub mod distributions_model;
pub mod distributions_repository;
pub mod distributions_traits;
pub mod feed_source;

pub use crediting_service::DividendCreditingService;
pub use distributions_errors::*;
pub use distributions_model::*;
pub use distributions_repository::CreditedDistributionRepository;
pub use distributions_traits::*;
pub use feed_source::FeedAnnouncementSource;
