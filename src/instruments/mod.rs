pub mod instruments_errors;
pub mod instruments_model;
pub mod instruments_repository;
pub mod instruments_service;
pub mod instruments_traits;

pub use instruments_errors::*;
pub use instruments_model::*;
pub use instruments_repository::InstrumentRepository;
pub use instruments_service::InstrumentService;
pub use instruments_traits::*;
