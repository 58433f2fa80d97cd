pub mod fixed_income_errors;
pub mod fixed_income_model;
pub mod fixed_income_repository;
pub mod fixed_income_service;
pub mod fixed_income_traits;

pub use fixed_income_errors::*;
pub use fixed_income_model::*;
pub use fixed_income_repository::FixedIncomeRepository;
pub use fixed_income_service::FixedIncomeService;
pub use fixed_income_traits::*;
