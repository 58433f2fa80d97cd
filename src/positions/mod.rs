pub mod positions_errors;
pub mod positions_model;
pub mod positions_service;
pub mod positions_traits;
pub mod reconstruction;

pub use positions_errors::*;
pub use positions_model::*;
pub use positions_service::PositionService;
pub use positions_traits::*;
pub use reconstruction::PositionCalculator;
