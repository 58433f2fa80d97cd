pub mod analytics_constants;
pub mod analyzer;

pub use analytics_constants::*;
pub use analyzer::*;
