pub mod model_overview;
pub mod portfolio_service;
pub mod price_cache;
pub mod prices;
pub mod user_service;

pub use price_cache::TtlCache;
pub use prices::PriceService;
