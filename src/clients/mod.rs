pub mod backend;
pub mod coingecko;

pub use backend::BackendClient;
pub use coingecko::CoinGeckoClient;
