pub mod er_api_client;

pub use er_api_client::{parse_latest_response, ErApiClient, RateProvider, DEFAULT_API_URL};

#[cfg(test)]
pub mod fake_provider;
