use crate::{Config, error::FetchError, model::RawObservation, provider::openweather::OpenWeatherProvider};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// Source of current conditions for a named location.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// One request, no retry. Any transport or HTTP failure is returned, never panics.
    async fn fetch_current(&self, city: &str) -> Result<RawObservation, FetchError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, FetchError> {
    let provider = OpenWeatherProvider::builder(config.api_key.clone())
        .base_url(&config.provider_url)
        .timeout(config.http_timeout())
        .build()?;

    Ok(Box::new(provider))
}
