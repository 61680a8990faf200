//! Core library for the `weather-report` job.
//!
//! This crate defines:
//! - Configuration loaded once from file and environment
//! - The weather provider abstraction and its OpenWeather implementation
//! - The record model, transformer, CSV archive and e-mail notifier
//! - The daily schedule and the runner that drives the pipeline
//!
//! It is used by `weather-report-cli`, but every stage can be driven on its own.

pub mod archive;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod provider;
pub mod runner;
pub mod schedule;
pub mod transform;

pub use archive::Archive;
pub use config::{Config, EmailConfig, SenderCredentials};
pub use error::{ArchiveError, DeliveryError, FetchError, MalformedResponse};
pub use model::{RawObservation, WeatherRecord};
pub use notify::{EmailMessage, Mailer, Notifier, NotifyOutcome, SmtpMailer};
pub use pipeline::{MalformedPolicy, Pipeline, RunOutcome};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use runner::Runner;
pub use schedule::DailySchedule;
