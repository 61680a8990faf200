//! One run: fetch, transform, archive, notify.

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::{
    Config,
    archive::Archive,
    error::{ArchiveError, FetchError, MalformedResponse},
    model::WeatherRecord,
    notify::{Notifier, NotifyOutcome},
    provider::{WeatherProvider, provider_from_config},
    schedule::local_now,
    transform::transform,
};

/// What a run does when the provider answers but a required field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// The run fails with an error and the scheduler stops.
    #[default]
    Fatal,
    /// The run is logged and abandoned; later triggers still fire.
    Skip,
}

impl TryFrom<&str> for MalformedPolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "fatal" => Ok(MalformedPolicy::Fatal),
            "skip" => Ok(MalformedPolicy::Skip),
            _ => Err(anyhow::anyhow!(
                "Unknown malformed-response policy '{value}'. Supported: fatal, skip."
            )),
        }
    }
}

/// How a single run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing was archived or sent.
    FetchFailed(FetchError),
    /// The provider answered with an empty body. Nothing was archived or sent.
    NoData,
    /// Nothing was archived or sent; only reachable under [`MalformedPolicy::Skip`].
    MalformedSkipped(MalformedResponse),
    Completed {
        record: WeatherRecord,
        archived: Result<(), ArchiveError>,
        notification: NotifyOutcome,
    },
}

#[derive(Debug)]
pub struct Pipeline {
    city: String,
    on_malformed: MalformedPolicy,
    provider: Box<dyn WeatherProvider>,
    archive: Archive,
    notifier: Notifier,
}

impl Pipeline {
    pub fn new(
        config: &Config,
        provider: Box<dyn WeatherProvider>,
        archive: Archive,
        notifier: Notifier,
    ) -> Self {
        Self {
            city: config.city.clone(),
            on_malformed: config.on_malformed,
            provider,
            archive,
            notifier,
        }
    }

    /// Pipeline wired to OpenWeather, the configured CSV file and SMTP.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(
            config,
            provider,
            Archive::new(&config.archive_path),
            Notifier::from_config(&config.email),
        ))
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Execute one run to completion.
    ///
    /// Fetch, archive and delivery failures are contained in the returned
    /// [`RunOutcome`]. The only `Err` is a malformed response under
    /// [`MalformedPolicy::Fatal`].
    pub async fn run_once(&self) -> Result<RunOutcome, MalformedResponse> {
        info!(city = %self.city, "--- Running pipeline job ---");
        let outcome = self.run_stages().await;

        match &outcome {
            Ok(RunOutcome::Completed { archived, notification, .. }) => {
                info!(
                    archived = archived.is_ok(),
                    notification = notification_label(notification),
                    "--- Job finished. ---"
                );
            }
            Ok(_) => info!("--- Job finished. ---"),
            Err(err) => error!(error = %err, "pipeline job aborted"),
        }
        outcome
    }

    async fn run_stages(&self) -> Result<RunOutcome, MalformedResponse> {
        let raw = match self.provider.fetch_current(&self.city).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(error = %err, "Error fetching data");
                return Ok(RunOutcome::FetchFailed(err));
            }
        };

        let raw = Some(raw).filter(|raw| !raw.is_empty());
        let record = match transform(raw.as_ref(), &self.city, local_now()) {
            Ok(Some(record)) => record,
            Ok(None) => {
                warn!("weather provider returned an empty body, skipping run");
                return Ok(RunOutcome::NoData);
            }
            Err(err) => match self.on_malformed {
                MalformedPolicy::Fatal => return Err(err),
                MalformedPolicy::Skip => {
                    warn!(error = %err, "skipping run on malformed response");
                    return Ok(RunOutcome::MalformedSkipped(err));
                }
            },
        };

        let archived = self.archive.append(&record);
        if let Err(err) = &archived {
            warn!(path = %self.archive.path().display(), error = %err, "Error saving data");
        }

        let notification = self.notifier.notify(&record, local_now().date()).await;

        Ok(RunOutcome::Completed {
            record,
            archived,
            notification,
        })
    }
}

fn notification_label(outcome: &NotifyOutcome) -> &'static str {
    match outcome {
        NotifyOutcome::Sent { .. } => "sent",
        NotifyOutcome::Skipped => "skipped",
        NotifyOutcome::Failed(_) => "failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(MalformedPolicy::try_from("Fatal").unwrap(), MalformedPolicy::Fatal);
        assert_eq!(MalformedPolicy::try_from(" skip ").unwrap(), MalformedPolicy::Skip);
    }

    #[test]
    fn unknown_policy_error() {
        let err = MalformedPolicy::try_from("retry").unwrap_err();
        assert!(err.to_string().contains("Unknown malformed-response policy"));
    }

    #[test]
    fn default_policy_is_fatal() {
        assert_eq!(MalformedPolicy::default(), MalformedPolicy::Fatal);
    }

    #[test]
    fn pipeline_builds_from_default_config() {
        let pipeline = Pipeline::from_config(&Config::default()).unwrap();
        assert_eq!(pipeline.archive().path(), std::path::Path::new("weather_data.csv"));
    }
}
