use anyhow::Context;
use clap::{Parser, Subcommand};
use weather_report_core::{Archive, Config, DailySchedule, Pipeline, RunOutcome, Runner};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "weather-report",
    version,
    about = "Fetch current weather, append it to a CSV archive and e-mail a summary"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run once now, then every day at the trigger time until interrupted (default).
    Run {
        /// Override the daily trigger time, HH:MM or HH:MM:SS.
        #[arg(long)]
        at: Option<String>,
    },

    /// Run the pipeline a single time and exit.
    Once,

    /// Print archived observations.
    History {
        /// Show only the most recent N rows.
        #[arg(long)]
        limit: Option<usize>,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load().context("Failed to load configuration")?;

        match self.command.unwrap_or(Command::Run { at: None }) {
            Command::Run { at } => {
                let schedule = match at {
                    Some(at) => DailySchedule::parse(&at)?,
                    None => config.schedule()?,
                };
                tracing::info!(city = %config.city, at = %schedule.at(), "--- Starting automated weather pipeline scheduler ---");

                let runner = Runner::new(Pipeline::from_config(&config)?, schedule);
                runner.run_forever().await?;
            }
            Command::Once => {
                let pipeline = Pipeline::from_config(&config)?;
                if let RunOutcome::Completed { record, .. } = pipeline.run_once().await? {
                    println!("{}", format_row(&record));
                }
            }
            Command::History { limit } => {
                let archive = Archive::new(&config.archive_path);
                let records = archive
                    .read_all()
                    .with_context(|| format!("Failed to read archive {}", archive.path().display()))?;

                let skip = limit.map_or(0, |n| records.len().saturating_sub(n));
                if records.is_empty() {
                    println!("No observations archived yet in {}", archive.path().display());
                }
                for record in records.iter().skip(skip) {
                    println!("{}", format_row(record));
                }
            }
        }

        Ok(())
    }
}

fn format_row(r: &weather_report_core::WeatherRecord) -> String {
    format!(
        "{}  {:<12} {:>5.1}°C (feels {:>5.1}°C)  {:>3}%  {:>4.1} m/s  {}",
        r.timestamp,
        r.city,
        r.temperature_celsius,
        r.feels_like_celsius,
        r.humidity_percent,
        r.wind_speed_mps,
        r.weather_description,
    )
}
