//! HTML e-mail summary of a [`WeatherRecord`].

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use chrono::NaiveDate;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor, message::header::ContentType,
    transport::smtp::authentication::Credentials,
};
use tracing::{info, warn};

use crate::{
    config::{EmailConfig, SenderCredentials},
    error::DeliveryError,
    model::WeatherRecord,
};

/// A rendered report ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Mail submission service.
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, sender: &SenderCredentials, message: &EmailMessage)
    -> Result<(), DeliveryError>;
}

/// Submits through an SMTP relay over TLS, authenticating as the sender.
#[derive(Debug, Clone)]
pub struct SmtpMailer {
    host: String,
}

impl SmtpMailer {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn build_message(
        sender: &SenderCredentials,
        message: &EmailMessage,
    ) -> Result<Message, DeliveryError> {
        Ok(Message::builder()
            .from(sender.address.parse()?)
            .to(message.to.parse()?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.html_body.clone())?)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(
        &self,
        sender: &SenderCredentials,
        message: &EmailMessage,
    ) -> Result<(), DeliveryError> {
        let email = Self::build_message(sender, message)?;
        let creds = Credentials::new(sender.address.clone(), sender.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
            .credentials(creds)
            .build();

        let response = transport.send(email).await?;
        if !response.is_positive() {
            return Err(DeliveryError::Rejected(response.code().to_string()));
        }
        Ok(())
    }
}

/// What became of one notification attempt. Failures stop here.
#[derive(Debug)]
pub enum NotifyOutcome {
    Sent { to: String },
    Skipped,
    Failed(DeliveryError),
}

#[derive(Debug, Clone)]
pub struct Notifier {
    email: EmailConfig,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(email: EmailConfig, mailer: Arc<dyn Mailer>) -> Self {
        Self { email, mailer }
    }

    /// SMTP-backed notifier for the configured relay.
    pub fn from_config(email: &EmailConfig) -> Self {
        let mailer = Arc::new(SmtpMailer::new(email.smtp_host.clone()));
        Self::new(email.clone(), mailer)
    }

    /// Send the report for `record`, dated `today`.
    ///
    /// Missing sender credentials skip delivery without touching the mailer.
    pub async fn notify(&self, record: &WeatherRecord, today: NaiveDate) -> NotifyOutcome {
        let (Some(sender), Some(to)) = (self.email.credentials(), self.email.recipient()) else {
            info!("Email credentials not set. Skipping email.");
            return NotifyOutcome::Skipped;
        };

        let message = EmailMessage {
            to: to.to_string(),
            subject: subject(&record.city, today),
            html_body: render_html(record),
        };

        match self.mailer.send(&sender, &message).await {
            Ok(()) => {
                info!(to, "email report sent");
                NotifyOutcome::Sent { to: message.to }
            }
            Err(err) => {
                warn!(to, error = %err, "error sending email");
                NotifyOutcome::Failed(err)
            }
        }
    }
}

pub fn subject(city: &str, today: NaiveDate) -> String {
    format!("Daily Weather Report for {city} - {}", today.format("%Y-%m-%d"))
}

pub fn render_html(record: &WeatherRecord) -> String {
    format!(
        r#"<html>
<body>
    <h2>Today's Weather Update for {city}:</h2>
    <p><strong>Temperature:</strong> {temp:.1}°C</p>
    <p><strong>Feels Like:</strong> {feels:.1}°C</p>
    <p><strong>Humidity:</strong> {humidity}%</p>
    <p><strong>Conditions:</strong> {conditions}</p>
    <p><strong>Wind Speed:</strong> {wind:?} m/s</p>
    <p>This report was generated automatically by the weather report pipeline.</p>
</body>
</html>
"#,
        city = escape_html(&record.city),
        temp = record.temperature_celsius,
        feels = record.feels_like_celsius,
        humidity = record.humidity_percent,
        conditions = escape_html(&title_case(&record.weather_description)),
        wind = record.wind_speed_mps,
    )
}

/// Capitalize the first letter of every run of letters, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
