//! Failure taxonomy for a single pipeline run.
//!
//! Every stage reports its own error type so the runner can decide, per stage,
//! whether a failure aborts the run, is logged and skipped, or ends the process.

use thiserror::Error;

/// The provider could not be reached or answered with something unusable.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to weather provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("weather provider returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("weather provider returned an undecodable body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A successful provider response lacked a field the record needs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedResponse {
    #[error("response is missing field `{0}`")]
    MissingField(&'static str),

    #[error("response field `{field}` is not {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
}

/// Appending to the archive failed.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("archive I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("archive CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// The report could not be handed to the mail service.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("invalid e-mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("could not build e-mail message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("mail service rejected the message: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_messages_name_the_field() {
        let err = MalformedResponse::MissingField("main.temp");
        assert!(err.to_string().contains("main.temp"));

        let err = MalformedResponse::WrongType {
            field: "main.humidity",
            expected: "an integer percentage",
        };
        assert!(err.to_string().contains("main.humidity"));
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn status_error_reports_code_and_body() {
        let err = FetchError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            body: "Invalid API key".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("Invalid API key"));
    }
}
