//! Plain-text email envelope around the generated report body.

use crate::config::EmailConfig;
use chrono::NaiveDateTime;

/// A ready-to-send email with literal headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailEnvelope {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub body: String,
    signature: String,
    timestamp: NaiveDateTime,
}

impl EmailEnvelope {
    /// Wrap `body`. The subject gets the month of `timestamp` appended.
    pub fn new(config: &EmailConfig, body: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            subject: format!("{} - {}", config.subject, timestamp.format("%B %Y")),
            from: config.sender.clone(),
            to: config.recipient.clone(),
            body: body.into(),
            signature: config.signature.clone(),
            timestamp,
        }
    }

    pub fn render(&self) -> String {
        format!(
            "Subject: {}\nFrom: {}\nTo: {}\n\n{}\n\n---\n{}\nDate: {}\n",
            self.subject,
            self.from,
            self.to,
            self.body.trim_end(),
            self.signature,
            self.timestamp.format("%B %d, %Y at %I:%M %p")
        )
    }
}
