use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::event::Event;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("could not serialize event: {0}")]
    Json(#[from] serde_json::Error),
}

fn default_machine_id() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "ups".to_string())
}

#[derive(Deserialize, Serialize, Debug)]
pub struct MailerSettings {
    pub user: String,
    pub pass: String,
    pub relay: String,
    pub from: String,
    pub to: Vec<String>,
    #[serde(default = "default_machine_id")]
    pub machine_id: String,
    /// Log messages instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
}

pub struct Mailer {
    from: String,
    vec_to: Vec<String>,
    machine_id: String,
    dry_run: bool,
    relay: SmtpTransport,
}

impl Mailer {
    pub fn new(settings: MailerSettings) -> Result<Mailer, MailerError> {
        Ok(Mailer {
            from: settings.from,
            vec_to: settings.to,
            machine_id: settings.machine_id,
            dry_run: settings.dry_run,
            relay: SmtpTransport::relay(&settings.relay)?
                .credentials(Credentials::new(settings.user, settings.pass))
                .build(),
        })
    }

    pub fn subject(&self, summary: &str) -> String {
        format!("{}: {}", self.machine_id, summary)
    }

    pub fn send(&self, subject: &str, message: &str) -> Result<(), MailerError> {
        let subject = self.subject(subject);
        if self.dry_run {
            log::info!("Dry run, not sending email '{}'.", subject);
            return Ok(());
        }

        let mut builder = Message::builder().from(self.from.parse()?);
        for to in &self.vec_to {
            builder = builder.to(to.parse()?)
        }
        let email = builder.subject(subject).body(message.to_string())?;

        self.relay.send(&email)?;
        Ok(())
    }

    /// Mail a single monitor event, the body being the event as JSON.
    pub fn notify(&self, event: &Event) -> Result<(), MailerError> {
        let body = serde_json::to_string_pretty(event)?;
        self.send(&event.event_metadata.to_string(), &body)
    }
}
