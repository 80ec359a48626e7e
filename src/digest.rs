use crate::config::EmailSettings;
use crate::models::AnnotationRecord;
use crate::render::render_human;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

pub const DIGEST_SUBJECT: &str = "Daily Kobo highlights digest";

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers a plain-text body somewhere a human will read it.
pub trait Notifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

pub struct SmtpNotifier {
    settings: EmailSettings,
}

impl SmtpNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }
}

impl Notifier for SmtpNotifier {
    fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.settings.sender.parse()?)
            .to(self.settings.receiver.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        let mailer = SmtpTransport::starttls_relay(&self.settings.smtp_host)?
            .credentials(Credentials::new(
                self.settings.sender.clone(),
                self.settings.password.clone(),
            ))
            .build();

        log::debug!("Sending digest via {}", self.settings.smtp_host);
        mailer.send(&message)?;
        Ok(())
    }
}

/// Uniform sample without replacement; everything when there are fewer
/// than `size` records.
pub fn sample<'a, R: Rng + ?Sized>(
    records: &'a [AnnotationRecord],
    size: usize,
    rng: &mut R,
) -> Vec<&'a AnnotationRecord> {
    if records.len() < size {
        log::warn!(
            "Only {} highlights available for a digest of {}",
            records.len(),
            size
        );
    }
    records.choose_multiple(rng, size).collect()
}

/// Samples, renders and sends. Returns how many records went out.
pub fn send_digest<N: Notifier, R: Rng + ?Sized>(
    notifier: &N,
    records: &[AnnotationRecord],
    size: usize,
    rng: &mut R,
) -> Result<usize, NotifyError> {
    let picked = sample(records, size, rng);
    let body = render_human(picked.iter().copied());

    notifier.send(DIGEST_SUBJECT, &body)?;
    Ok(picked.len())
}
