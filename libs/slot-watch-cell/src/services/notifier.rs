use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, instrument};

use shared_config::AppConfig;

use crate::error::SlotWatchError;

pub const NOTIFICATION_SUBJECT: &str = "New appointment available";

/// Side-effect boundary for "a slot matched".
///
/// One call sends at most one message. Implementations must not retry or
/// deduplicate; a failure is returned so the caller leaves the request
/// pending.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        email: &str,
        doctor_name: &str,
        slot: NaiveDateTime,
    ) -> Result<(), SlotWatchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub subject: String,
    pub body: String,
}

pub fn compose_notification(doctor_name: &str, slot: NaiveDateTime) -> NotificationMessage {
    NotificationMessage {
        subject: NOTIFICATION_SUBJECT.to_string(),
        body: format!(
            "An appointment opening has appeared. Check it on the EMIAS website.\nAppointment: {}\t{}",
            doctor_name,
            slot.format("%Y-%m-%d %H:%M")
        ),
    }
}

/// Sends plain-text mail through one authenticated relay over implicit TLS.
#[derive(Debug)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &AppConfig) -> Result<Self, SlotWatchError> {
        let from: Mailbox = config
            .mail_from
            .parse()
            .map_err(|e| SlotWatchError::NotificationFailed(format!("invalid sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| SlotWatchError::NotificationFailed(format!("invalid relay: {}", e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.smtp_timeout_seconds)))
            .build();

        info!("SMTP notifier configured for {}:{}", config.smtp_host, config.smtp_port);

        Ok(Self { transport, from })
    }

    fn build_message(&self, email: &str, doctor_name: &str, slot: NaiveDateTime) -> Result<Message, SlotWatchError> {
        let to: Mailbox = email
            .parse()
            .map_err(|e| SlotWatchError::NotificationFailed(format!("invalid recipient address: {}", e)))?;

        let content = compose_notification(doctor_name, slot);

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(content.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(content.body)
            .map_err(|e| SlotWatchError::NotificationFailed(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    #[instrument(skip(self, email))]
    async fn notify(
        &self,
        email: &str,
        doctor_name: &str,
        slot: NaiveDateTime,
    ) -> Result<(), SlotWatchError> {
        let message = self.build_message(email, doctor_name, slot)?;

        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| SlotWatchError::NotificationFailed(e.to_string()))?;

        debug!("Relay accepted notification with code {}", response.code());
        Ok(())
    }
}
