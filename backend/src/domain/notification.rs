//! Best-effort email notifications.
//!
//! Services never send mail inline. After a successful write they emit a
//! `NotificationEvent` on an unbounded channel; a dedicated worker task owns
//! the SMTP transport and delivers the messages. Delivery failures are logged
//! and never affect the originating write.

use anyhow::{Context, Result};
use lettre::{
    message::Mailbox,
    transport::smtp::authentication::Credentials,
    Message, SmtpTransport, Transport,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::SmtpConfig;

/// Events consumed by the notification worker
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    /// Sent after a successful payment upsert for a family with an email on file
    PaymentConfirmation {
        email: String,
        head_name: String,
        card_no: String,
        /// Formatted month name, e.g. "July 2025"
        month_name: String,
        amount_paid: i64,
        payment_date: String,
        remarks: Option<String>,
    },
    /// Sent after a new family with an email on file is registered
    Welcome {
        email: String,
        head_name: String,
        card_no: String,
        unit_name: String,
    },
}

/// Handle the domain services use to enqueue events
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<NotificationEvent>,
}

impl Notifier {
    /// Enqueue an event. A closed channel is logged and swallowed; the
    /// originating write has already committed.
    pub fn send(&self, event: NotificationEvent) {
        if self.tx.send(event).is_err() {
            warn!("notification worker is gone, dropping event");
        }
    }
}

/// Spawn the notification worker and return the sending handle.
///
/// With incomplete SMTP configuration the worker still runs, logging and
/// discarding events, so the rest of the application is unaffected.
pub fn spawn_notification_worker(config: SmtpConfig) -> Notifier {
    let (tx, mut rx) = mpsc::unbounded_channel::<NotificationEvent>();

    tokio::spawn(async move {
        let transport = match build_transport(&config) {
            Ok(Some(t)) => {
                info!("notification worker started");
                Some(t)
            }
            Ok(None) => {
                warn!("SMTP configuration incomplete, email notifications disabled");
                None
            }
            Err(e) => {
                warn!("failed to initialize SMTP transport, email notifications disabled: {e:?}");
                None
            }
        };

        while let Some(event) = rx.recv().await {
            let Some(transport) = transport.clone() else {
                info!("email disabled, dropping notification event");
                continue;
            };
            let from = config.from_display();

            let message = match build_message(&from, &event) {
                Ok(m) => m,
                Err(e) => {
                    warn!("failed to build notification email: {e:?}");
                    continue;
                }
            };

            // lettre's SMTP transport is blocking
            let result = tokio::task::spawn_blocking(move || transport.send(&message)).await;
            match result {
                Ok(Ok(_)) => info!("notification email sent"),
                Ok(Err(e)) => warn!("failed to send notification email: {e:?}"),
                Err(e) => warn!("notification send task failed: {e:?}"),
            }
        }
    });

    Notifier { tx }
}

impl SmtpConfig {
    fn from_display(&self) -> String {
        match &self.from_email {
            Some(addr) => format!("{} <{}>", self.from_name, addr),
            None => self.from_name.clone(),
        }
    }
}

fn build_transport(config: &SmtpConfig) -> Result<Option<SmtpTransport>> {
    if !config.is_configured() {
        return Ok(None);
    }
    let host = config.host.as_deref().unwrap_or_default();
    let transport = SmtpTransport::relay(host)
        .context("Failed to create SMTP relay")?
        .port(config.port)
        .credentials(Credentials::new(
            config.username.clone().unwrap_or_default(),
            config.password.clone().unwrap_or_default(),
        ))
        .build();
    Ok(Some(transport))
}

fn build_message(from: &str, event: &NotificationEvent) -> Result<Message> {
    let (to, subject, body) = match event {
        NotificationEvent::PaymentConfirmation {
            email,
            head_name,
            card_no,
            month_name,
            amount_paid,
            payment_date,
            remarks,
        } => {
            let subject = format!("Payment Received - {month_name}");
            let mut body = format!(
                "Dear {head_name},\n\n\
                 We have received your monthly subscription payment.\n\n\
                 Family Card No: {card_no}\n\
                 Month: {month_name}\n\
                 Amount Paid: ₹{amount_paid}\n\
                 Payment Date: {payment_date}\n"
            );
            if let Some(remarks) = remarks {
                body.push_str(&format!("Remarks: {remarks}\n"));
            }
            body.push_str("\nThank you for your contribution.\n\nHoly Cross Church Administration");
            (email.clone(), subject, body)
        }
        NotificationEvent::Welcome {
            email,
            head_name,
            card_no,
            unit_name,
        } => {
            let subject = "Welcome to Holy Cross Church - Family Registration Confirmed".to_string();
            let body = format!(
                "Dear {head_name},\n\n\
                 Your family has been registered in the church management system.\n\n\
                 Family Card No: {card_no}\n\
                 Unit: {unit_name}\n\n\
                 You will receive notifications for payment confirmations and\n\
                 important updates.\n\nHoly Cross Church Administration"
            );
            (email.clone(), subject, body)
        }
    };

    Message::builder()
        .from(from.parse::<Mailbox>().context("Failed to parse from address")?)
        .to(to.parse::<Mailbox>().context("Failed to parse recipient address")?)
        .subject(subject)
        .body(body)
        .context("Failed to build email")
}
