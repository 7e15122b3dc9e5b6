//! # Outbound Mail
//!
//! Notification delivery behind the [`Mailer`] trait. Two transports exist:
//!
//! - [`LogMailer`] writes each message to the log and keeps it in an outbox;
//! - [`SmtpMailer`] relays through an SMTP server with lettre.
//!
//! [`mailer_from_config`] picks one at startup. Delivery failures are logged
//! by [`deliver`] and never fail the request that triggered them.

use std::sync::Arc;

use agri_core::User;
use agri_state::Task;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parking_lot::Mutex;
use thiserror::Error;

use crate::config::MailConfig;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("invalid mail address \"{address}\": {reason}")]
    Address { address: String, reason: String },

    #[error("failed to build message: {0}")]
    Build(String),

    #[error("smtp transport error: {0}")]
    Transport(String),
}

/// A plain-text notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait Mailer: Send + Sync + std::fmt::Debug {
    /// Short transport name for logs and readiness output.
    fn transport(&self) -> &'static str;

    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Records messages instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<Vec<MailMessage>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message handed to this mailer so far, oldest first.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.outbox.lock().clone()
    }
}

#[async_trait::async_trait]
impl Mailer for LogMailer {
    fn transport(&self) -> &'static str {
        "log"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "mail (log transport)");
        self.outbox.lock().push(message.clone());
        Ok(())
    }
}

/// Async SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> Result<Self, MailError> {
        let host = config
            .smtp_host
            .clone()
            .ok_or_else(|| MailError::Transport("no SMTP host configured".to_string()))?;
        let from = parse_mailbox(&config.from)?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
                .map_err(|e| MailError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
        };
        let mut builder = builder.port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            host,
        })
    }
}

#[async_trait::async_trait]
impl Mailer for SmtpMailer {
    fn transport(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, MailError> {
    address.parse().map_err(|e: lettre::address::AddressError| MailError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// SMTP when enabled and a host is set, otherwise the log transport.
pub fn mailer_from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if config.uses_smtp() {
        let mailer = SmtpMailer::new(config)?;
        tracing::info!(host = %mailer.host, "SMTP mail transport configured");
        Ok(Arc::new(mailer))
    } else {
        tracing::info!("mail transport: log only");
        Ok(Arc::new(LogMailer::new()))
    }
}

/// Send `message`, logging instead of returning a failure.
pub async fn deliver(mailer: &dyn Mailer, message: MailMessage) {
    if let Err(e) = mailer.send(&message).await {
        tracing::warn!(
            transport = mailer.transport(),
            to = %message.to,
            error = %e,
            "mail delivery failed"
        );
    }
}

// ── Templates ────────────────────────────────────────────────────────

pub fn welcome_message(user: &User) -> Option<MailMessage> {
    let to = user.email.clone()?;
    Some(MailMessage {
        to,
        subject: "Welcome to Agri Stack".to_string(),
        body: format!(
            "Hello {},\n\nAn account with username \"{}\" and role {} has been created for you.\n",
            user.full_name, user.username, user.role
        ),
    })
}

pub fn task_assigned_message(owner: &User, task: &Task) -> Option<MailMessage> {
    let to = owner.email.clone()?;
    let due = task
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "no due date".to_string());
    Some(MailMessage {
        to,
        subject: format!("New task: {}", task.title),
        body: format!(
            "Hello {},\n\nThe task \"{}\" has been added to your list ({}).\n",
            owner.full_name, task.title, due
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::UserRole;
    use agri_state::{EntityFactory, TaskFactory, TaskRequest};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn log_mailer_records_messages() {
        let mailer = LogMailer::new();
        let msg = MailMessage {
            to: "an@example.org".into(),
            subject: "hi".into(),
            body: "body".into(),
        };
        mailer.send(&msg).await.unwrap();
        assert_eq!(mailer.sent(), vec![msg]);
        assert_eq!(mailer.transport(), "log");
    }

    #[tokio::test]
    async fn clones_share_the_outbox() {
        let mailer = LogMailer::new();
        let handle: Arc<dyn Mailer> = Arc::new(mailer.clone());
        deliver(
            handle.as_ref(),
            MailMessage {
                to: "x@example.org".into(),
                subject: "s".into(),
                body: "b".into(),
            },
        )
        .await;
        assert_eq!(mailer.sent().len(), 1);
    }

    #[test]
    fn log_transport_without_host() {
        let mailer = mailer_from_config(&MailConfig::default()).unwrap();
        assert_eq!(mailer.transport(), "log");

        let disabled = MailConfig {
            enabled: false,
            smtp_host: Some("smtp.example.org".into()),
            ..MailConfig::default()
        };
        assert_eq!(mailer_from_config(&disabled).unwrap().transport(), "log");
    }

    #[test]
    fn bad_sender_is_rejected() {
        let config = MailConfig {
            smtp_host: Some("localhost".into()),
            starttls: false,
            from: "not an address".into(),
            ..MailConfig::default()
        };
        assert!(matches!(
            SmtpMailer::new(&config),
            Err(MailError::Address { .. })
        ));
    }

    #[test]
    fn templates_need_an_email() {
        let user = User::new("an", "Tran An", UserRole::Farmer);
        assert!(welcome_message(&user).is_none());

        let user = user.with_email("an@example.org");
        let welcome = welcome_message(&user).unwrap();
        assert_eq!(welcome.to, "an@example.org");
        assert!(welcome.body.contains("FARMER"));

        let task = TaskFactory::new().create(
            &TaskRequest {
                title: "Weed row 4".into(),
                due_date: NaiveDate::from_ymd_opt(2025, 5, 2),
                ..Default::default()
            },
            &user,
        );
        let notice = task_assigned_message(&user, &task).unwrap();
        assert_eq!(notice.subject, "New task: Weed row 4");
        assert!(notice.body.contains("2025-05-02"));
    }
}
