/// Account notification emails
///
/// Fire-and-forget welcome and cancellation messages over SMTP. Sending
/// happens off the request path on a blocking task; a delivery failure is
/// logged and never surfaces to the client. When no SMTP endpoint is
/// configured the mailer is a no-op that logs what it would have sent.

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::SmtpTransport,
    Message, Transport,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::SmtpConfig;

/// Outbound mailer handle; cheap to clone
#[derive(Clone)]
pub struct Mailer {
    inner: Option<Arc<MailerInner>>,
}

struct MailerInner {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    /// Builds a mailer from configuration
    ///
    /// Returns a disabled mailer when `smtp.url` is unset.
    ///
    /// # Errors
    ///
    /// Fails if the SMTP URL or the From address cannot be parsed.
    pub fn from_config(config: &SmtpConfig) -> anyhow::Result<Self> {
        let Some(ref url) = config.url else {
            debug!("SMTP_URL not set, outbound email disabled");
            return Ok(Self { inner: None });
        };

        let transport = SmtpTransport::from_url(url)?.build();
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid SMTP_FROM address: {}", e))?;

        Ok(Self {
            inner: Some(Arc::new(MailerInner { transport, from })),
        })
    }

    /// A mailer that never sends; used in tests
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Sends the post-signup welcome email
    pub fn send_welcome(&self, email: &str, name: &str) {
        self.send(
            email,
            "Thanks for joining in!",
            format!(
                "Welcome to the app, {}. Let us know how you get along with it.",
                name
            ),
        );
    }

    /// Sends the account-cancellation email
    pub fn send_cancellation(&self, email: &str, name: &str) {
        self.send(
            email,
            "Account cancellation",
            format!(
                "We are sorry to see you go, {}. We would appreciate feedback on why you canceled.",
                name
            ),
        );
    }

    /// Queues one message; errors are logged, never returned
    fn send(&self, to: &str, subject: &str, body: String) {
        let Some(inner) = self.inner.clone() else {
            debug!(to, subject, "Mailer disabled, skipping email");
            return;
        };

        let to = to.to_string();
        let subject = subject.to_string();

        // SMTP delivery is blocking; keep it off the async request path.
        tokio::task::spawn_blocking(move || {
            let mailbox: Mailbox = match to.parse() {
                Ok(mb) => mb,
                Err(e) => {
                    warn!(to, "Skipping email, unparseable recipient: {}", e);
                    return;
                }
            };

            let message = Message::builder()
                .from(inner.from.clone())
                .to(mailbox)
                .subject(&subject)
                .header(ContentType::TEXT_PLAIN)
                .body(body);

            let message = match message {
                Ok(m) => m,
                Err(e) => {
                    warn!(to, subject, "Failed to build email: {}", e);
                    return;
                }
            };

            match inner.transport.send(&message) {
                Ok(_) => debug!(to, subject, "Sent notification email"),
                Err(e) => warn!(to, subject, "Failed to send email: {}", e),
            }
        });
    }
}
