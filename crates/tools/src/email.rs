//! `send_email`: mails the answer over SMTPS with the configured account.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use reckon_config::EmailConfig;
use reckon_core::args::{ArgKind, ArgValue, Param};
use reckon_core::error::ToolError;
use reckon_core::tool::Tool;
use reckon_core::value::ToolValue;
use tracing::info;

pub struct SendEmailTool {
    config: EmailConfig,
}

impl SendEmailTool {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn compose(&self, text: &str) -> Result<lettre::Message, String> {
        let from = self
            .config
            .sender()
            .ok_or("no sender address (set email.username or email.from)")?;
        let to = self.config.recipient().ok_or("no recipient address")?;

        lettre::Message::builder()
            .from(from.parse().map_err(|e| format!("invalid sender {from}: {e}"))?)
            .to(to.parse().map_err(|e| format!("invalid recipient {to}: {e}"))?)
            .subject(self.config.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(text.to_string())
            .map_err(|e| e.to_string())
    }

    fn credentials(&self) -> Result<Credentials, String> {
        match (&self.config.username, &self.config.password) {
            (Some(user), Some(pass)) => Ok(Credentials::new(user.clone(), pass.clone())),
            _ => Err("SMTP credentials are not configured (email.username / RECKON_SMTP_PASSWORD)".into()),
        }
    }
}

const TEXT: &[Param] = &[Param::new("text", ArgKind::Text)];

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send the text by e-mail to the configured recipient."
    }

    fn params(&self) -> &[Param] {
        TEXT
    }

    async fn execute(&self, args: Vec<ArgValue>) -> Result<ToolValue, ToolError> {
        let text = args
            .first()
            .and_then(ArgValue::as_text)
            .ok_or_else(|| ToolError::invalid(self.name(), "missing text"))?;

        let credentials = self
            .credentials()
            .map_err(|e| ToolError::external(self.name(), e))?;
        let message = self
            .compose(text)
            .map_err(|e| ToolError::external(self.name(), e))?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.smtp_host)
            .map_err(|e| ToolError::external(self.name(), e.to_string()))?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| ToolError::external(self.name(), e.to_string()))?;

        info!(host = %self.config.smtp_host, "Email sent");
        Ok(ToolValue::Text("Email sent successfully!".into()))
    }
}
