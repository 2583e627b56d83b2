use crate::config::EmailConfig;
use crate::errors::{ServiceError, ServiceResult};
use askama::Template;
use async_trait::async_trait;
use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;

/// Outbound mail used by the signup flow.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Sends the email-verification link for `verification_token`.
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        verification_token: &str,
    ) -> ServiceResult<()>;
}

/// Builds the link the frontend's verify page expects.
pub fn verification_url(base_url: &str, token: &str) -> String {
    format!("{}/verify-email?token={}", base_url.trim_end_matches('/'), token)
}

/// HTML body of the verification email. Interpolated values are HTML-escaped.
#[derive(Template)]
#[template(path = "email/verification.html")]
struct VerificationEmailHtml<'a> {
    name: &'a str,
    verify_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/verification.txt")]
struct VerificationEmailText<'a> {
    name: &'a str,
    verify_url: &'a str,
}

/// Renders the HTML and plain-text bodies of the verification email.
fn render_verification_email(name: &str, verify_url: &str) -> ServiceResult<(String, String)> {
    let html = VerificationEmailHtml { name, verify_url }
        .render()
        .map_err(|e| ServiceError::internal_error(format!("Failed to render email: {e}")))?;
    let text = VerificationEmailText { name, verify_url }
        .render()
        .map_err(|e| ServiceError::internal_error(format!("Failed to render email: {e}")))?;
    Ok((html, text))
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
            .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { mailer, config })
    }

    /// Sends a generic email
    pub async fn send_email(
        &self,
        to_email: &str,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::internal_error(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(to_email)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_content.to_string()),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_content.to_string()),
                    ),
            )
            .map_err(|e| ServiceError::internal_error(format!("Failed to build email: {e}")))?;

        self.mailer.send(email).await.map_err(|e| {
            tracing::error!("SMTP delivery to {} failed: {}", to_email, e);
            ServiceError::external_service("Failed to send email")
        })?;

        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        recipient_name: &str,
        verification_token: &str,
    ) -> ServiceResult<()> {
        let verify_url = verification_url(&self.config.base_url, verification_token);
        let (html_content, text_content) = render_verification_email(recipient_name, &verify_url)?;

        self.send_email(
            recipient_email,
            "Verify your email address",
            &html_content,
            &text_content,
        )
        .await
    }
}

/// Fallback used when SMTP is not configured: the link only goes to the log.
pub struct LogMailer {
    base_url: String,
}

impl LogMailer {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_verification_email(
        &self,
        recipient_email: &str,
        _recipient_name: &str,
        verification_token: &str,
    ) -> ServiceResult<()> {
        tracing::warn!(
            "Email service not configured. Verification link for {}: {}",
            recipient_email,
            verification_url(&self.base_url, verification_token)
        );
        Ok(())
    }
}
