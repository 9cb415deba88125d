//! Verification-code email delivery.
//!
//! `HttpEmailSender` posts to a transactional-mail HTTP API. `LogEmailSender` is the local-dev
//! fallback used when no API key is configured: it logs the message and reports success.

use std::time::Duration;

use anyhow::Context as _;
use serde::Serialize;
use tracing::info;

use rentdesk_domain::locale::Locale;

use crate::domain::repository::EmailSender;
use crate::domain::types::{TenantBranding, VERIFICATION_CODE_TTL_SECS};

/// Rendered subject + plain-text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationEmail {
    pub subject: String,
    pub text: String,
}

pub fn render_verification_email(
    branding: &TenantBranding,
    code: &str,
    locale: Locale,
) -> VerificationEmail {
    let minutes = VERIFICATION_CODE_TTL_SECS / 60;
    let store = &branding.name;
    match locale {
        Locale::En => VerificationEmail {
            subject: format!("Your {store} login code: {code}"),
            text: format!(
                "Your login code for {store} is {code}.\n\n\
                 It expires in {minutes} minutes. If you did not ask for it, ignore this email.\n"
            ),
        },
        Locale::Fr => VerificationEmail {
            subject: format!("Votre code de connexion {store} : {code}"),
            text: format!(
                "Votre code de connexion pour {store} est {code}.\n\n\
                 Il expire dans {minutes} minutes. Si vous n'avez rien demandé, ignorez cet e-mail.\n"
            ),
        },
    }
}

// ── Log sender ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    async fn send_verification_code(
        &self,
        to: &str,
        branding: &TenantBranding,
        code: &str,
        locale: Locale,
    ) -> anyhow::Result<()> {
        let email = render_verification_email(branding, code, locale);
        info!(
            to_email = %to,
            store = %branding.name,
            %locale,
            subject = %email.subject,
            code,
            "verification email send stub"
        );
        Ok(())
    }
}

// ── HTTP API sender ──────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OutgoingMessage<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct HttpEmailSender {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl HttpEmailSender {
    pub fn new(api_url: String, api_key: String, from_address: String) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("build email http client")?;
        Ok(Self {
            client,
            api_url,
            api_key,
            from_address,
        })
    }
}

impl EmailSender for HttpEmailSender {
    async fn send_verification_code(
        &self,
        to: &str,
        branding: &TenantBranding,
        code: &str,
        locale: Locale,
    ) -> anyhow::Result<()> {
        let email = render_verification_email(branding, code, locale);
        let message = OutgoingMessage {
            from: mailbox(&branding.name, &self.from_address),
            to: [to],
            subject: &email.subject,
            text: &email.text,
        };
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&message)
            .send()
            .await
            .context("email api request")?
            .error_for_status()
            .context("email api rejected message")?;
        Ok(())
    }
}

/// RFC 5322 mailbox with the display name as a quoted string.
///
/// Backslashes and double quotes are escaped; line breaks and other control characters are
/// dropped so a store name can never add header lines.
fn mailbox(display_name: &str, address: &str) -> String {
    let mut quoted = String::with_capacity(display_name.len() + 2);
    for c in display_name.chars().filter(|c| !c.is_control()) {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    format!("\"{quoted}\" <{address}>")
}

// ── Runtime selection ────────────────────────────────────────────────────────

#[derive(Clone)]
pub enum AppEmailSender {
    Log(LogEmailSender),
    Http(HttpEmailSender),
}

impl EmailSender for AppEmailSender {
    async fn send_verification_code(
        &self,
        to: &str,
        branding: &TenantBranding,
        code: &str,
        locale: Locale,
    ) -> anyhow::Result<()> {
        match self {
            Self::Log(sender) => {
                sender
                    .send_verification_code(to, branding, code, locale)
                    .await
            }
            Self::Http(sender) => {
                sender
                    .send_verification_code(to, branding, code, locale)
                    .await
            }
        }
    }
}
