//! Gmail adapter for outgoing notifications

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use base64::Engine;
use reqwest::Method;
use rendezvous_core::scheduling::MailClient;
use rendezvous_domain::{MailMessage, RendezvousError, Result};
use tracing::{debug, instrument};

use super::auth::GoogleTokenProvider;
use super::types::RawMessage;
use crate::http::HttpClient;

const BODY_LINE_WIDTH: usize = 76;

/// Sends plain-text mail through `users.messages.send`
pub struct GmailClient {
    http: HttpClient,
    tokens: Arc<GoogleTokenProvider>,
    api_base: String,
}

impl GmailClient {
    pub fn new(http: HttpClient, tokens: Arc<GoogleTokenProvider>, api_base: &str) -> Self {
        Self { http, tokens, api_base: api_base.trim_end_matches('/').to_string() }
    }
}

#[async_trait]
impl MailClient for GmailClient {
    #[instrument(skip(self, message), fields(recipients = message.to.len()))]
    async fn send(&self, message: &MailMessage) -> Result<()> {
        if message.to.is_empty() {
            return Err(RendezvousError::InvalidInput("mail has no recipients".into()));
        }

        let raw = URL_SAFE.encode(render_message(message));
        let token = self.tokens.access_token().await?;
        let request = self
            .http
            .request(Method::POST, format!("{}/users/me/messages/send", self.api_base))
            .bearer_auth(token)
            .json(&RawMessage { raw });

        match self.http.send(request).await {
            Ok(_) => {
                debug!("mail accepted");
                Ok(())
            }
            Err(err @ RendezvousError::Unauthorized(_)) => {
                self.tokens.invalidate().await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Render an RFC 2822 message with a base64 UTF-8 body
pub(crate) fn render_message(message: &MailMessage) -> String {
    let mut out = String::new();
    push_header(&mut out, "From", &message.from);
    push_header(&mut out, "To", &message.to.join(", "));
    if !message.cc.is_empty() {
        push_header(&mut out, "Cc", &message.cc.join(", "));
    }
    push_header(&mut out, "Subject", &encode_word(&message.subject));
    push_header(&mut out, "MIME-Version", "1.0");
    push_header(&mut out, "Content-Type", "text/plain; charset=UTF-8");
    push_header(&mut out, "Content-Transfer-Encoding", "base64");
    out.push_str("\r\n");

    let body = STANDARD.encode(message.body.as_bytes());
    for chunk in body.as_bytes().chunks(BODY_LINE_WIDTH) {
        // base64 output is ASCII
        out.push_str(&String::from_utf8_lossy(chunk));
        out.push_str("\r\n");
    }
    out
}

fn push_header(out: &mut String, name: &str, value: &str) {
    let value: String = value.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    out.push_str(name);
    out.push_str(": ");
    out.push_str(&value);
    out.push_str("\r\n");
}

/// RFC 2047 encoded-word for non-ASCII header text
fn encode_word(text: &str) -> String {
    if text.is_ascii() {
        text.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
    }
}
