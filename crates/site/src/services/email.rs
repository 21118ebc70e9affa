//! Email relay for leads and orders.
//!
//! Every submission ends up as one message to the business mailbox. Messages
//! are `multipart/mixed`: a plain-text and HTML alternative rendered from
//! Askama templates, followed by any uploaded files as attachments.

use std::sync::Arc;

use askama::Template;
use chrono::{DateTime, FixedOffset, Utc};
use lettre::{
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{
        Attachment as MailAttachment, Mailbox, MultiPart, SinglePart,
        header::{ContentType, ContentTypeErr},
    },
    transport::{
        smtp::{Error as SmtpError, authentication::Credentials},
        stub::AsyncStubTransport,
    },
};
use secrecy::ExposeSecret;
use signpress_core::upload::OCTET_STREAM;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Attachment, Lead, LeadChannel, Order, QuoteRequest};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Stub transport error (tests only).
    #[error("Stub transport error: {0}")]
    Stub(String),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Attachment content type could not be parsed.
    #[error("Invalid content type: {0}")]
    ContentType(#[from] ContentTypeErr),
}

/// One labelled value in a lead summary.
struct Row {
    label: &'static str,
    value: String,
}

impl Row {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }

    fn optional(label: &'static str, value: Option<&str>) -> Option<Self> {
        value.map(|v| Self::new(label, v))
    }
}

/// HTML body for quote and click-to-contact leads.
#[derive(Template)]
#[template(path = "email/lead.html")]
struct LeadEmailHtml<'a> {
    heading: &'a str,
    rows: &'a [Row],
    action: Option<(&'a str, &'a str)>,
    received: &'a str,
}

/// Plain text body for quote and click-to-contact leads.
#[derive(Template)]
#[template(path = "email/lead.txt")]
struct LeadEmailText<'a> {
    heading: &'a str,
    rows: &'a [Row],
    action: Option<(&'a str, &'a str)>,
    received: &'a str,
}

/// One order line as shown in the email.
struct LineRow {
    name: String,
    slug: String,
    quantity: u32,
    unit_price: Option<String>,
    total: Option<String>,
    files: Vec<String>,
}

/// HTML body for orders.
#[derive(Template)]
#[template(path = "email/order.html")]
struct OrderEmailHtml<'a> {
    reference: &'a str,
    billing: &'a [Row],
    lines: &'a [LineRow],
    subtotal: Option<&'a str>,
    received: &'a str,
}

/// Plain text body for orders.
#[derive(Template)]
#[template(path = "email/order.txt")]
struct OrderEmailText<'a> {
    reference: &'a str,
    billing: &'a [Row],
    lines: &'a [LineRow],
    subtotal: Option<&'a str>,
    received: &'a str,
}

#[derive(Clone)]
enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Stub(Arc<AsyncStubTransport>),
}

/// Email service relaying submissions to the business mailbox.
#[derive(Clone)]
pub struct EmailService {
    transport: Transport,
    from: Mailbox,
    to: Mailbox,
}

impl std::fmt::Debug for EmailService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            Transport::Smtp(_) => "smtp",
            Transport::Stub(_) => "stub",
        };
        f.debug_struct("EmailService")
            .field("transport", &transport)
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .finish()
    }
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the relay host is invalid or an address does not parse.
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport: Transport::Smtp(mailer),
            from: parse_mailbox(&config.from_address)?,
            to: parse_mailbox(&config.to_address)?,
        })
    }

    /// Create a service that records messages instead of sending them.
    ///
    /// # Errors
    ///
    /// Returns error if an address does not parse.
    pub fn stub(from: &str, to: &str) -> Result<Self, EmailError> {
        Ok(Self {
            transport: Transport::Stub(Arc::new(AsyncStubTransport::new_ok())),
            from: parse_mailbox(from)?,
            to: parse_mailbox(to)?,
        })
    }

    /// Create a service whose relay refuses every message.
    ///
    /// # Errors
    ///
    /// Returns error if an address does not parse.
    pub fn failing_stub(from: &str, to: &str) -> Result<Self, EmailError> {
        Ok(Self {
            transport: Transport::Stub(Arc::new(AsyncStubTransport::new_error())),
            from: parse_mailbox(from)?,
            to: parse_mailbox(to)?,
        })
    }

    /// Raw messages recorded by a stub transport. Empty for SMTP.
    pub async fn outbox(&self) -> Vec<String> {
        match &self.transport {
            Transport::Smtp(_) => Vec::new(),
            Transport::Stub(stub) => stub
                .messages()
                .await
                .into_iter()
                .map(|(_, raw)| raw)
                .collect(),
        }
    }

    /// Relay a quote request.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the relay refuses.
    pub async fn send_quote(&self, quote: &QuoteRequest) -> Result<(), EmailError> {
        let mut rows = vec![Row::new("Name", quote.name.clone())];
        rows.extend(Row::optional("Company", quote.company.as_deref()));
        rows.extend(quote.phone.as_ref().map(|p| Row::new("Phone", p.display())));
        rows.extend(quote.email.as_ref().map(|e| Row::new("Email", e.as_str())));
        rows.push(Row::new("Service", quote.service_label()));
        rows.extend(Row::optional("Message", quote.message.as_deref()));
        rows.extend(
            quote
                .attachment
                .as_ref()
                .map(|a| Row::new("Attachment", a.file_name.clone())),
        );

        let subject = format!(
            "New quote request: {} from {}",
            quote.service_label(),
            quote.name
        );
        let action = quote
            .phone
            .as_ref()
            .map(|phone| ("Call back", phone.tel_link()));
        let reply_to = quote
            .email
            .as_ref()
            .map(|email| reply_mailbox(&quote.name, email.as_str()))
            .transpose()?;

        let received = dubai_time(Utc::now());
        let action = action.as_ref().map(|(label, url)| (*label, url.as_str()));
        let html = LeadEmailHtml {
            heading: "New quote request",
            rows: &rows,
            action,
            received: &received,
        }
        .render()?;
        let text = LeadEmailText {
            heading: "New quote request",
            rows: &rows,
            action,
            received: &received,
        }
        .render()?;

        self.send(
            &subject,
            reply_to,
            &text,
            &html,
            quote.attachment.iter(),
        )
        .await
    }

    /// Relay a WhatsApp click lead.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the relay refuses.
    pub async fn send_whatsapp_lead(&self, lead: &Lead) -> Result<(), EmailError> {
        self.send_lead(lead).await
    }

    /// Relay a phone click lead.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the relay refuses.
    pub async fn send_phone_lead(&self, lead: &Lead) -> Result<(), EmailError> {
        self.send_lead(lead).await
    }

    async fn send_lead(&self, lead: &Lead) -> Result<(), EmailError> {
        let mut rows = vec![
            Row::new("Name", lead.name.clone()),
            Row::new("Phone", lead.phone.display()),
            Row::new("Service", lead.service_label()),
            Row::new("Channel", lead.channel.label()),
        ];
        rows.extend(
            lead.duration_display()
                .map(|duration| Row::new("Call duration", duration)),
        );

        let (subject, heading, action_label) = match lead.channel {
            LeadChannel::WhatsApp => (
                format!("WhatsApp lead: {}", lead.name),
                "New WhatsApp lead",
                "Reply on WhatsApp",
            ),
            LeadChannel::Phone => (
                format!("Phone lead: {}", lead.name),
                "New phone lead",
                "Call back",
            ),
        };

        let link = lead.link();
        let received = dubai_time(Utc::now());
        let action = Some((action_label, link.as_str()));
        let html = LeadEmailHtml {
            heading,
            rows: &rows,
            action,
            received: &received,
        }
        .render()?;
        let text = LeadEmailText {
            heading,
            rows: &rows,
            action,
            received: &received,
        }
        .render()?;

        self.send(&subject, None, &text, &html, std::iter::empty())
            .await
    }

    /// Relay an assembled order with every line's documents attached.
    ///
    /// # Errors
    ///
    /// Returns error if the template fails to render or the relay refuses.
    pub async fn send_order(&self, order: &Order) -> Result<(), EmailError> {
        let billing = &order.billing;
        let mut rows = vec![
            Row::new("Name", billing.full_name.clone()),
            Row::new("Email", billing.email.as_str()),
            Row::new("Phone", billing.phone.display()),
        ];
        rows.extend(Row::optional("Company", billing.company.as_deref()));
        rows.extend(Row::optional("Address", billing.address.as_deref()));
        rows.extend(Row::optional("City", billing.city.as_deref()));
        rows.extend(Row::optional("Emirate", billing.emirate.as_deref()));
        rows.extend(Row::optional("Notes", billing.notes.as_deref()));

        let lines: Vec<LineRow> = order
            .lines
            .iter()
            .map(|line| LineRow {
                name: line.product_name.clone(),
                slug: line.product_slug.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price.map(|p| p.display()),
                total: line.line_total().map(|p| p.display()),
                files: line
                    .attachments
                    .iter()
                    .map(|a| a.file_name.clone())
                    .collect(),
            })
            .collect();
        let subtotal = order.subtotal().map(|p| p.display());
        let received = dubai_time(order.submitted_at);

        let html = OrderEmailHtml {
            reference: &order.reference,
            billing: &rows,
            lines: &lines,
            subtotal: subtotal.as_deref(),
            received: &received,
        }
        .render()?;
        let text = OrderEmailText {
            reference: &order.reference,
            billing: &rows,
            lines: &lines,
            subtotal: subtotal.as_deref(),
            received: &received,
        }
        .render()?;

        let subject = format!("New order {} from {}", order.reference, billing.full_name);
        let reply_to = Some(reply_mailbox(&billing.full_name, billing.email.as_str())?);

        self.send(&subject, reply_to, &text, &html, order.attachments())
            .await
    }

    /// Build and hand one message to the transport.
    async fn send<'a>(
        &self,
        subject: &str,
        reply_to: Option<Mailbox>,
        text_body: &str,
        html_body: &str,
        attachments: impl Iterator<Item = &'a Attachment>,
    ) -> Result<(), EmailError> {
        let subject = single_line(subject);

        let alternative = MultiPart::alternative()
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(text_body.to_string()),
            )
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_HTML)
                    .body(html_body.to_string()),
            );

        let mut body = MultiPart::mixed().multipart(alternative);
        let mut attached = 0_usize;
        let mut attached_bytes = 0_u64;
        for attachment in attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .or_else(|_| ContentType::parse(OCTET_STREAM))?;
            body = body.singlepart(
                MailAttachment::new(attachment.file_name.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
            attached += 1;
            attached_bytes += attachment.size();
        }

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject.clone());
        if let Some(reply_to) = reply_to {
            builder = builder.reply_to(reply_to);
        }
        let email = builder.multipart(body)?;

        match &self.transport {
            Transport::Smtp(mailer) => {
                mailer.send(email).await?;
            }
            Transport::Stub(stub) => {
                stub.send(email)
                    .await
                    .map_err(|e| EmailError::Stub(e.to_string()))?;
            }
        }

        tracing::info!(
            subject = %subject,
            attachments = attached,
            attachment_bytes = attached_bytes,
            "Email sent successfully"
        );
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, EmailError> {
    address
        .parse()
        .map_err(|_| EmailError::InvalidAddress(address.to_string()))
}

fn reply_mailbox(name: &str, email: &str) -> Result<Mailbox, EmailError> {
    let address: Address = email
        .parse()
        .map_err(|_| EmailError::InvalidAddress(email.to_string()))?;
    Ok(Mailbox::new(Some(single_line(name)), address))
}

/// Collapse line breaks so visitor input cannot add header lines.
fn single_line(value: &str) -> String {
    value
        .split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format a timestamp in Gulf Standard Time (UTC+4, no DST).
fn dubai_time(at: DateTime<Utc>) -> String {
    FixedOffset::east_opt(4 * 3600).map_or_else(
        || at.format("%d %b %Y, %H:%M UTC").to_string(),
        |gst| at.with_timezone(&gst).format("%d %b %Y, %H:%M GST").to_string(),
    )
}
