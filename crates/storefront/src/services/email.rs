//! Transactional email over SMTP.
//!
//! Uses lettre for delivery with Askama HTML and plain-text templates.
//! Every send is best-effort from the caller's point of view; see
//! [`Notifier`].

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use akaar_core::Money;

use crate::config::EmailConfig;
use crate::models::{Order, QuoteRequest};

/// Display name used in the `From` header.
const COMPANY_NAME: &str = "Akaar 3D Printing Solutions";

/// A rendered order line.
struct LineItem {
    name: String,
    quantity: i32,
    unit_price: String,
    total_price: String,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    items: &'a [LineItem],
    total: &'a str,
    recipient: &'a str,
    address: &'a str,
    orders_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_number: &'a str,
    items: &'a [LineItem],
    total: &'a str,
    recipient: &'a str,
    address: &'a str,
    orders_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/quote_received.html")]
struct QuoteReceivedHtml<'a> {
    name: &'a str,
    quote_number: &'a str,
    service: &'a str,
    material: &'a str,
    quantity: i32,
    quotes_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/quote_received.txt")]
struct QuoteReceivedText<'a> {
    name: &'a str,
    quote_number: &'a str,
    service: &'a str,
    material: &'a str,
    quantity: i32,
    quotes_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    name: &'a str,
    reset_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeHtml<'a> {
    name: &'a str,
    base_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeText<'a> {
    name: &'a str,
    base_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

fn rupees(amount: Decimal) -> String {
    Money::inr(amount).display()
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    base_url: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// `base_url` is the public web app URL used for links in message bodies.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured or the sender
    /// address is invalid.
    pub fn new(config: &EmailConfig, base_url: &str) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        let address = config
            .from_address
            .parse()
            .map_err(|_| EmailError::InvalidAddress(config.from_address.clone()))?;

        Ok(Self {
            mailer,
            from: Mailbox::new(Some(COMPANY_NAME.to_string()), address),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Send the confirmation for a paid order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let items: Vec<LineItem> = order
            .items
            .iter()
            .map(|item| LineItem {
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: rupees(item.unit_price),
                total_price: rupees(item.total_price),
            })
            .collect();
        let total = rupees(order.total);
        let address = &order.shipping_address;
        let recipient = format!("{} {}", address.first_name, address.last_name);
        let one_line = address.one_line();
        let orders_url = format!("{}/account/orders", self.base_url);

        let html = OrderConfirmationHtml {
            order_number: &order.order_number,
            items: &items,
            total: &total,
            recipient: &recipient,
            address: &one_line,
            orders_url: &orders_url,
        }
        .render()?;
        let text = OrderConfirmationText {
            order_number: &order.order_number,
            items: &items,
            total: &total,
            recipient: &recipient,
            address: &one_line,
            orders_url: &orders_url,
        }
        .render()?;

        self.send_multipart_email(
            &order.email,
            &format!("Order Confirmed - {}", order.order_number),
            &text,
            &html,
        )
        .await
    }

    /// Acknowledge a quote request.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_quote_received(&self, quote: &QuoteRequest) -> Result<(), EmailError> {
        let quotes_url = format!("{}/account/quotes", self.base_url);

        let html = QuoteReceivedHtml {
            name: &quote.name,
            quote_number: &quote.quote_number,
            service: &quote.service,
            material: &quote.material,
            quantity: quote.quantity,
            quotes_url: &quotes_url,
        }
        .render()?;
        let text = QuoteReceivedText {
            name: &quote.name,
            quote_number: &quote.quote_number,
            service: &quote.service,
            material: &quote.material,
            quantity: quote.quantity,
            quotes_url: &quotes_url,
        }
        .render()?;

        self.send_multipart_email(
            &quote.email,
            &format!("Quote Request Received - {}", quote.quote_number),
            &text,
            &html,
        )
        .await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: Option<&str>,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let name = name.filter(|n| !n.is_empty()).unwrap_or("there");
        let html = PasswordResetHtml { name, reset_url }.render()?;
        let text = PasswordResetText { name, reset_url }.render()?;

        self.send_multipart_email(to, "Reset Your Password - Akaar", &text, &html)
            .await
    }

    /// Send a welcome email after registration.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_welcome(&self, to: &str, name: Option<&str>) -> Result<(), EmailError> {
        let name = name.filter(|n| !n.is_empty()).unwrap_or("there");
        let base_url = self.base_url.as_str();
        let html = WelcomeHtml { name, base_url }.render()?;
        let text = WelcomeText { name, base_url }.render()?;

        self.send_multipart_email(
            to,
            "Welcome to Akaar - We Give AKAAR to Ideas",
            &text,
            &html,
        )
        .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Best-effort notification dispatch.
///
/// Failures are logged at WARN and never returned. With no SMTP
/// configuration every send is skipped with an INFO log.
#[derive(Clone, Default)]
pub struct Notifier {
    email: Option<EmailService>,
}

impl Notifier {
    #[must_use]
    pub const fn new(email: Option<EmailService>) -> Self {
        Self { email }
    }

    /// Notifier that never sends.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { email: None }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.email.is_some()
    }

    pub async fn order_confirmation(&self, order: &Order) {
        let Some(email) = &self.email else {
            tracing::info!(order_number = %order.order_number, "Email not configured, skipping order confirmation");
            return;
        };
        if let Err(e) = email.send_order_confirmation(order).await {
            tracing::warn!(error = %e, order_number = %order.order_number, "Failed to send order confirmation");
        }
    }

    pub async fn quote_received(&self, quote: &QuoteRequest) {
        let Some(email) = &self.email else {
            tracing::info!(quote_number = %quote.quote_number, "Email not configured, skipping quote acknowledgement");
            return;
        };
        if let Err(e) = email.send_quote_received(quote).await {
            tracing::warn!(error = %e, quote_number = %quote.quote_number, "Failed to send quote acknowledgement");
        }
    }

    pub async fn password_reset(&self, to: &str, name: Option<&str>, reset_url: &str) {
        let Some(email) = &self.email else {
            tracing::info!("Email not configured, skipping password reset email");
            return;
        };
        if let Err(e) = email.send_password_reset(to, name, reset_url).await {
            tracing::warn!(error = %e, "Failed to send password reset email");
        }
    }

    pub async fn welcome(&self, to: &str, name: Option<&str>) {
        let Some(email) = &self.email else {
            tracing::info!("Email not configured, skipping welcome email");
            return;
        };
        if let Err(e) = email.send_welcome(to, name).await {
            tracing::warn!(error = %e, "Failed to send welcome email");
        }
    }
}
