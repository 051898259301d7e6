//! Email Notifications
//!
//! Thin SMTP sender for the two notification kinds the ledger produces:
//! per-participant payment reminders and the aggregate monthly summary for
//! an administrator. The interesting data (who is late, totals) is computed
//! by the metrics engine; this module only formats and ships it.

use anyhow::Result;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::SmtpConfig;

/// Aggregate figures for the admin summary mail.
#[derive(Debug)]
pub struct MonthlySummary {
    pub total_confirmed: f64,
    pub total_pending: f64,
    pub late_count: usize,
    /// (name, status line) per participant
    pub details: Vec<(String, String)>,
    pub currency: String,
}

pub struct EmailService {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    async fn send_html(&self, to: &str, subject: &str, html: String) -> Result<()> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html)?;

        self.transport.send(message).await?;
        tracing::info!("Email sent to {to}");
        Ok(())
    }

    /// Remind one participant that a month's contribution is missing.
    pub async fn send_payment_reminder(
        &self,
        name: &str,
        email: &str,
        month: &str,
        amount: f64,
        currency: &str,
    ) -> Result<()> {
        let subject = format!("Payment reminder ({month})");
        let html = format!(
            "<html><body>\
             <h2>Payment reminder</h2>\
             <p>Hello {name},</p>\
             <p>Your contribution for <strong>{month}</strong> has not been \
             recorded yet.</p>\
             <p style=\"font-size:24px\"><strong>{amount:.2} {currency}</strong></p>\
             <p>Once the transfer is done, please declare it on the platform.</p>\
             </body></html>"
        );

        self.send_html(email, &subject, html).await
    }

    /// Monthly aggregate for an administrator.
    pub async fn send_monthly_summary(
        &self,
        admin_email: &str,
        summary: &MonthlySummary,
    ) -> Result<()> {
        self.send_html(admin_email, "Monthly summary", summary_html(summary))
            .await
    }
}

fn summary_html(summary: &MonthlySummary) -> String {
    let rows: String = summary
        .details
        .iter()
        .map(|(name, status)| format!("<tr><td>{name}</td><td>{status}</td></tr>"))
        .collect();

    format!(
        "<html><body>\
         <h2>Monthly summary</h2>\
         <p>Confirmed: <strong>{confirmed:.2} {currency}</strong></p>\
         <p>Pending: <strong>{pending:.2} {currency}</strong></p>\
         <p>Participants late: <strong>{late}</strong></p>\
         <table><tr><th>Name</th><th>Status</th></tr>{rows}</table>\
         </body></html>",
        confirmed = summary.total_confirmed,
        pending = summary.total_pending,
        late = summary.late_count,
        currency = summary.currency,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_html_lists_every_participant() {
        let summary = MonthlySummary {
            total_confirmed: 150.0,
            total_pending: 50.0,
            late_count: 1,
            details: vec![
                ("Alice".to_string(), "up to date".to_string()),
                ("Bob".to_string(), "100.00 CHF missing".to_string()),
            ],
            currency: "CHF".to_string(),
        };

        let html = summary_html(&summary);
        assert!(html.contains("150.00 CHF"));
        assert!(html.contains("50.00 CHF"));
        assert!(html.contains("Participants late: <strong>1</strong>"));
        assert!(html.contains("<td>Alice</td><td>up to date</td>"));
        assert!(html.contains("<td>Bob</td><td>100.00 CHF missing</td>"));
    }
}
