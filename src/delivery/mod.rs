//! Build the MIME message for a report and hand it to a [`MailSender`].

pub mod gmail;

use crate::error::PipelineError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, Message, MultiPart};
use std::error::Error;
use tracing::{error, info, instrument};

/// Anything that can transmit an encoded message and report its id.
pub trait MailSender {
    /// Send a base64url-encoded RFC 5322 message. Returns the provider's
    /// message id.
    async fn send(&self, raw: &str) -> Result<String, Box<dyn Error>>;
}

fn mailbox(addr: &str, key: &str) -> Result<Mailbox, PipelineError> {
    addr.parse()
        .map_err(|e| PipelineError::Config(format!("{key} is not a valid address: {e}")))
}

/// Encode `html` (and `plain`, as a multipart/alternative sibling) for the
/// send endpoint.
pub fn build_raw_message(
    from: &str,
    to: &str,
    subject: &str,
    html: &str,
    plain: Option<&str>,
) -> Result<String, Box<dyn Error>> {
    let builder = Message::builder()
        .from(mailbox(from, "sender")?)
        .to(mailbox(to, "recipient")?)
        .subject(subject);
    let message = match plain {
        Some(plain) => builder.multipart(MultiPart::alternative_plain_html(
            plain.to_string(),
            html.to_string(),
        ))?,
        None => builder
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())?,
    };
    Ok(URL_SAFE.encode(message.formatted()))
}

/// Send one report. Any failure aborts; there are no retries here.
#[instrument(level = "info", skip_all, fields(to = %to, subject = %subject))]
pub async fn deliver<M: MailSender>(
    sender: &M,
    from: &str,
    to: &str,
    subject: &str,
    html: &str,
    plain: Option<&str>,
) -> Result<String, Box<dyn Error>> {
    let raw = build_raw_message(from, to, subject, html, plain)?;
    match sender.send(&raw).await {
        Ok(id) => {
            info!(message_id = %id, "Report delivered");
            Ok(id)
        }
        Err(e) => {
            error!(error = %e, "Report delivery failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSender {
        sent: RefCell<Vec<String>>,
    }

    impl MailSender for RecordingSender {
        async fn send(&self, raw: &str) -> Result<String, Box<dyn Error>> {
            self.sent.borrow_mut().push(raw.to_string());
            Ok("msg-1".to_string())
        }
    }

    struct RejectingSender;

    impl MailSender for RejectingSender {
        async fn send(&self, _raw: &str) -> Result<String, Box<dyn Error>> {
            Err(Box::new(PipelineError::Auth("token expired".to_string())))
        }
    }

    fn decode(raw: &str) -> String {
        String::from_utf8(URL_SAFE.decode(raw).unwrap()).unwrap()
    }

    #[test]
    fn test_multipart_message_carries_both_parts() {
        let raw = build_raw_message(
            "bi@artplan.com.br",
            "marketing@betmgm.com.br",
            "Farol 06/05/2025",
            "<h1>Relatório</h1>",
            Some("Relatório"),
        )
        .unwrap();
        assert!(!raw.contains('+') && !raw.contains('/'));
        let text = decode(&raw);
        assert!(text.contains("multipart/alternative"));
        assert!(text.contains("text/plain"));
        assert!(text.contains("text/html"));
        assert!(text.contains("To: marketing@betmgm.com.br"));
    }

    #[test]
    fn test_html_only_message() {
        let text = decode(
            &build_raw_message("a@b.com", "c@d.com", "Assunto", "<p>oi</p>", None).unwrap(),
        );
        assert!(text.contains("text/html"));
        assert!(!text.contains("multipart"));
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        let err = build_raw_message("not an address", "c@d.com", "s", "h", None).unwrap_err();
        assert!(err.to_string().contains("sender"));
    }

    #[tokio::test]
    async fn test_deliver_returns_message_id() {
        let sender = RecordingSender::default();
        let id = deliver(&sender, "a@b.com", "c@d.com", "Assunto", "<p>oi</p>", Some("oi"))
            .await
            .unwrap();
        assert_eq!(id, "msg-1");
        assert_eq!(sender.sent.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_deliver_propagates_auth_failure() {
        let err = deliver(&RejectingSender, "a@b.com", "c@d.com", "s", "h", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("authentication"));
    }
}
