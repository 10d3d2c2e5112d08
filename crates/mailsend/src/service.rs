//! Sending built messages.
//!
//! Bridges [`Email`] and [`SmtpClient`]: the message is rendered, its
//! envelope (including Bcc) converted to SMTP addresses, and the bytes
//! handed to the client.

use mailsend_mime::{Email, WireMessage};
use mailsend_smtp::{Address, Envelope, SmtpClient};
use tracing::{debug, info};

use crate::error::Result;

/// Builds `email` and sends it over `client`.
///
/// Returns the generated `Message-ID`. Builder errors (including one
/// recorded by an earlier setter) are reported before anything reaches the
/// server, so the connection stays usable.
///
/// # Errors
///
/// Returns [`Error::Message`](crate::Error::Message) if the message cannot
/// be built and [`Error::Smtp`](crate::Error::Smtp) if delivery fails.
pub async fn send_email(client: &mut SmtpClient, email: &Email) -> Result<String> {
    let wire = email.build()?;
    let envelope = envelope_for(&wire)?;

    debug!(
        from = %envelope.from().as_str(),
        recipients = envelope.recipients().len(),
        bytes = wire.as_bytes().len(),
        "Sending message"
    );
    client.send(&envelope, wire.as_bytes()).await?;
    info!(message_id = %wire.message_id(), "Message delivered");

    Ok(wire.message_id().to_string())
}

/// Converts the envelope of a built message into SMTP addresses.
///
/// # Errors
///
/// Returns an error if an address cannot be used on the SMTP command line.
pub fn envelope_for(wire: &WireMessage) -> Result<Envelope> {
    let from = Address::new(wire.sender())?;
    let recipients = wire
        .recipients()
        .iter()
        .map(Address::new)
        .collect::<mailsend_smtp::Result<Vec<_>>>()?;
    Ok(Envelope::new(from, recipients)?)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use mailsend_mime::ContentType;

    #[test]
    fn test_envelope_includes_bcc() {
        let mut email = Email::new();
        email
            .set_from("Sender <sender@example.com>")
            .set_return_path("bounce@example.com")
            .add_to("to@example.com")
            .add_bcc("bcc@example.com")
            .set_body(ContentType::text_plain(), "hi");

        let envelope = envelope_for(&email.build().unwrap()).unwrap();
        assert_eq!(envelope.from().as_str(), "bounce@example.com");
        let recipients: Vec<&str> = envelope.recipients().iter().map(Address::as_str).collect();
        assert_eq!(recipients, ["to@example.com", "bcc@example.com"]);
    }
}
