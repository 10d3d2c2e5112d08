//! Sends one HTML message with a plain-text alternative and an attachment
//! over STARTTLS.
//!
//! Run with: `cargo run -p mailsend --example send_mail`

use mailsend::{
    Attachment, AuthMechanism, ContentType, Email, Encryption, Priority, ServerConfig,
    SmtpClient, send_email,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HOST: &str = "smtp.example.com";
const USERNAME: &str = "test@example.com";
const PASSWORD: &str = "examplepass";

const HTML_BODY: &str = r#"<html>
<head>
   <meta http-equiv="Content-Type" content="text/html; charset=utf-8" />
   <title>Hello Gophers!</title>
</head>
<body>
   <p>This is the <b>Go gopher</b>.</p>
   <p>Image created by Renee French</p>
</body>
</html>"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsend=debug,mailsend_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::builder(HOST)
        .encryption(Encryption::StartTls)
        .authentication(AuthMechanism::Login)
        .credentials(USERNAME, PASSWORD)
        .build();

    let mut client = SmtpClient::connect(config).await?;
    info!(tls = client.is_tls(), "connected");

    let mut email = Email::new();
    email
        .set_from("From Example <nube@example.com>")
        .add_to("xhit@example.com")
        .add_cc("otherto@example.com")
        .add_bcc("archive@example.com")
        .set_subject("New Go Email")
        .set_priority(Priority::High)
        .set_body(ContentType::text_html(), HTML_BODY)
        .add_alternative(ContentType::text_plain(), "This is the Go gopher.")
        .attach(Attachment::from_base64("filename", "Zm9v"));

    // Setter failures are kept until inspected.
    if let Some(err) = email.error() {
        anyhow::bail!("invalid message: {err}");
    }

    let message_id = send_email(&mut client, &email).await?;
    info!(%message_id, "sent");

    Ok(())
}
