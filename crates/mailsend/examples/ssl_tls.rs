//! Sends a plain-text message over implicit TLS (port 465) using a
//! settings document.
//!
//! Run with: `cargo run -p mailsend --example ssl_tls`

use mailsend::{ContentType, Email, Settings, SmtpClient, send_email};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SETTINGS: &str = r#"{
    "host": "smtp.example.com",
    "username": "test@example.com",
    "password": "examplepass",
    "encryption": "ssl-tls",
    "authentication": "plain",
    "connect_timeout_secs": 10,
    "send_timeout_secs": 10
}"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailsend=debug,mailsend_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Settings::from_json(SETTINGS)?.server_config()?;
    info!(host = config.host(), port = config.port(), "connecting");
    let mut client = SmtpClient::connect(config).await?;

    let mut email = Email::new();
    email
        .set_from("nube@example.com")
        .add_to("xhit@example.com")
        .set_subject("Implicit TLS")
        .set_date("2023-01-01 12:00:00 UTC")
        .set_body(ContentType::text_plain(), "Sent over SSL/TLS.");

    send_email(&mut client, &email).await?;
    Ok(())
}
