//! Sends a batch of messages over one connection, probing it with NOOP
//! while idle.
//!
//! Run with: `cargo run -p mailsend --example keep_alive`

use std::time::Duration;

use mailsend::{AuthMechanism, ContentType, Email, Encryption, ServerConfig, SmtpClient, send_email};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HOST: &str = "smtp.example.com";
const USERNAME: &str = "test@example.com";
const PASSWORD: &str = "examplepass";
const RECIPIENTS: &[&str] = &["aa@example.com", "bb@example.com", "cc@example.com"];
const PROBE_INTERVAL: Duration = Duration::from_secs(30);

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
        .authentication(AuthMechanism::CramMd5)
        .credentials(USERNAME, PASSWORD)
        .keep_alive(true)
        .connect_timeout(Duration::from_secs(10))
        .send_timeout(Duration::from_secs(10))
        .build();

    let mut client = SmtpClient::connect(config).await?;

    for to in RECIPIENTS {
        let mut email = Email::new();
        email
            .set_from("From Example <nube@example.com>")
            .add_to(to)
            .set_subject("New Go Email")
            .set_body(ContentType::text_html(), "<p>Hello Gophers!</p>");

        match send_email(&mut client, &email).await {
            Ok(message_id) => info!(%to, %message_id, "sent"),
            Err(e) => warn!(%to, ?e, "send failed"),
        }
        if !client.is_ready() {
            anyhow::bail!("connection closed after failed send");
        }
    }

    // Idle for a while, keeping the server from dropping us.
    let mut probe = tokio::time::interval(PROBE_INTERVAL);
    probe.tick().await;
    for _ in 0..2 {
        probe.tick().await;
        client.noop().await?;
        info!(sent = client.messages_sent(), "connection still alive");
    }

    client.quit().await?;
    Ok(())
}
