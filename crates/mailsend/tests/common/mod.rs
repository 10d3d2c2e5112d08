//! Minimal SMTP server for facade tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// One accepted transaction.
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub from: String,
    pub recipients: Vec<String>,
    pub data: String,
}

/// Accepts everything and records commands and deliveries.
#[derive(Debug, Clone)]
pub struct MockServer {
    addr: SocketAddr,
    commands: Arc<Mutex<Vec<String>>>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = Self {
            addr: listener.local_addr().unwrap(),
            commands: Arc::default(),
            deliveries: Arc::default(),
        };

        let handle = server.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                let handle = handle.clone();
                tokio::spawn(async move {
                    let _ = handle.serve(socket).await;
                });
            }
        });
        server
    }

    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Command verbs in arrival order.
    pub async fn verbs(&self) -> Vec<String> {
        self.commands
            .lock()
            .await
            .iter()
            .map(|c| c.split([' ', ':']).next().unwrap_or_default().to_uppercase())
            .collect()
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    async fn serve(&self, socket: TcpStream) -> std::io::Result<()> {
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut current = Delivery::default();

        write.write_all(b"220 mock.test ESMTP ready\r\n").await?;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(());
            }
            let line = line.trim_end().to_string();
            self.commands.lock().await.push(line.clone());
            let upper = line.to_uppercase();

            let reply: &[u8] = if upper.starts_with("EHLO") {
                b"250-mock.test\r\n250-SIZE 1048576\r\n250 AUTH PLAIN\r\n"
            } else if upper.starts_with("AUTH") {
                b"235 2.7.0 Authentication successful\r\n"
            } else if upper.starts_with("MAIL FROM:") {
                current = Delivery {
                    from: angle(&line),
                    ..Delivery::default()
                };
                b"250 OK\r\n"
            } else if upper.starts_with("RCPT TO:") {
                current.recipients.push(angle(&line));
                b"250 OK\r\n"
            } else if upper == "DATA" {
                write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await?;
                loop {
                    let mut data_line = String::new();
                    if reader.read_line(&mut data_line).await? == 0 {
                        return Ok(());
                    }
                    if data_line == ".\r\n" {
                        break;
                    }
                    let unstuffed = data_line.strip_prefix('.').unwrap_or(&data_line);
                    current.data.push_str(unstuffed);
                }
                self.deliveries.lock().await.push(std::mem::take(&mut current));
                b"250 OK queued\r\n"
            } else if upper == "RSET" || upper == "NOOP" {
                b"250 OK\r\n"
            } else if upper == "QUIT" {
                write.write_all(b"221 Bye\r\n").await?;
                return Ok(());
            } else {
                b"500 Unrecognized command\r\n"
            };
            write.write_all(reply).await?;
        }
    }
}

fn angle(line: &str) -> String {
    let start = line.find('<').map_or(0, |i| i + 1);
    let end = line.rfind('>').unwrap_or(line.len());
    line[start..end].to_string()
}
