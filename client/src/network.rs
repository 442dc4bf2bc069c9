//! Client network layer: WebSocket connection and event loop

use crate::ui;
use futures_util::{SinkExt, StreamExt};
use log::{info, warn};
use shared::{ClientEvent, ServerEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A connected trivia client bound to one display name.
pub struct Client {
    websocket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    name: String,
}

impl Client {
    /// Opens the WebSocket connection to `server` (a `host:port` address).
    pub async fn connect(server: &str, name: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let url = format!("ws://{}", server);
        let (websocket, _) = connect_async(url.as_str()).await?;
        info!("Connected to {}", url);

        Ok(Client {
            websocket,
            name: name.to_string(),
        })
    }

    /// Registers, then runs the event loop: incoming server events are
    /// rendered to the terminal, stdin lines are sent as answers. Returns
    /// when the server closes the connection or stdin ends.
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.send(&ClientEvent::Register {
            name: self.name.clone(),
        })
        .await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                frame = self.websocket.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => handle_server_event(&text),
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!("Connection error: {}", err);
                            break;
                        }
                    }
                }
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            let choice = line.trim();
                            if !choice.is_empty() {
                                self.send(&ClientEvent::Answer {
                                    choice: choice.to_string(),
                                })
                                .await?;
                            }
                        }
                        _ => break,
                    }
                }
            }
        }

        Ok(())
    }

    async fn send(&mut self, event: &ClientEvent) -> Result<(), Box<dyn std::error::Error>> {
        let payload = serde_json::to_string(event)?;
        self.websocket.send(Message::Text(payload)).await?;
        Ok(())
    }
}

/// Renders one server event to the terminal. Unrecognized frames are
/// logged and skipped so a newer server cannot crash an older client.
fn handle_server_event(text: &str) {
    match serde_json::from_str::<ServerEvent>(text) {
        Ok(ServerEvent::Message { msg }) => println!("{}", msg),
        Ok(ServerEvent::Score { score }) => println!("Your score: {}", score),
        Ok(ServerEvent::Question(question)) => println!("{}", ui::format_question(&question)),
        Ok(ServerEvent::LeaderboardUpdate(entries)) => {
            println!("{}", ui::format_leaderboard(&entries));
        }
        Err(err) => warn!("Ignoring unrecognized server frame: {}", err),
    }
}
