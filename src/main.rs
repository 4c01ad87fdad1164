//! Multi-room WebSocket Chat Client - Entry Point
//!
//! Thin terminal presentation over the session actor: reads lines from
//! stdin, renders session events, and offers a couple of slash commands.

use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use url::Url;

use roomchat::{ChatSession, RoomDirectory, SessionEvent};

/// Default chat endpoint
const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080/ws";

/// Buffer size for the session event stream
const EVENT_BUFFER_SIZE: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=roomchat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roomchat=info")),
        )
        .init();

    let mut args = env::args().skip(1);
    let (username, room) = match (args.next(), args.next()) {
        (Some(username), Some(room)) => (username, room),
        _ => {
            eprintln!("usage: roomchat <username> <room> [endpoint]");
            std::process::exit(2);
        }
    };
    let endpoint = Url::parse(&args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()))?;

    // Room suggestions are best-effort; the session works without them.
    let directory = RoomDirectory::from_endpoint(&endpoint)?;
    match directory.list_rooms().await {
        Ok(rooms) if !rooms.is_empty() => println!("* rooms: {}", join_names(&rooms)),
        Ok(_) => {}
        Err(e) => warn!("continuing without room suggestions: {}", e),
    }

    let (event_tx, mut events) = mpsc::channel(EVENT_BUFFER_SIZE);
    let (session, handle) = ChatSession::new(endpoint, event_tx);
    tokio::spawn(session.run());

    handle.join(&username, &room).await?;
    println!("* type to chat, /switch <room>, /join <room>, /rooms, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim().to_string();

                if let Some(room) = line.strip_prefix("/switch ") {
                    if let Err(e) = handle.switch_room(room).await {
                        eprintln!("! {e}");
                    }
                } else if let Some(room) = line.strip_prefix("/join ") {
                    // Manual re-initiation after a fatal connection loss.
                    if let Err(e) = handle.join(&username, room).await {
                        eprintln!("! {e}");
                    }
                } else if line == "/rooms" {
                    match directory.list_rooms().await {
                        Ok(rooms) => println!("* rooms: {}", join_names(&rooms)),
                        Err(e) => eprintln!("! {e}"),
                    }
                } else if line == "/quit" {
                    break;
                } else if !line.is_empty() {
                    if let Err(e) = handle.send_chat(&line).await {
                        eprintln!("! {e}");
                    }
                }
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                render(event);
            }
        }
    }

    Ok(())
}

fn join_names(rooms: &[roomchat::RoomName]) -> String {
    rooms
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print one session event
fn render(event: SessionEvent) {
    match event {
        SessionEvent::MessageReceived {
            username,
            content,
            received_at,
        } => println!("[{}] {}: {}", received_at.format("%H:%M"), username, content),
        SessionEvent::TypingObserved { username } => println!("... {} is typing", username),
        SessionEvent::UserListChanged { users } => println!("* online: {}", users.join(", ")),
        SessionEvent::SessionError { message } => eprintln!("! {}", message),
        SessionEvent::RoomChanged { room } => println!("* room: {}", room),
        SessionEvent::RoomAdded { room } => println!("* new room available: {}", room),
    }
}
