//! Play dropfour from a terminal.
//!
//! ```text
//! DROPFOUR_TOKEN=<jwt> DROPFOUR_HOST=localhost:8080 cargo run -p dropfour-terminal
//! ```
//!
//! Commands: `find`, `move <column>`, `say <text>`, `board`, `quit`.
//! Logs go to stderr; set `RUST_LOG=debug` to see every frame.

use dropfour::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Find,
    Move(u8),
    Say(String),
    Board,
    Help,
    Quit,
}

fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word {
        "find" | "f" => Ok(Command::Find),
        "move" | "m" => rest
            .trim()
            .parse()
            .map(Command::Move)
            .map_err(|_| format!("not a column: {rest:?}")),
        "say" | "s" => Ok(Command::Say(rest.to_string())),
        "board" | "b" => Ok(Command::Board),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" => Ok(Command::Quit),
        other => Err(format!("unknown command {other:?}, try `help`")),
    }
}

const HELP: &str = "\
  find          look for a game (or a rematch)
  move <0-6>    drop a disc
  say <text>    chat with your opponent
  board         show the board
  quit          leave";

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn print_board(game: &GameStateMachine) {
    println!("{}", game.board());
    match game.status() {
        GameStatus::Playing if game.is_local_turn() => println!("your move"),
        GameStatus::Playing => println!("waiting for {}", game.active_player()),
        status => println!("({status})"),
    }
}

fn render<T: Connector>(client: &GameClient<T>, event: &SessionEvent) {
    match event {
        SessionEvent::Opened => println!("connected"),
        SessionEvent::Closed { reason } => match reason {
            Some(reason) => {
                println!("disconnected ({reason}); `find` to reconnect")
            }
            None => println!("disconnected; `find` to reconnect"),
        },
        SessionEvent::TransportError { message } => {
            println!("connection error: {message}")
        }
        SessionEvent::Waiting => println!("waiting for an opponent..."),
        SessionEvent::GameFound { lobby_id, color } => {
            println!("game {lobby_id}: you are {color}");
            for entry in client.chat() {
                println!("  {entry}");
            }
            print_board(client.game());
        }
        SessionEvent::MovePlayed { .. } => print_board(client.game()),
        SessionEvent::GameOver { outcome, .. } => match outcome {
            Some(outcome) => println!("{outcome} `find` for a rematch"),
            None => println!("game over"),
        },
        SessionEvent::Chat(entry) => println!("  {entry}"),
        SessionEvent::ServerError { code, message } => {
            println!("server refused ({code}): {message}")
        }
        SessionEvent::Rejected(e) => {
            tracing::warn!(error = %e, "ignored server event")
        }
        SessionEvent::FrameDropped { error } => {
            tracing::warn!(%error, "dropped frame")
        }
    }
}

/// Runs one command. Returns `false` to quit.
fn execute<T: Connector>(client: &mut GameClient<T>, command: Command) -> bool {
    let result = match command {
        Command::Find => client.seek_game(),
        Command::Move(column) => client.submit_move(column),
        Command::Say(text) => client.send_chat(&text),
        Command::Board => {
            print_board(client.game());
            Ok(())
        }
        Command::Help => {
            println!("{HELP}");
            Ok(())
        }
        Command::Quit => return false,
    };
    if let Err(e) = result {
        println!("{e}");
    }
    true
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let token = std::env::var("DROPFOUR_TOKEN")
        .map_err(|_| "set DROPFOUR_TOKEN to your bearer token")?;

    let mut config = ClientConfig::default();
    if let Ok(host) = std::env::var("DROPFOUR_HOST") {
        config = config.with_host(host);
    }
    if let Ok(base) = std::env::var("DROPFOUR_BASE_PATH") {
        config = config.with_base_path(base);
    }
    if std::env::var("DROPFOUR_SECURE").is_ok_and(|v| v == "1") {
        config = config.with_secure(true);
    }

    let mut client = GameClient::new(config, WebSocketConnector::new());
    let credential = client.login(&token)?;
    println!("logged in as {}", credential.username());
    client.seek_game()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse(&line) {
                    Ok(command) => {
                        if !execute(&mut client, command) {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
            }
            event = client.next_event() => render(&client, &event),
        }
    }

    client.close().await;
    Ok(())
}
