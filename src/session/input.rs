// src/session/input.rs

//! Turning terminal input into session events.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::SessionEvent;

/// Map one line typed by the user to an event.
///
/// - empty line or `Get`: run again
/// - `Back`: drop the last word of the command
/// - `Auto`: toggle auto mode
/// - `Del` or `Quit`: stop
/// - anything else: append it to the command
pub fn parse_line(line: &str) -> SessionEvent {
    match line.trim() {
        "" | "Get" => SessionEvent::Get,
        "Back" => SessionEvent::Back,
        "Auto" => SessionEvent::ToggleAuto,
        "Del" | "Quit" => SessionEvent::Quit,
        text => SessionEvent::Append(text.to_string()),
    }
}

/// Read stdin line by line in the background and forward parsed events.
///
/// End of input just stops the reader; the session keeps running until it
/// is told to quit by some other source.
pub fn spawn_stdin_reader(tx: mpsc::Sender<SessionEvent>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(parse_line(&line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    break;
                }
                Err(err) => {
                    warn!(error = %err, "reading stdin failed");
                    break;
                }
            }
        }
    });
}

/// Forward Ctrl-C as `Quit`.
pub fn spawn_ctrl_c(tx: mpsc::Sender<SessionEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(SessionEvent::Quit).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_events() {
        assert_eq!(parse_line(""), SessionEvent::Get);
        assert_eq!(parse_line(" Get "), SessionEvent::Get);
        assert_eq!(parse_line("Back"), SessionEvent::Back);
        assert_eq!(parse_line("Auto"), SessionEvent::ToggleAuto);
        assert_eq!(parse_line("Del"), SessionEvent::Quit);
    }

    #[test]
    fn other_text_is_appended() {
        assert_eq!(parse_line("--verbose"), SessionEvent::Append("--verbose".to_string()));
        assert_eq!(parse_line("get"), SessionEvent::Append("get".to_string()));
    }
}
