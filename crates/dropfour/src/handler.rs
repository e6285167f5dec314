//! Routing decoded messages to per-type callbacks.
//!
//! [`MessageHandler`] has one method per inbound message kind plus the
//! connection lifecycle hooks. [`dispatch`] matches exhaustively on
//! [`WebsocketMessage`], so a new message kind cannot be added without
//! deciding where it goes.

use dropfour_protocol::{
    ChatMessagePayload, DecodeError, ErrorPayload, FoundGamePayload,
    GameOverPayload, PlayMovePayload, PlayedMovePayload,
    WaitingForGamePayload, WebsocketMessage,
};
use dropfour_transport::{CloseReason, TransportError};

use crate::ConnectionEventKind;

/// Receives inbound traffic, one call per event, in arrival order.
///
/// The game callbacks are required. The lifecycle hooks and
/// [`on_server_error`](Self::on_server_error) default to logging.
pub trait MessageHandler {
    fn on_waiting_for_game(&mut self, payload: WaitingForGamePayload);

    fn on_found_game(&mut self, payload: FoundGamePayload);

    fn on_chat_message(&mut self, payload: ChatMessagePayload);

    fn on_played_move(&mut self, payload: PlayedMovePayload);

    fn on_game_over(&mut self, payload: GameOverPayload);

    /// The server rejected one of our frames.
    fn on_server_error(&mut self, payload: ErrorPayload) {
        tracing::warn!(code = payload.code, err = %payload.err, "server rejected a frame");
    }

    fn on_open(&mut self) {}

    fn on_close(&mut self, reason: Option<&CloseReason>) {
        let _ = reason;
    }

    fn on_error(&mut self, error: &TransportError) {
        let _ = error;
    }

    fn on_frame_dropped(&mut self, error: &DecodeError) {
        let _ = error;
    }
}

/// Calls the handler method for `message`'s type.
pub fn dispatch<H>(handler: &mut H, message: WebsocketMessage)
where
    H: MessageHandler + ?Sized,
{
    match message {
        WebsocketMessage::WaitingForGame(p) => handler.on_waiting_for_game(p),
        WebsocketMessage::FoundGame(p) => handler.on_found_game(p),
        WebsocketMessage::ChatMessage(p) => handler.on_chat_message(p),
        WebsocketMessage::PlayedMove(p) => handler.on_played_move(p),
        WebsocketMessage::GameOver(p) => handler.on_game_over(p),
        WebsocketMessage::Error(p) => handler.on_server_error(p),
        WebsocketMessage::PlayMove(PlayMovePayload { column }) => {
            // Client-to-server only.
            tracing::warn!(column, "ignoring playMove sent by the server");
        }
    }
}

/// Calls the handler method for a connection event.
pub fn dispatch_event<H>(handler: &mut H, event: ConnectionEventKind)
where
    H: MessageHandler + ?Sized,
{
    match event {
        ConnectionEventKind::Opened => handler.on_open(),
        ConnectionEventKind::Message(message) => dispatch(handler, message),
        ConnectionEventKind::FrameDropped(e) => handler.on_frame_dropped(&e),
        ConnectionEventKind::Error(e) => handler.on_error(&e),
        ConnectionEventKind::Closed(reason) => {
            handler.on_close(reason.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use dropfour_protocol::{Board, Color, Codec, JsonCodec};

    use super::*;

    /// Records which callback fired.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl MessageHandler for Recorder {
        fn on_waiting_for_game(&mut self, _: WaitingForGamePayload) {
            self.calls.push("waiting");
        }
        fn on_found_game(&mut self, _: FoundGamePayload) {
            self.calls.push("found");
        }
        fn on_chat_message(&mut self, _: ChatMessagePayload) {
            self.calls.push("chat");
        }
        fn on_played_move(&mut self, _: PlayedMovePayload) {
            self.calls.push("played");
        }
        fn on_game_over(&mut self, _: GameOverPayload) {
            self.calls.push("over");
        }
        fn on_open(&mut self) {
            self.calls.push("open");
        }
        fn on_close(&mut self, _: Option<&CloseReason>) {
            self.calls.push("close");
        }
        fn on_frame_dropped(&mut self, _: &DecodeError) {
            self.calls.push("dropped");
        }
    }

    #[test]
    fn test_dispatch_routes_by_type() {
        let mut recorder = Recorder::default();
        let messages = [
            WebsocketMessage::WaitingForGame(WaitingForGamePayload {}),
            WebsocketMessage::FoundGame(FoundGamePayload {
                lobby_id: "L1".into(),
                color: Color::Red,
                state: Board::empty(),
                last_played: Color::None,
                messages: vec![],
            }),
            WebsocketMessage::PlayedMove(PlayedMovePayload {
                color: Color::Red,
                row: 5,
                column: 0,
            }),
            WebsocketMessage::ChatMessage(ChatMessagePayload {
                from: "a".into(),
                text: "hi".into(),
            }),
            WebsocketMessage::GameOver(GameOverPayload { winner: Color::Red }),
        ];
        for message in messages {
            dispatch(&mut recorder, message);
        }
        assert_eq!(
            recorder.calls,
            ["waiting", "found", "played", "chat", "over"]
        );
    }

    #[test]
    fn test_inbound_play_move_is_ignored() {
        let mut recorder = Recorder::default();
        dispatch(
            &mut recorder,
            WebsocketMessage::PlayMove(PlayMovePayload { column: 1 }),
        );
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_server_error_has_a_default() {
        let mut recorder = Recorder::default();
        let message = JsonCodec
            .decode(r#"{"version":"v1","type":"error","payload":{"code":1003,"err":"column full"}}"#)
            .unwrap();
        dispatch(&mut recorder, message);
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn test_dispatch_event_lifecycle() {
        let mut recorder = Recorder::default();
        dispatch_event(&mut recorder, ConnectionEventKind::Opened);
        let dropped = JsonCodec.decode("nope").unwrap_err();
        dispatch_event(
            &mut recorder,
            ConnectionEventKind::FrameDropped(dropped),
        );
        dispatch_event(
            &mut recorder,
            ConnectionEventKind::Closed(Some(CloseReason::normal())),
        );
        assert_eq!(recorder.calls, ["open", "dropped", "close"]);
    }
}
