//! Codec trait and the JSON envelope implementation.
//!
//! A "codec" (coder/decoder) converts between typed messages and the text
//! frames that travel over the socket. Everything above this layer works
//! with [`WebsocketMessage`]; everything below it sees strings.
//!
//! The envelope is always:
//!
//! ```json
//! { "version": "v1", "type": "playMove", "payload": { "column": 3 } }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DecodeError, MessageType, ProtocolError, WebsocketMessage};

/// The only envelope version this client writes or accepts.
pub const PROTOCOL_VERSION: &str = "v1";

/// Turns messages into frames and frames into messages.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → the codec is moved into the background connection
///   task, which Tokio may run on any worker thread.
/// - `'static` → it owns everything it needs and borrows nothing from the
///   caller, so it can live as long as the connection does.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a message into an envelope stamped with
    /// [`PROTOCOL_VERSION`].
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode(
        &self,
        message: &WebsocketMessage,
    ) -> Result<String, ProtocolError>;

    /// Parses and validates an envelope.
    ///
    /// # Errors
    /// - [`DecodeError::Malformed`]: not an envelope, or the payload does
    ///   not fit its type
    /// - [`DecodeError::VersionMismatch`]: `version` is not `"v1"`
    /// - [`DecodeError::UnknownType`]: `type` is not a known message type
    fn decode(&self, text: &str) -> Result<WebsocketMessage, DecodeError>;
}

// ---------------------------------------------------------------------------
// Envelope shapes
// ---------------------------------------------------------------------------

/// Outbound envelope. Borrowing the payload avoids cloning it just to
/// serialize, and serializing the concrete payload type (instead of going
/// through `serde_json::Value`) keeps the declared field order on the wire.
#[derive(Serialize)]
struct EnvelopeOut<'a, P: Serialize> {
    version: &'a str,
    #[serde(rename = "type")]
    kind: MessageType,
    payload: &'a P,
}

/// Inbound envelope, first pass. `type` stays a plain string here so an
/// unknown tag can be reported as [`DecodeError::UnknownType`] rather than
/// as a generic parse failure, and the payload stays raw until we know
/// which struct it should become.
#[derive(Deserialize)]
struct EnvelopeIn {
    version: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Option<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] for the JSON envelope (via `serde_json`).
///
/// ## Example
///
/// ```rust
/// use dropfour_protocol::{Codec, JsonCodec, OutboundMessage};
///
/// let codec = JsonCodec;
/// let message = OutboundMessage::play_move(3).into_message();
///
/// let text = codec.encode(&message).unwrap();
/// assert_eq!(text, r#"{"version":"v1","type":"playMove","payload":{"column":3}}"#);
///
/// let decoded = codec.decode(&text).unwrap();
/// assert_eq!(decoded, message);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(
        &self,
        message: &WebsocketMessage,
    ) -> Result<String, ProtocolError> {
        let kind = message.kind();
        match message {
            WebsocketMessage::WaitingForGame(p) => envelope(kind, p),
            WebsocketMessage::FoundGame(p) => envelope(kind, p),
            WebsocketMessage::ChatMessage(p) => envelope(kind, p),
            WebsocketMessage::PlayMove(p) => envelope(kind, p),
            WebsocketMessage::PlayedMove(p) => envelope(kind, p),
            WebsocketMessage::GameOver(p) => envelope(kind, p),
            WebsocketMessage::Error(p) => envelope(kind, p),
        }
    }

    fn decode(&self, text: &str) -> Result<WebsocketMessage, DecodeError> {
        let raw: EnvelopeIn =
            serde_json::from_str(text).map_err(DecodeError::Malformed)?;

        if raw.version != PROTOCOL_VERSION {
            return Err(DecodeError::VersionMismatch(raw.version));
        }

        let Some(kind) = MessageType::from_wire(&raw.kind) else {
            return Err(DecodeError::UnknownType(raw.kind));
        };

        // A missing or null payload is read as `{}`.
        let payload = raw
            .payload
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        let message = match kind {
            MessageType::WaitingForGame => {
                WebsocketMessage::WaitingForGame(payload_as(payload)?)
            }
            MessageType::FoundGame => {
                WebsocketMessage::FoundGame(payload_as(payload)?)
            }
            MessageType::ChatMessage => {
                WebsocketMessage::ChatMessage(payload_as(payload)?)
            }
            MessageType::PlayMove => {
                WebsocketMessage::PlayMove(payload_as(payload)?)
            }
            MessageType::PlayedMove => {
                WebsocketMessage::PlayedMove(payload_as(payload)?)
            }
            MessageType::GameOver => {
                WebsocketMessage::GameOver(payload_as(payload)?)
            }
            MessageType::Error => WebsocketMessage::Error(payload_as(payload)?),
        };
        Ok(message)
    }
}

fn envelope<P: Serialize>(
    kind: MessageType,
    payload: &P,
) -> Result<String, ProtocolError> {
    let out = EnvelopeOut {
        version: PROTOCOL_VERSION,
        kind,
        payload,
    };
    serde_json::to_string(&out).map_err(ProtocolError::Encode)
}

fn payload_as<T: DeserializeOwned>(
    payload: serde_json::Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(payload).map_err(DecodeError::Malformed)
}
