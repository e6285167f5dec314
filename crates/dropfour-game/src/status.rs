//! Session status.

use serde::{Deserialize, Serialize};

/// Where the local session is in its lifecycle.
///
/// ```text
/// Idle → Waiting → Playing → Over
///                     ↑        │
///                     └────────┘  (rematch)
/// ```
///
/// - **Idle**: nothing has happened yet. Only reachable at construction.
/// - **Waiting**: queued for an opponent.
/// - **Playing**: matched; moves are flowing.
/// - **Over**: the server declared a result. The final board stays visible.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum GameStatus {
    #[default]
    Idle,
    Waiting,
    Playing,
    Over,
}

impl GameStatus {
    /// Returns `true` while a game is in progress.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// Returns `true` if `self → target` is one of the expected
    /// transitions.
    ///
    /// Server events are applied regardless (the server is authoritative);
    /// this only flags sequences worth logging.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::Waiting)
                | (Self::Waiting, Self::Playing)
                | (Self::Playing, Self::Playing)
                | (Self::Playing, Self::Over)
                | (Self::Over, Self::Waiting)
                | (Self::Over, Self::Playing)
        )
    }
}

impl std::fmt::Display for GameStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Waiting => write!(f, "Waiting"),
            Self::Playing => write!(f, "Playing"),
            Self::Over => write!(f, "Over"),
        }
    }
}
