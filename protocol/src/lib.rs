//! JSON messages exchanged with the ledger service.
//!
//! Both directions are internally tagged on `type`, one JSON object per message.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("reveal batch pairs {cells} cell indices with {counts} adjacency counts")]
    LengthMismatch { cells: usize, counts: usize },
    #[error("unknown difficulty code {0}")]
    UnknownDifficulty(u8),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Requests sent by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateGame {
        handle: u64,
        difficulty: u8,
    },
    RevealBatch {
        handle: u64,
        game_id: String,
        cell_indices: Vec<u32>,
        adjacent_mines: Vec<u8>,
    },
    FlagToggle {
        game_id: String,
        x: u8,
        y: u8,
    },
    WinClaim {
        game_id: String,
    },
}

impl ClientMessage {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::CreateGame { difficulty, .. } if !(1..=3).contains(difficulty) => {
                Err(ProtocolError::UnknownDifficulty(*difficulty))
            }
            Self::RevealBatch {
                cell_indices,
                adjacent_mines,
                ..
            } if cell_indices.len() != adjacent_mines.len() => Err(ProtocolError::LengthMismatch {
                cells: cell_indices.len(),
                counts: adjacent_mines.len(),
            }),
            _ => Ok(()),
        }
    }

    /// Validates then serializes.
    pub fn encode(&self) -> Result<String> {
        self.validate()?;
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(json: &str) -> Result<Self> {
        let message: Self = serde_json::from_str(json)?;
        message.validate()?;
        Ok(message)
    }
}

/// Events emitted by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameCreated { handle: u64, game_id: String },
    GameRejected { handle: u64, reason: String },
    BatchConfirmed { handle: u64 },
    BatchRejected { handle: u64, reason: String },
}

impl ServerMessage {
    pub fn handle(&self) -> u64 {
        match self {
            Self::GameCreated { handle, .. }
            | Self::GameRejected { handle, .. }
            | Self::BatchConfirmed { handle }
            | Self::BatchRejected { handle, .. } => *handle,
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(json: &str) -> Result<Self> {
        let message = serde_json::from_str(json)?;
        log::trace!("Decoded {:?}", message);
        Ok(message)
    }
}
