//! In-process stand-in for the remote ledger.
//!
//! Intents arrive over the session's channel, travel through the JSON wire format
//! both ways, and are answered a fixed number of ticks later.

use std::collections::VecDeque;

use anyhow::{Context, bail};
use chainsweeper_core::{
    Difficulty, LedgerIntent, LedgerNotice, RemoteGameId, SubmissionHandle,
};
use chainsweeper_protocol::{ClientMessage, ServerMessage};
use futures_channel::mpsc::UnboundedReceiver;

pub fn to_wire(intent: LedgerIntent) -> ClientMessage {
    match intent {
        LedgerIntent::CreateGame { handle, difficulty } => ClientMessage::CreateGame {
            handle: handle.0,
            difficulty: difficulty.code(),
        },
        LedgerIntent::SubmitRevealBatch {
            handle,
            game,
            cell_indices,
            adjacent_mines,
        } => ClientMessage::RevealBatch {
            handle: handle.0,
            game_id: game.as_str().to_owned(),
            cell_indices,
            adjacent_mines,
        },
        LedgerIntent::ToggleFlag {
            game,
            coords: (x, y),
        } => ClientMessage::FlagToggle {
            game_id: game.as_str().to_owned(),
            x,
            y,
        },
        LedgerIntent::ClaimWin { game } => ClientMessage::WinClaim {
            game_id: game.as_str().to_owned(),
        },
    }
}

pub fn from_wire(message: ServerMessage) -> LedgerNotice {
    match message {
        ServerMessage::GameCreated { handle, game_id } => LedgerNotice::GameCreated {
            handle: SubmissionHandle(handle),
            game: RemoteGameId::new(game_id),
        },
        ServerMessage::GameRejected { handle, reason } => LedgerNotice::GameCreationFailed {
            handle: SubmissionHandle(handle),
            reason,
        },
        ServerMessage::BatchConfirmed { handle } => LedgerNotice::BatchConfirmed {
            handle: SubmissionHandle(handle),
        },
        ServerMessage::BatchRejected { handle, reason } => LedgerNotice::BatchRejected {
            handle: SubmissionHandle(handle),
            reason,
        },
    }
}

#[derive(Debug)]
pub struct SimulatedLedger {
    intents: UnboundedReceiver<LedgerIntent>,
    /// Encoded answers with the tick they become visible on.
    in_flight: VecDeque<(u64, String)>,
    latency: u64,
    reject_batches: bool,
    tick: u64,
    games_created: u64,
}

impl SimulatedLedger {
    pub fn new(
        intents: UnboundedReceiver<LedgerIntent>,
        latency: u64,
        reject_batches: bool,
    ) -> Self {
        Self {
            intents,
            in_flight: VecDeque::new(),
            latency,
            reject_batches,
            tick: 0,
            games_created: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Takes every queued intent, then returns the answers that are due.
    pub fn tick(&mut self) -> anyhow::Result<Vec<LedgerNotice>> {
        while let Ok(intent) = self.intents.try_recv() {
            let json = to_wire(intent).encode().context("encoding ledger request")?;
            log::trace!("-> {}", json);
            if let Some(answer) = self.answer(&json)? {
                let json = answer.encode()?;
                self.in_flight.push_back((self.tick + self.latency, json));
            }
        }

        let mut notices = Vec::new();
        while let Some((due, _)) = self.in_flight.front() {
            if *due > self.tick {
                break;
            }
            let Some((_, json)) = self.in_flight.pop_front() else {
                break;
            };
            log::trace!("<- {}", json);
            let message = ServerMessage::decode(&json).context("decoding ledger event")?;
            notices.push(from_wire(message));
        }
        self.tick += 1;
        Ok(notices)
    }

    fn answer(&mut self, json: &str) -> anyhow::Result<Option<ServerMessage>> {
        let answer = match ClientMessage::decode(json)? {
            ClientMessage::CreateGame { handle, difficulty } => {
                if Difficulty::from_code(difficulty).is_none() {
                    bail!("ledger got unknown preset {}", difficulty);
                }
                self.games_created += 1;
                Some(ServerMessage::GameCreated {
                    handle,
                    game_id: format!("sim-{}", self.games_created),
                })
            }
            ClientMessage::RevealBatch { handle, .. } if self.reject_batches => {
                Some(ServerMessage::BatchRejected {
                    handle,
                    reason: "rejected by simulated ledger".to_owned(),
                })
            }
            ClientMessage::RevealBatch { handle, .. } => {
                Some(ServerMessage::BatchConfirmed { handle })
            }
            ClientMessage::FlagToggle { .. } | ClientMessage::WinClaim { .. } => None,
        };
        Ok(answer)
    }
}
