// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{track::TrackId, Row};
use thiserror::Error;

/// Everything that can go wrong inside the engine.
///
/// [SyncError::Transport] is fatal for the current tick only. The remaining
/// variants are data-contract violations: they mean the stream is corrupt or
/// a capacity limit is misconfigured, and they abort the frame that caused
/// them.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("ring buffer overflow: {requested} bytes offered but only {available} free")]
    RingOverflow { requested: usize, available: usize },

    #[error("ring buffer underflow: {requested} bytes wanted but only {available} buffered")]
    RingUnderflow { requested: usize, available: usize },

    #[error("no track with id {0}")]
    UnknownTrack(TrackId),

    #[error("track {track} has no key at row {row}")]
    MissingKey { track: TrackId, row: Row },

    #[error("unknown interpolation kind {0}")]
    UnknownInterpolation(u8),

    #[error("track {track} already holds its maximum of {capacity} keys")]
    KeyCapacity { track: TrackId, capacity: usize },

    #[error("track store already holds its maximum of {0} tracks")]
    TrackCapacity(usize),

    #[error("tempo must be nonzero (got {bpm} BPM, {rows_per_beat} rows per beat)")]
    InvalidTempo { bpm: u32, rows_per_beat: u32 },

    #[error("transport failure: {0}")]
    Transport(#[from] std::io::Error),
}

impl SyncError {
    /// True for errors that mean the incoming stream or the configured limits
    /// can't be trusted, as opposed to I/O trouble.
    pub fn is_data_contract_violation(&self) -> bool {
        !matches!(self, SyncError::Transport(_))
    }
}
