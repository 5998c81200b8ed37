// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Fundamental structs and traits of the rowsync engine: the byte ring that
//! stages transport data, the clock that maps playback time onto rows, and
//! the keyframed tracks that the editor streams to us.

pub use error::SyncError;

/// The [ring] module stages incoming transport bytes until a whole frame is
/// available.
pub mod ring;
/// The [time] module converts between playback milliseconds and timeline rows.
pub mod time;
/// The [track] module holds keyframed parameter tracks and evaluates them.
pub mod track;
/// The [traits] module describes the collaborators that the engine talks to
/// but doesn't own.
pub mod traits;

mod error;

/// [Row] is the discrete timeline unit (a musical sub-beat) that all
/// keyframes are indexed by.
pub type Row = u32;

/// [TrackValue] is what a track evaluates to. The wire format carries IEEE-754
/// single-precision floats, so that's what we store.
pub type TrackValue = f32;

/// Shorthand for results whose failures are [SyncError]s.
pub type Result<T> = std::result::Result<T, SyncError>;
