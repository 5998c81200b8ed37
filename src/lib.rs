// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! rowsync is a client for "rocket"-style sync trackers. An editor streams
//! keyframed parameter tracks to us over a socket, and we play them back
//! against a clock that the editor can pause and scrub.
//!
//! Most of the work happens in the member crates. This one gathers them up,
//! and provides the `rowsync-cli` binary.

pub use rowsync_core::{
    time::{RowClock, Tempo},
    track::{Interpolation, Keyframe, Track, TrackId, TrackLimits, TrackStore},
    traits::Transport,
    Row, SyncError, TrackValue,
};
pub use rowsync_orchestration::{
    helpers::{MemoryTransport, TcpTransport},
    Phase, Session, SessionEvent, SessionParams,
};
pub use rowsync_settings::{SessionSettings, TrackFile};
pub use rowsync_utils::Paths;

/// The version of this package, for --version and bug reports.
pub fn app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
