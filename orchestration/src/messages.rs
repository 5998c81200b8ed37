// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The [messages](crate::messages) module defines what a
//! [Session](crate::Session) tells its owner about.

use rowsync_core::{
    track::{Keyframe, TrackId},
    Row,
};

#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    /// The editor moved the playhead.
    RowSet(Row),

    /// Playback was paused (true) or resumed (false), by the editor or by us.
    PauseChanged(bool),

    /// The editor added or changed a key.
    KeyChanged(TrackId, Keyframe),

    /// The editor removed the key at this row.
    KeyDeleted(TrackId, Row),

    /// The editor wants the current tracks written to storage. Whoever owns
    /// persistence should act on it; the session itself never touches disk.
    SaveRequested,

    /// A byte arrived that doesn't start any frame we know. It was skipped.
    ProtocolError(u8),
}
