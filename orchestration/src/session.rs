// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{
    commands::{self, Command, Decoded, Opcode},
    messages::SessionEvent,
};
use anyhow::{anyhow, Context};
use log::{debug, error, info, warn};
use rowsync_core::{
    ring::ByteRing,
    time::{RowClock, Tempo},
    track::{TrackId, TrackLimits, TrackStore},
    traits::Transport,
    Row, SyncError, TrackValue,
};

/// Everything a [Session] needs to know up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionParams {
    pub tempo: Tempo,
    /// Size of the inbound staging buffer, in bytes.
    pub ring_capacity: usize,
    /// How many bytes the editor sends before its first frame.
    pub handshake_len: usize,
    pub limits: TrackLimits,
}
impl Default for SessionParams {
    fn default() -> Self {
        Self {
            tempo: Tempo::default(),
            ring_capacity: 256,
            handshake_len: 12,
            limits: TrackLimits::default(),
        }
    }
}

/// Where we are in the conversation with the editor. A session starts out
/// [Phase::Handshaking] and moves to [Phase::Streaming] exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// This many more incoming bytes will be thrown away unread.
    Handshaking { remaining: usize },
    Streaming,
}
impl Phase {
    fn starting_with(handshake_len: usize) -> Self {
        if handshake_len == 0 {
            Phase::Streaming
        } else {
            Phase::Handshaking {
                remaining: handshake_len,
            }
        }
    }
}

/// [Session] owns all the state of one connection to an editor (or of one
/// offline playback, if there's no transport): the clock, the tracks, and the
/// buffer of bytes waiting to be decoded.
///
/// The caller drives it by calling [Session::tick] as often as it likes,
/// passing how much wall-clock time has gone by. Nothing ever blocks.
#[derive(Debug)]
pub struct Session<T: Transport> {
    transport: Option<T>,
    ring: ByteRing,
    clock: RowClock,
    tracks: TrackStore,
    phase: Phase,
    handshake_len: usize,

    // Staging for transport reads, sized to the ring so it never reallocates.
    scratch: Vec<u8>,

    events: Vec<SessionEvent>,
}
impl<T: Transport> Session<T> {
    /// A session talking to an editor over `transport`. The clock starts
    /// paused at row zero, and the editor is in charge of unpausing it.
    pub fn new_with(params: SessionParams, transport: T) -> Self {
        let mut r = Self::new_offline(params, TrackStore::new_with(params.limits));
        r.transport = Some(transport);
        r
    }

    /// A session with no editor, playing back `tracks` that came from
    /// somewhere else (typically a track file).
    pub fn new_offline(params: SessionParams, tracks: TrackStore) -> Self {
        Self {
            transport: None,
            ring: ByteRing::new_with(params.ring_capacity),
            clock: RowClock::new_with(params.tempo),
            tracks,
            phase: Phase::starting_with(params.handshake_len),
            handshake_len: params.handshake_len,
            scratch: vec![0; params.ring_capacity],
            events: Vec::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Drops the transport and any bytes still waiting to be decoded. The
    /// clock and tracks carry on as an offline session.
    pub fn detach(&mut self) -> Option<T> {
        self.ring.clear();
        self.phase = Phase::starting_with(self.handshake_len);
        self.transport.take()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn clock(&self) -> &RowClock {
        &self.clock
    }

    pub fn row(&self) -> Row {
        self.clock.row()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn tracks(&self) -> &TrackStore {
        &self.tracks
    }

    /// Events accumulated since the last drain, oldest first.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, SessionEvent> {
        self.events.drain(..)
    }

    /// Returns the id of the track called `name`, creating it if needed.
    /// Creating a track while connected means asking the editor for it; if
    /// that request can't be sent, the track isn't created.
    pub fn get_or_create(&mut self, name: &str) -> anyhow::Result<TrackId> {
        if let Some(id) = self.tracks.id_for_name(name) {
            return Ok(id);
        }
        if !self.tracks.has_room() {
            return Err(SyncError::TrackCapacity(self.tracks.limits().max_tracks).into());
        }
        if let Some(transport) = self.transport.as_mut() {
            transport
                .write_all(&commands::encode_get_track(name))
                .map_err(SyncError::from)
                .with_context(|| format!("requesting track \"{name}\""))?;
            info!("subscribed to track \"{name}\"");
        }
        Ok(self.tracks.get_or_create(name)?)
    }

    /// The track's value at the current playback position.
    pub fn value(&self, id: TrackId) -> rowsync_core::Result<TrackValue> {
        self.tracks.evaluate(id, self.clock.fractional_row())
    }

    /// Pauses or resumes locally, and tells the editor.
    pub fn set_paused(&mut self, paused: bool) -> anyhow::Result<()> {
        self.clock.set_paused(paused);
        self.events.push(SessionEvent::PauseChanged(paused));
        self.send(&commands::encode_pause(paused))
            .context("sending pause state")
    }

    /// Does one quantum of work: advances the clock by `elapsed_ms`, pulls in
    /// whatever the transport has, and applies every complete frame.
    ///
    /// Returns true if playback entered a new row.
    ///
    /// If a transport call fails, or the editor sends something that breaks
    /// the data contract, this returns an error. The session is still usable
    /// afterward: any frame that caused an error has already been consumed.
    pub fn tick(&mut self, elapsed_ms: f64) -> anyhow::Result<bool> {
        let new_row = self.clock.tick(elapsed_ms);
        if let Some(row) = new_row {
            self.send(&commands::encode_set_row(row))
                .context("sending row")?;
        }
        if self.transport.is_none() {
            return Ok(new_row.is_some());
        }

        self.pull()?;
        self.handshake();
        self.dispatch()?;
        Ok(new_row.is_some())
    }

    fn send(&mut self, frame: &[u8]) -> anyhow::Result<()> {
        if let Some(transport) = self.transport.as_mut() {
            transport.write_all(frame).map_err(SyncError::from)?;
        }
        Ok(())
    }

    // Moves as much as the ring can take from the transport into the ring.
    fn pull(&mut self) -> anyhow::Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let available = transport
            .poll_available()
            .map_err(SyncError::from)
            .context("polling transport")?;
        let wanted = available.min(self.ring.available_write_capacity());
        if wanted == 0 {
            return Ok(());
        }
        let read = transport
            .read_into(&mut self.scratch[..wanted])
            .map_err(SyncError::from)
            .context("reading transport")?;
        if read > wanted {
            return Err(anyhow!(
                "transport returned {read} bytes when asked for {wanted}"
            ));
        }
        self.ring.write(&self.scratch[..read])?;
        Ok(())
    }

    fn handshake(&mut self) {
        if let Phase::Handshaking { remaining } = self.phase {
            let remaining = remaining - self.ring.skip_up_to(remaining);
            if remaining == 0 {
                info!("handshake complete");
                self.phase = Phase::Streaming;
            } else {
                self.phase = Phase::Handshaking { remaining };
            }
        }
    }

    fn dispatch(&mut self) -> anyhow::Result<()> {
        if self.phase != Phase::Streaming {
            return Ok(());
        }
        loop {
            match commands::decode(&mut self.ring) {
                Ok(Decoded::NeedMore) => return Ok(()),
                Ok(Decoded::Unrecognized(byte)) => {
                    if let Some(opcode) = Opcode::from_repr(byte) {
                        warn!("protocol error: skipping {opcode}, which only we send");
                    } else {
                        warn!("protocol error: skipping unexpected byte {byte:#04x}");
                    }
                    self.events.push(SessionEvent::ProtocolError(byte));
                }
                Ok(Decoded::Command(command)) => {
                    if let Err(e) = self.apply(command) {
                        error!("rejected {command:?}: {e}");
                        return Err(e.into());
                    }
                }
                Err(e) => {
                    error!("dropped a malformed frame: {e}");
                    return Err(e.into());
                }
            }
        }
    }

    fn apply(&mut self, command: Command) -> rowsync_core::Result<()> {
        let event = match command {
            Command::SetKey { track, key } => {
                self.tracks.set_key(track, key)?;
                debug!(
                    "track {track}: {} at row {} ({})",
                    key.value, key.row, key.interpolation
                );
                SessionEvent::KeyChanged(track, key)
            }
            Command::DeleteKey { track, row } => {
                self.tracks.delete_key(track, row)?;
                debug!("track {track}: deleted key at row {row}");
                SessionEvent::KeyDeleted(track, row)
            }
            Command::SetRow(row) => {
                self.clock.seek_row(row);
                SessionEvent::RowSet(row)
            }
            Command::Pause(paused) => {
                self.clock.set_paused(paused);
                SessionEvent::PauseChanged(paused)
            }
            Command::SaveTracks => SessionEvent::SaveRequested,
        };
        self.events.push(event);
        Ok(())
    }
}
