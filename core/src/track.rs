// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{Result, Row, SyncError, TrackValue};
use rustc_hash::FxHashMap;
use std::fmt::Display;
use strum_macros::{Display as DisplayMacro, FromRepr};

/// How a keyframe's value moves toward the next keyframe's value. The
/// discriminants are the values that travel on the wire and in track files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, DisplayMacro, FromRepr)]
#[repr(u8)]
pub enum Interpolation {
    /// Hold the value until the next keyframe.
    #[default]
    Step = 0,
    /// Straight line to the next value.
    Linear = 1,
    /// Smoothstep: eases in and out.
    Smooth = 2,
    /// Quadratic: starts slowly and speeds up.
    EaseIn = 3,
}
impl TryFrom<u8> for Interpolation {
    type Error = SyncError;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_repr(value).ok_or(SyncError::UnknownInterpolation(value))
    }
}
impl From<Interpolation> for u8 {
    fn from(value: Interpolation) -> Self {
        value as u8
    }
}
impl Interpolation {
    /// Blends `a` toward `b`, where `t` is 0.0 at `a`'s keyframe and 1.0 at
    /// `b`'s.
    pub fn blend(&self, a: TrackValue, b: TrackValue, t: f64) -> TrackValue {
        let (a64, b64) = (a as f64, b as f64);
        let shaped = match self {
            Interpolation::Step => return a,
            Interpolation::Linear => t,
            Interpolation::Smooth => t * t * (3.0 - 2.0 * t),
            Interpolation::EaseIn => t * t,
        };
        (a64 + (b64 - a64) * shaped) as TrackValue
    }
}

/// A value anchored at a row.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Keyframe {
    pub row: Row,
    pub value: TrackValue,
    pub interpolation: Interpolation,
}

/// Tracks are numbered in the order they were created, starting at zero. The
/// editor addresses them by that number once it has seen our subscription
/// requests, so the numbering has to match the order we sent them in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u32);
impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl From<TrackId> for usize {
    fn from(value: TrackId) -> Self {
        value.0 as usize
    }
}

/// One named, independently keyframed parameter stream. Keys are always
/// sorted by row, and no two share a row.
#[derive(Clone, Debug, Default)]
pub struct Track {
    id: TrackId,
    name: String,
    keys: Vec<Keyframe>,
}
impl Track {
    pub fn new_with(id: TrackId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            keys: Vec::default(),
        }
    }

    pub fn id(&self) -> TrackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn key_at(&self, row: Row) -> Option<&Keyframe> {
        self.keys
            .binary_search_by_key(&row, |k| k.row)
            .ok()
            .map(|i| &self.keys[i])
    }

    /// Sets the key at `key.row`, replacing any key already there. A brand-new
    /// key is refused if the track already holds `capacity` keys.
    pub fn set_key(&mut self, key: Keyframe, capacity: usize) -> Result<()> {
        match self.keys.binary_search_by_key(&key.row, |k| k.row) {
            Ok(i) => {
                self.keys[i].value = key.value;
                self.keys[i].interpolation = key.interpolation;
            }
            Err(i) => {
                if self.keys.len() >= capacity {
                    return Err(SyncError::KeyCapacity {
                        track: self.id,
                        capacity,
                    });
                }
                self.keys.insert(i, key);
            }
        }
        Ok(())
    }

    /// Removes the key at `row`. It's an error for there to be no such key;
    /// the editor only deletes keys it told us about.
    pub fn delete_key(&mut self, row: Row) -> Result<Keyframe> {
        match self.keys.binary_search_by_key(&row, |k| k.row) {
            Ok(i) => Ok(self.keys.remove(i)),
            Err(_) => Err(SyncError::MissingKey { track: self.id, row }),
        }
    }

    /// The track's value at a continuous row position.
    ///
    /// Before the first key, the first key's value. At or after the last key,
    /// the last key's value. In between, the earlier key's [Interpolation]
    /// decides how to get to the later key. An empty track is 0.0.
    pub fn evaluate(&self, row: f64) -> TrackValue {
        let Some(first) = self.keys.first() else {
            return 0.0;
        };

        // The number of keys at or before `row`.
        let at_or_before = self.keys.partition_point(|k| k.row as f64 <= row);
        if at_or_before == 0 {
            return first.value;
        }
        let i = at_or_before - 1;
        if i + 1 >= self.keys.len() {
            return self.keys[i].value;
        }

        let (k0, k1) = (&self.keys[i], &self.keys[i + 1]);
        let t = (row - k0.row as f64) / (k1.row as f64 - k0.row as f64);
        k0.interpolation.blend(k0.value, k1.value, t)
    }

    /// Appends without regard to order. Pair with [Track::sort_keys] once all
    /// the keys are in; loaders use this because files needn't be sorted.
    pub(crate) fn push_unsorted(&mut self, key: Keyframe) {
        self.keys.push(key);
    }

    /// Restores row order, keeping the last-pushed key where rows collide.
    pub(crate) fn sort_keys(&mut self) {
        // Stable sort keeps pushes in order within a row, so the dedup pass
        // can keep the last one.
        self.keys.sort_by_key(|k| k.row);
        let mut deduped: Vec<Keyframe> = Vec::with_capacity(self.keys.len());
        for key in self.keys.drain(..) {
            match deduped.last_mut() {
                Some(last) if last.row == key.row => *last = key,
                _ => deduped.push(key),
            }
        }
        self.keys = deduped;
    }
}

/// Capacity limits for a [TrackStore].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackLimits {
    pub max_tracks: usize,
    pub max_keys_per_track: usize,
}
impl Default for TrackLimits {
    fn default() -> Self {
        Self {
            max_tracks: 64,
            max_keys_per_track: 64,
        }
    }
}

/// All the tracks of a session, addressable by id or by name.
#[derive(Clone, Debug, Default)]
pub struct TrackStore {
    limits: TrackLimits,
    tracks: Vec<Track>,
    name_to_id: FxHashMap<String, TrackId>,
}
impl TrackStore {
    pub fn new_with(limits: TrackLimits) -> Self {
        Self {
            limits,
            ..Default::default()
        }
    }

    pub fn limits(&self) -> TrackLimits {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(usize::from(id))
    }

    pub fn id_for_name(&self, name: &str) -> Option<TrackId> {
        self.name_to_id.get(name).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Track> {
        self.id_for_name(name).and_then(|id| self.get(id))
    }

    /// Creates a track called `name` with the next id, or returns the id of
    /// the existing one. Whoever needs to tell the editor about new tracks
    /// should check [TrackStore::id_for_name] first.
    pub fn get_or_create(&mut self, name: &str) -> Result<TrackId> {
        if let Some(id) = self.id_for_name(name) {
            return Ok(id);
        }
        if self.tracks.len() >= self.limits.max_tracks {
            return Err(SyncError::TrackCapacity(self.limits.max_tracks));
        }
        let id = TrackId(self.tracks.len() as u32);
        self.tracks.push(Track::new_with(id, name));
        self.name_to_id.insert(name.to_string(), id);
        Ok(id)
    }

    /// True if one more track would fit.
    pub fn has_room(&self) -> bool {
        self.tracks.len() < self.limits.max_tracks
    }

    pub fn set_key(&mut self, id: TrackId, key: Keyframe) -> Result<()> {
        let capacity = self.limits.max_keys_per_track;
        self.track_mut(id)?.set_key(key, capacity)
    }

    pub fn delete_key(&mut self, id: TrackId, row: Row) -> Result<Keyframe> {
        self.track_mut(id)?.delete_key(row)
    }

    pub fn evaluate(&self, id: TrackId, row: f64) -> Result<TrackValue> {
        self.get(id)
            .map(|t| t.evaluate(row))
            .ok_or(SyncError::UnknownTrack(id))
    }

    /// Adds a key read from storage, where keys can come in any order. Call
    /// [TrackStore::finish_loading] when done.
    pub fn push_loaded_key(&mut self, id: TrackId, key: Keyframe) -> Result<()> {
        self.track_mut(id)?.push_unsorted(key);
        Ok(())
    }

    /// Sorts every track after a load, and checks that each still respects
    /// the per-track key limit.
    pub fn finish_loading(&mut self) -> Result<()> {
        let capacity = self.limits.max_keys_per_track;
        for track in self.tracks.iter_mut() {
            track.sort_keys();
            if track.keys.len() > capacity {
                return Err(SyncError::KeyCapacity {
                    track: track.id,
                    capacity,
                });
            }
        }
        Ok(())
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut Track> {
        self.tracks
            .get_mut(usize::from(id))
            .ok_or(SyncError::UnknownTrack(id))
    }
}
