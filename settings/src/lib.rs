// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The `rowsync-settings` crate manages everything that's read from or written
//! to disk: the session configuration, and the track file that holds a
//! snapshot of every track's keys.

pub use tracks::TrackFile;

pub mod tracks;

use anyhow::{anyhow, Context};
use rowsync_core::{time::Tempo, track::TrackLimits};
use rowsync_orchestration::{commands::MAX_INBOUND_FRAME_LEN, SessionParams};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The user-editable session configuration. Every field is optional in the
/// file; missing ones take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SessionSettings {
    pub bpm: u32,
    pub rows_per_beat: u32,
    pub ring_capacity: usize,
    pub handshake_len: usize,
    pub max_tracks: usize,
    pub max_keys_per_track: usize,
}
impl Default for SessionSettings {
    fn default() -> Self {
        let params = SessionParams::default();
        Self {
            bpm: params.tempo.bpm(),
            rows_per_beat: params.tempo.rows_per_beat(),
            ring_capacity: params.ring_capacity,
            handshake_len: params.handshake_len,
            max_tracks: params.limits.max_tracks,
            max_keys_per_track: params.limits.max_keys_per_track,
        }
    }
}
impl SessionSettings {
    pub fn new_from_json5(json: &str) -> anyhow::Result<Self> {
        let r: Self = json5::from_str(json)?;
        r.validate()?;
        Ok(r)
    }

    pub fn new_from_json5_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        Self::new_from_json5(&contents)
            .with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Checks for values that would make a session unusable. A zero-length
    /// handshake is fine; it means frames start with the first byte.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.tempo()?;
        if self.ring_capacity < MAX_INBOUND_FRAME_LEN {
            return Err(anyhow!(
                "ring-capacity {} can't hold a {MAX_INBOUND_FRAME_LEN}-byte frame",
                self.ring_capacity
            ));
        }
        if self.max_tracks == 0 {
            return Err(anyhow!("max-tracks must be at least 1"));
        }
        if self.max_keys_per_track == 0 {
            return Err(anyhow!("max-keys-per-track must be at least 1"));
        }
        Ok(())
    }

    pub fn tempo(&self) -> anyhow::Result<Tempo> {
        Ok(Tempo::new_with(self.bpm, self.rows_per_beat)?)
    }

    pub fn limits(&self) -> TrackLimits {
        TrackLimits {
            max_tracks: self.max_tracks,
            max_keys_per_track: self.max_keys_per_track,
        }
    }

    pub fn params(&self) -> anyhow::Result<SessionParams> {
        self.validate()?;
        Ok(SessionParams {
            tempo: self.tempo()?,
            ring_capacity: self.ring_capacity,
            handshake_len: self.handshake_len,
            limits: self.limits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_engine() {
        let settings = SessionSettings::default();
        assert_eq!(settings.bpm, 125);
        assert_eq!(settings.rows_per_beat, 8);
        assert_eq!(settings.params().unwrap(), SessionParams::default());
    }

    #[test]
    fn json5_with_missing_fields_takes_defaults() {
        let settings = SessionSettings::new_from_json5(
            r#"{
                // Drum and bass.
                bpm: 174,
                "rows-per-beat": 4,
                "max-tracks": 8,
            }"#,
        )
        .unwrap();
        assert_eq!(settings.bpm, 174);
        assert_eq!(settings.rows_per_beat, 4);
        assert_eq!(settings.max_tracks, 8);
        assert_eq!(settings.ring_capacity, 256);
        assert_eq!(settings.tempo().unwrap(), Tempo::new_with(174, 4).unwrap());
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(SessionSettings::new_from_json5("{ bpm: 0 }").is_err());
        assert!(SessionSettings::new_from_json5(r#"{ "rows-per-beat": 0 }"#).is_err());
        assert!(SessionSettings::new_from_json5(r#"{ "ring-capacity": 13 }"#).is_err());
        assert!(SessionSettings::new_from_json5(r#"{ "ring-capacity": 14 }"#).is_ok());
        assert!(SessionSettings::new_from_json5(r#"{ "max-tracks": 0 }"#).is_err());
        assert!(SessionSettings::new_from_json5(r#"{ "max-keys-per-track": 0 }"#).is_err());
        assert!(SessionSettings::new_from_json5(r#"{ "handshake-len": 0 }"#).is_ok());
        assert!(SessionSettings::new_from_json5("{ bpm: -1 }").is_err());
        assert!(SessionSettings::new_from_json5("not json").is_err());
    }

    #[test]
    fn round_trips_through_json5() {
        let settings = SessionSettings {
            bpm: 90,
            handshake_len: 0,
            ..Default::default()
        };
        let json = json5::to_string(&settings).unwrap();
        assert!(json.contains("rows-per-beat"));
        assert_eq!(SessionSettings::new_from_json5(&json).unwrap(), settings);
    }
}
