// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{Result, Row, SyncError};
use std::fmt::Display;

/// How fast rows go by: beats per minute, and how many rows make up a beat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tempo {
    bpm: u32,
    rows_per_beat: u32,
}
impl Default for Tempo {
    fn default() -> Self {
        Self {
            bpm: Self::DEFAULT_BPM,
            rows_per_beat: Self::DEFAULT_ROWS_PER_BEAT,
        }
    }
}
impl Display for Tempo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} BPM x {} rows/beat", self.bpm, self.rows_per_beat)
    }
}
impl Tempo {
    pub const DEFAULT_BPM: u32 = 125;
    pub const DEFAULT_ROWS_PER_BEAT: u32 = 8;

    /// Row/time conversions divide by the row rate, so neither factor may be
    /// zero.
    pub fn new_with(bpm: u32, rows_per_beat: u32) -> Result<Self> {
        if bpm == 0 || rows_per_beat == 0 {
            return Err(SyncError::InvalidTempo { bpm, rows_per_beat });
        }
        Ok(Self { bpm, rows_per_beat })
    }

    pub fn bpm(&self) -> u32 {
        self.bpm
    }

    pub fn rows_per_beat(&self) -> u32 {
        self.rows_per_beat
    }

    pub fn rows_per_second(&self) -> f64 {
        self.bpm as f64 / 60.0 * self.rows_per_beat as f64
    }

    /// The row that is playing `time_ms` milliseconds into the timeline.
    /// Negative times clamp to row zero.
    pub fn time_to_row(&self, time_ms: f64) -> Row {
        self.fractional_row(time_ms).floor().clamp(0.0, Row::MAX as f64) as Row
    }

    /// The inverse of [Tempo::time_to_row]. Half a millisecond is added so
    /// that flooring the result back into a row can't land on the row before
    /// because of rounding error.
    pub fn row_to_time(&self, row: Row) -> f64 {
        row as f64 / self.rows_per_second() * 1000.0 + Self::ROW_TIME_BIAS_MS
    }

    /// The continuous row position at `time_ms`.
    pub fn fractional_row(&self, time_ms: f64) -> f64 {
        self.rows_per_second() * time_ms / 1000.0
    }

    const ROW_TIME_BIAS_MS: f64 = 0.5;
}

/// The playback clock. It keeps milliseconds and rows consistent with each
/// other, and which one is in charge depends on whether we're paused.
///
/// While playing, time advances with the wall clock and the row is derived
/// from it. While paused, the editor owns the row (it sends SET_ROW as the
/// user scrubs) and time is derived from the row on every tick, so that
/// playback resumes exactly where the editor left it.
#[derive(Clone, Debug)]
pub struct RowClock {
    tempo: Tempo,
    time_ms: f64,
    row: Row,
    paused: bool,
}
impl Default for RowClock {
    fn default() -> Self {
        Self::new_with(Tempo::default())
    }
}
impl RowClock {
    /// A new clock starts at row zero, paused, as the editor expects.
    pub fn new_with(tempo: Tempo) -> Self {
        Self {
            tempo,
            time_ms: Default::default(),
            row: Default::default(),
            paused: true,
        }
    }

    pub fn tempo(&self) -> Tempo {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: Tempo) {
        self.tempo = tempo;
        if self.paused {
            self.time_ms = self.tempo.row_to_time(self.row);
        } else {
            self.row = self.tempo.time_to_row(self.time_ms);
        }
    }

    pub fn time_ms(&self) -> f64 {
        self.time_ms
    }

    pub fn row(&self) -> Row {
        self.row
    }

    /// The continuous row position, for evaluating tracks between rows.
    /// While paused it's exactly the current row.
    pub fn fractional_row(&self) -> f64 {
        if self.paused {
            self.row as f64
        } else {
            self.tempo.fractional_row(self.time_ms)
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Resuming picks up time from the current row, so playback continues
    /// from wherever the row was left.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused && !paused {
            self.time_ms = self.tempo.row_to_time(self.row);
        }
        self.paused = paused;
    }

    /// Moves the row. While paused, time follows at once. While playing,
    /// time stays in charge, and the next [RowClock::tick] derives the row
    /// from it again.
    pub fn seek_row(&mut self, row: Row) {
        self.row = row;
        if self.paused {
            self.time_ms = self.tempo.row_to_time(row);
        }
    }

    /// Advances the clock by `elapsed_ms` of wall-clock time. Returns the new
    /// row if playback crossed into a different one.
    ///
    /// Deltas that are negative or not finite are ignored.
    pub fn tick(&mut self, elapsed_ms: f64) -> Option<Row> {
        if self.paused {
            self.time_ms = self.tempo.row_to_time(self.row);
            return None;
        }
        if elapsed_ms.is_finite() && elapsed_ms > 0.0 {
            self.time_ms += elapsed_ms;
        }
        let row = self.tempo.time_to_row(self.time_ms);
        if row != self.row {
            self.row = row;
            Some(row)
        } else {
            None
        }
    }

    /// Back to the top of the timeline, paused.
    pub fn reset(&mut self) {
        self.time_ms = Default::default();
        self.row = Default::default();
        self.paused = true;
    }
}
