// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! A plain-text snapshot of a [TrackStore].
//!
//! ```text
//! #camera:x
//! 0 0.000000 1
//! 32 4.500000 2
//! #camera:y
//! 16 -1.000000 0
//! ```
//!
//! A `#` line starts a track. Each line after it is a key: the row, the value,
//! and the interpolation kind's wire number. Blank lines don't matter, and
//! keys needn't be in row order.

use anyhow::{anyhow, Context};
use log::info;
use rowsync_core::track::{Interpolation, Keyframe, TrackId, TrackLimits, TrackStore};
use std::{fmt::Write, path::Path};

pub struct TrackFile {}
impl TrackFile {
    pub fn load(path: &Path, limits: TrackLimits) -> anyhow::Result<TrackStore> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading track file {}", path.display()))?;
        let tracks = Self::parse(&contents, limits)
            .with_context(|| format!("parsing track file {}", path.display()))?;
        info!(
            "loaded {} track(s) from {}",
            tracks.len(),
            path.display()
        );
        Ok(tracks)
    }

    /// Writes `tracks` to `path`, creating its directory if needed.
    pub fn save(tracks: &TrackStore, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::write(path, Self::render(tracks))
            .with_context(|| format!("writing track file {}", path.display()))?;
        info!("saved {} track(s) to {}", tracks.len(), path.display());
        Ok(())
    }

    pub fn parse(contents: &str, limits: TrackLimits) -> anyhow::Result<TrackStore> {
        let mut tracks = TrackStore::new_with(limits);
        let mut current: Option<TrackId> = None;
        for (i, line) in contents.lines().enumerate() {
            let line_number = i + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = line.strip_prefix('#') {
                let name = name.trim();
                if name.is_empty() {
                    return Err(anyhow!("line {line_number}: track name is missing"));
                }
                current = Some(
                    tracks
                        .get_or_create(name)
                        .with_context(|| format!("line {line_number}"))?,
                );
                continue;
            }
            let Some(id) = current else {
                return Err(anyhow!("line {line_number}: key comes before any #track line"));
            };
            let key = Self::parse_key(line).with_context(|| format!("line {line_number}"))?;
            tracks.push_loaded_key(id, key)?;
        }
        tracks.finish_loading()?;
        Ok(tracks)
    }

    fn parse_key(line: &str) -> anyhow::Result<Keyframe> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [row, value, interpolation] = fields[..] else {
            return Err(anyhow!(
                "expected <row> <value> <interpolation>, got \"{line}\""
            ));
        };
        let row: u32 = row
            .parse()
            .with_context(|| format!("bad row \"{row}\""))?;
        let value: f32 = value
            .parse()
            .with_context(|| format!("bad value \"{value}\""))?;
        if !value.is_finite() {
            return Err(anyhow!("value {value} isn't a finite number"));
        }
        let interpolation = interpolation
            .parse::<u8>()
            .with_context(|| format!("bad interpolation \"{interpolation}\""))?;
        Ok(Keyframe {
            row,
            value,
            interpolation: Interpolation::try_from(interpolation)?,
        })
    }

    pub fn render(tracks: &TrackStore) -> String {
        let mut r = String::default();
        for track in tracks.iter() {
            let _ = writeln!(r, "#{}", track.name());
            for key in track.keys() {
                let _ = writeln!(
                    r,
                    "{} {:.6} {}",
                    key.row,
                    key.value,
                    u8::from(key.interpolation)
                );
            }
        }
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rowsync-{}-{name}", std::process::id()))
    }

    #[test]
    fn parses_the_documented_example() {
        let tracks = TrackFile::parse(
            "#camera:x\n0 0.000000 1\n32 4.500000 2\n\n#camera:y\n16 -1.000000 0\n",
            TrackLimits::default(),
        )
        .unwrap();
        assert_eq!(tracks.len(), 2);
        let x = tracks.get_by_name("camera:x").unwrap();
        assert_eq!(x.id(), TrackId(0));
        assert_eq!(x.keys().len(), 2);
        assert_eq!(x.keys()[1].interpolation, Interpolation::Smooth);
        let y = tracks.get_by_name("camera:y").unwrap();
        assert_eq!(y.keys()[0].value, -1.0);
        assert!(approx_eq!(f32, tracks.evaluate(x.id(), 16.0).unwrap(), 2.25));
    }

    #[test]
    fn unordered_keys_come_out_sorted() {
        let tracks =
            TrackFile::parse("#t\n20 2 0\n10 1 0\n30 3 0\n", TrackLimits::default()).unwrap();
        let rows: Vec<_> = tracks
            .get(TrackId(0))
            .unwrap()
            .keys()
            .iter()
            .map(|k| k.row)
            .collect();
        assert_eq!(rows, vec![10, 20, 30]);
    }

    #[test]
    fn malformed_lines_report_their_line_number() {
        for (contents, line) in [
            ("5 1.0 0\n", "line 1"),
            ("#t\n\n5 1.0\n", "line 3"),
            ("#t\n5 x 0\n", "line 2"),
            ("#t\n5 1.0 7\n", "line 2"),
            ("#t\n-5 1.0 0\n", "line 2"),
            ("#t\n#\n", "line 2"),
        ] {
            let e = TrackFile::parse(contents, TrackLimits::default()).unwrap_err();
            let message = format!("{e:#}");
            assert!(
                message.contains(line),
                "{contents:?} gave \"{message}\", expected it to mention {line}"
            );
        }
    }

    #[test]
    fn limits_apply_to_loaded_files() {
        let limits = TrackLimits {
            max_tracks: 1,
            max_keys_per_track: 1,
        };
        assert!(TrackFile::parse("#a\n#b\n", limits).is_err());
        assert!(TrackFile::parse("#a\n1 1 0\n2 2 0\n", limits).is_err());
        assert!(TrackFile::parse("#a\n1 1 0\n", limits).is_ok());
    }

    #[test]
    fn save_then_load_gives_the_same_tracks() {
        let mut tracks = TrackStore::default();
        let a = tracks.get_or_create("fx:glow").unwrap();
        let b = tracks.get_or_create("empty").unwrap();
        for (row, value, interpolation) in [
            (0, 0.25, Interpolation::Linear),
            (8, -3.5, Interpolation::EaseIn),
            (64, 1000.0, Interpolation::Step),
        ] {
            tracks
                .set_key(
                    a,
                    Keyframe {
                        row,
                        value,
                        interpolation,
                    },
                )
                .unwrap();
        }

        let rendered = TrackFile::render(&tracks);
        assert!(rendered.contains("8 -3.500000 3\n"));

        let path = temp_path("round-trip.tracks");
        TrackFile::save(&tracks, &path).unwrap();
        let loaded = TrackFile::load(&path, TrackLimits::default()).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.len(), 2);
        assert_eq!(
            loaded.get(a).unwrap().keys(),
            tracks.get(a).unwrap().keys()
        );
        assert!(loaded.get(b).unwrap().keys().is_empty());
        assert_eq!(loaded.get(b).unwrap().name(), "empty");
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = temp_path("does-not-exist.tracks");
        assert!(TrackFile::load(&path, TrackLimits::default()).is_err());
    }
}
