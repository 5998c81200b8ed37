// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The [commands](crate::commands) module knows the wire format: which
//! opcodes exist, how big their frames are, how to pull a whole frame out of
//! a [ByteRing], and how to build the frames we send back.

use rowsync_core::{
    ring::ByteRing,
    track::{Interpolation, Keyframe, TrackId},
    Row, SyncError,
};
use strum_macros::{Display, FromRepr};

/// The first byte of every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, FromRepr)]
#[repr(u8)]
pub enum Opcode {
    SetKey = 0,
    DeleteKey = 1,
    GetTrack = 2,
    SetRow = 3,
    Pause = 4,
    SaveTracks = 5,
}
impl Opcode {
    /// How many bytes must follow the opcode before an inbound frame can be
    /// decoded. [Opcode::GetTrack] only ever goes out, so it has no inbound
    /// size.
    pub fn payload_len(&self) -> Option<usize> {
        match self {
            Opcode::SetKey => Some(4 + 4 + 4 + 1),
            Opcode::DeleteKey => Some(4 + 4),
            Opcode::GetTrack => None,
            Opcode::SetRow => Some(4),
            Opcode::Pause => Some(1),
            Opcode::SaveTracks => Some(0),
        }
    }
}

/// The largest whole inbound frame, opcode included. A ring smaller than
/// this could never hold a SET_KEY.
pub const MAX_INBOUND_FRAME_LEN: usize = 1 + 13;

/// A fully decoded inbound frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    SetKey { track: TrackId, key: Keyframe },
    DeleteKey { track: TrackId, row: Row },
    SetRow(Row),
    Pause(bool),
    SaveTracks,
}

/// What came of one attempt to decode the front of the ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Decoded {
    /// A complete frame, now consumed.
    Command(Command),
    /// The byte at the front isn't an opcode we accept. It has been skipped.
    Unrecognized(u8),
    /// Nothing left, or the next frame hasn't fully arrived. Nothing was
    /// consumed.
    NeedMore,
}

/// Decodes the frame at the front of `ring`.
///
/// A frame is consumed only once all of it has arrived. If the frame is
/// complete but its contents are invalid, it's still consumed before the
/// error is returned, so that the next call starts at the next frame.
pub fn decode(ring: &mut ByteRing) -> Result<Decoded, SyncError> {
    let Some(byte) = ring.peek() else {
        return Ok(Decoded::NeedMore);
    };
    let Some((opcode, payload_len)) =
        Opcode::from_repr(byte).and_then(|op| op.payload_len().map(|len| (op, len)))
    else {
        ring.skip(1)?;
        return Ok(Decoded::Unrecognized(byte));
    };
    if ring.len() < 1 + payload_len {
        return Ok(Decoded::NeedMore);
    }
    ring.skip(1)?;

    let command = match opcode {
        Opcode::SetKey => {
            let track = TrackId(ring.read_u32_be()?);
            let row = ring.read_u32_be()?;
            let value = ring.read_f32_be()?;
            let interpolation = Interpolation::try_from(ring.read_byte()?)?;
            Command::SetKey {
                track,
                key: Keyframe {
                    row,
                    value,
                    interpolation,
                },
            }
        }
        Opcode::DeleteKey => Command::DeleteKey {
            track: TrackId(ring.read_u32_be()?),
            row: ring.read_u32_be()?,
        },
        Opcode::SetRow => Command::SetRow(ring.read_u32_be()?),
        Opcode::Pause => Command::Pause(ring.read_byte()? == 1),
        Opcode::SaveTracks => Command::SaveTracks,
        // Filtered out above by its missing payload length.
        Opcode::GetTrack => return Ok(Decoded::Unrecognized(byte)),
    };
    Ok(Decoded::Command(command))
}

pub fn encode_set_row(row: Row) -> [u8; 5] {
    let mut frame = [0u8; 5];
    frame[0] = Opcode::SetRow as u8;
    frame[1..].copy_from_slice(&row.to_be_bytes());
    frame
}

pub fn encode_pause(paused: bool) -> [u8; 2] {
    [Opcode::Pause as u8, paused as u8]
}

/// A subscription request for the track called `name`. The editor replies
/// with SET_KEY frames for every key the track already has.
pub fn encode_get_track(name: &str) -> Vec<u8> {
    let name = name.as_bytes();
    let mut frame = Vec::with_capacity(1 + 4 + name.len());
    frame.push(Opcode::GetTrack as u8);
    frame.extend_from_slice(&(name.len() as u32).to_be_bytes());
    frame.extend_from_slice(name);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_with(bytes: &[u8]) -> ByteRing {
        let mut ring = ByteRing::new_with(64);
        ring.write(bytes).unwrap();
        ring
    }

    #[test]
    fn opcode_wire_values() {
        assert_eq!(Opcode::from_repr(0), Some(Opcode::SetKey));
        assert_eq!(Opcode::from_repr(5), Some(Opcode::SaveTracks));
        assert_eq!(Opcode::from_repr(6), None);
        let largest = (0..=u8::MAX)
            .filter_map(Opcode::from_repr)
            .filter_map(|op| op.payload_len())
            .max()
            .unwrap();
        assert_eq!(1 + largest, MAX_INBOUND_FRAME_LEN);
    }

    #[test]
    fn set_key_frame_decodes_and_consumes_exactly_fourteen_bytes() {
        let mut ring = ring_with(&[
            0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x07, 0x3F, 0x80, 0x00, 0x00, 0x01,
            0x03,
        ]);
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::SetKey {
                track: TrackId(2),
                key: Keyframe {
                    row: 7,
                    value: 1.0,
                    interpolation: Interpolation::Linear
                }
            })
        );
        // Only the trailing byte is left.
        assert_eq!(ring.len(), 1);
        assert_eq!(ring.peek(), Some(0x03));
    }

    #[test]
    fn pause_frames() {
        let mut ring = ring_with(&[0x04, 0x01, 0x04, 0x00]);
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::Pause(true))
        );
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::Pause(false))
        );
        assert_eq!(decode(&mut ring).unwrap(), Decoded::NeedMore);
    }

    #[test]
    fn partial_frames_are_left_alone() {
        let mut ring = ring_with(&[0x03, 0x00, 0x00]);
        assert_eq!(decode(&mut ring).unwrap(), Decoded::NeedMore);
        assert_eq!(ring.len(), 3);

        ring.write(&[0x01, 0x00]).unwrap();
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::SetRow(256))
        );
        assert!(ring.is_empty());
    }

    #[test]
    fn unrecognized_bytes_are_skipped_one_at_a_time() {
        // GET_TRACK is outbound only, so it's as foreign as 0xFF inbound.
        let mut ring = ring_with(&[
            0xFF, 0x02, 0x05, 0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00, 0x09,
        ]);
        assert_eq!(decode(&mut ring).unwrap(), Decoded::Unrecognized(0xFF));
        assert_eq!(decode(&mut ring).unwrap(), Decoded::Unrecognized(0x02));
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::SaveTracks)
        );
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::DeleteKey {
                track: TrackId(3),
                row: 9
            })
        );
        assert!(ring.is_empty());
    }

    #[test]
    fn bad_interpolation_still_consumes_the_frame() {
        let mut ring = ring_with(&[
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x09,
            0x05,
        ]);
        assert!(matches!(
            decode(&mut ring),
            Err(SyncError::UnknownInterpolation(9))
        ));
        assert_eq!(
            decode(&mut ring).unwrap(),
            Decoded::Command(Command::SaveTracks)
        );
    }

    #[test]
    fn outbound_frames() {
        assert_eq!(encode_set_row(0x01020304), [0x03, 0x01, 0x02, 0x03, 0x04]);
        assert_eq!(encode_pause(true), [0x04, 0x01]);
        assert_eq!(encode_pause(false), [0x04, 0x00]);
        assert_eq!(
            encode_get_track("cam:x"),
            vec![0x02, 0x00, 0x00, 0x00, 0x05, b'c', b'a', b'm', b':', b'x']
        );
    }
}
