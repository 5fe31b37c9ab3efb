use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::events::PuzzleEvent;

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("truncated frame: wanted {wanted} bytes, {available} available")]
    Truncated { wanted: usize, available: usize },
}

pub fn encode<T>(value: &T) -> Result<Vec<u8>, CodecError>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value)
        .map(|bytes| bytes.into_vec())
        .map_err(|err| CodecError::Encode(err.to_string()))
}

pub fn decode<T>(bytes: &[u8]) -> Result<T, CodecError>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    // Archived data must be aligned; copy out of arbitrary slices first.
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<T, Error>(&aligned).map_err(|err| CodecError::Decode(err.to_string()))
}

/// Appends `event` to `out` as a little-endian u32 length followed by the
/// archived bytes.
pub fn write_event_frame(out: &mut Vec<u8>, event: &PuzzleEvent) -> Result<(), CodecError> {
    let payload = encode(event)?;
    let len = u32::try_from(payload.len()).map_err(|err| CodecError::Encode(err.to_string()))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(())
}

pub fn read_event_frames(mut bytes: &[u8]) -> Result<Vec<PuzzleEvent>, CodecError> {
    let mut events = Vec::new();
    while !bytes.is_empty() {
        if bytes.len() < 4 {
            return Err(CodecError::Truncated {
                wanted: 4,
                available: bytes.len(),
            });
        }
        let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let rest = &bytes[4..];
        if rest.len() < len {
            return Err(CodecError::Truncated {
                wanted: len,
                available: rest.len(),
            });
        }
        events.push(decode::<PuzzleEvent>(&rest[..len])?);
        bytes = &rest[len..];
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{PieceConnected, PuzzleCompleted};

    #[test]
    fn frames_preserve_dispatch_order() {
        let events = vec![
            PuzzleEvent::PieceConnected(PieceConnected {
                moving_piece: 2,
                static_piece: 0,
                from_cluster: 2,
                to_cluster: 0,
                merged_cluster: 0,
            }),
            PuzzleEvent::PuzzleCompleted(PuzzleCompleted {
                final_cluster: 0,
                total_pieces: 2,
            }),
        ];
        let mut out = Vec::new();
        for event in &events {
            write_event_frame(&mut out, event).unwrap();
        }
        assert_eq!(read_event_frames(&out).unwrap(), events);
    }

    #[test]
    fn truncated_frame_is_reported() {
        let mut out = Vec::new();
        write_event_frame(
            &mut out,
            &PuzzleEvent::PuzzleCompleted(PuzzleCompleted {
                final_cluster: 1,
                total_pieces: 4,
            }),
        )
        .unwrap();
        out.pop();
        assert!(matches!(
            read_event_frames(&out),
            Err(CodecError::Truncated { .. })
        ));
    }
}
