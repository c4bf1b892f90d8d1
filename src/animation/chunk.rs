//! Generic chunked container: a signature followed by typed, length-prefixed records.
//!
//! This layer knows nothing about keyframes. Unknown tags are returned like any
//! other chunk so that callers can skip them.

use std::fmt;
use std::io::{self, Read, Write};

use super::error::{AnimationError, Result};

/// Four-byte chunk type tag, stored on disk exactly as these bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub [u8; 4]);

impl ChunkTag {
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkTag(\"{}\")", self)
    }
}

/// One record of the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: ChunkTag,
    pub payload: Vec<u8>,
}

impl Chunk {
    /// Size of the tag + length prefix in bytes.
    pub const HEADER_SIZE: usize = 8;

    pub fn new(tag: ChunkTag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    /// A chunk with no payload, used as a marker.
    pub fn marker(tag: ChunkTag) -> Self {
        Self {
            tag,
            payload: Vec::new(),
        }
    }

    /// Write chunk to output.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<()> {
        write_chunk(w, self.tag, &self.payload)
    }

    /// Read the next chunk from input.
    ///
    /// Returns `Ok(None)` on a clean end of stream, i.e. when no byte of a new
    /// chunk header could be read. A stream that ends anywhere inside a chunk
    /// is an I/O error.
    pub fn read_from<R: Read>(r: &mut R, max_len: u32) -> Result<Option<Self>> {
        let mut tag = [0u8; 4];
        if !read_exact_or_eof(r, &mut tag)? {
            return Ok(None);
        }
        let tag = ChunkTag(tag);

        let mut buf4 = [0u8; 4];
        r.read_exact(&mut buf4)?;
        let length = u32::from_be_bytes(buf4);
        if length > max_len {
            return Err(AnimationError::ChunkTooLarge {
                tag,
                length: length as u64,
                limit: max_len,
            });
        }

        let mut payload = vec![0u8; length as usize];
        r.read_exact(&mut payload)?;

        Ok(Some(Self { tag, payload }))
    }
}

/// Write the file signature.
pub fn write_signature<W: Write>(w: &mut W, signature: &[u8]) -> Result<()> {
    w.write_all(signature)?;
    Ok(())
}

/// Read and verify the file signature.
pub fn read_signature<R: Read>(r: &mut R, signature: &[u8]) -> Result<()> {
    let mut found = vec![0u8; signature.len()];
    match r.read_exact(&mut found) {
        Ok(()) => {}
        // A file shorter than the signature cannot be one of ours.
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(AnimationError::InvalidSignature);
        }
        Err(e) => return Err(e.into()),
    }
    if found != signature {
        return Err(AnimationError::InvalidSignature);
    }
    Ok(())
}

/// Write a chunk from a borrowed payload.
pub fn write_chunk<W: Write>(w: &mut W, tag: ChunkTag, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| AnimationError::ChunkTooLarge {
        tag,
        length: payload.len() as u64,
        limit: u32::MAX,
    })?;
    w.write_all(tag.as_bytes())?;
    w.write_all(&length.to_be_bytes())?;
    w.write_all(payload)?;
    Ok(())
}

/// Fill `buf` completely, or report a clean EOF if nothing at all was read.
fn read_exact_or_eof<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("Stream ended {} bytes into a chunk header", filled),
                ));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SIG: &[u8] = b"TEST\n\r\xFF\n";
    const TAG: ChunkTag = ChunkTag::new(b"abcd");

    #[test]
    fn test_chunk_layout() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, TAG, &[1, 2, 3]).unwrap();
        assert_eq!(buf.len(), Chunk::HEADER_SIZE + 3);
        assert_eq!(&buf[..4], b"abcd");
        assert_eq!(&buf[4..8], &[0, 0, 0, 3]);
        assert_eq!(&buf[8..], &[1, 2, 3]);
    }

    #[test]
    fn test_sequence_then_clean_eof() {
        let mut buf = Vec::new();
        write_signature(&mut buf, SIG).unwrap();
        Chunk::marker(TAG).write_to(&mut buf).unwrap();
        Chunk::new(ChunkTag::new(b"zzzz"), vec![9; 10])
            .write_to(&mut buf)
            .unwrap();

        let mut cursor = Cursor::new(&buf);
        read_signature(&mut cursor, SIG).unwrap();

        let first = Chunk::read_from(&mut cursor, 1024).unwrap().unwrap();
        assert_eq!(first, Chunk::marker(TAG));

        let second = Chunk::read_from(&mut cursor, 1024).unwrap().unwrap();
        assert_eq!(second.tag, ChunkTag::new(b"zzzz"));
        assert_eq!(second.payload, vec![9; 10]);

        assert!(Chunk::read_from(&mut cursor, 1024).unwrap().is_none());
    }

    #[test]
    fn test_bad_signature() {
        let mut cursor = Cursor::new(b"NOPE\n\r\xFF\n".to_vec());
        assert!(matches!(
            read_signature(&mut cursor, SIG),
            Err(AnimationError::InvalidSignature)
        ));

        let mut short = Cursor::new(b"TE".to_vec());
        assert!(matches!(
            read_signature(&mut short, SIG),
            Err(AnimationError::InvalidSignature)
        ));
    }

    #[test]
    fn test_truncated_payload_is_io_error() {
        let mut buf = Vec::new();
        write_chunk(&mut buf, TAG, &[0; 16]).unwrap();
        buf.truncate(buf.len() - 4);

        let err = Chunk::read_from(&mut Cursor::new(&buf), 1024).unwrap_err();
        match err {
            AnimationError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof),
            other => panic!("expected I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_header_is_io_error() {
        let mut cursor = Cursor::new(b"ab".to_vec());
        assert!(matches!(
            Chunk::read_from(&mut cursor, 1024),
            Err(AnimationError::Io(_))
        ));

        // Tag present, length cut short
        let mut cursor = Cursor::new(b"abcd\0\0".to_vec());
        assert!(matches!(
            Chunk::read_from(&mut cursor, 1024),
            Err(AnimationError::Io(_))
        ));
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"abcd");
        buf.extend_from_slice(&u32::MAX.to_be_bytes());

        let err = Chunk::read_from(&mut Cursor::new(&buf), 1024).unwrap_err();
        assert!(matches!(
            err,
            AnimationError::ChunkTooLarge { limit: 1024, .. }
        ));
    }

    #[test]
    fn test_tag_display_escapes() {
        assert_eq!(ChunkTag::new(b"KfrS").to_string(), "KfrS");
        assert_eq!(ChunkTag::new(b"a\0b\xFF").to_string(), "a\\x00b\\xFF");
    }
}
