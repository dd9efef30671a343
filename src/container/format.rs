//! Project container constants and block framing.

/// Size of the module presence mask in bytes.
pub const PRESENCE_MASK_SIZE: usize = 4;

/// Size of the length prefix in front of every module block.
pub const BLOCK_LEN_SIZE: usize = 4;

/// Conventional extension of project files.
pub const PROJECT_EXTENSION: &str = "fm3";

/// Result of pulling one framed block off the stream.
#[derive(Debug, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A complete block payload.
    Block(&'a [u8]),
    /// Stream ended exactly at a block boundary.
    End,
    /// Stream ended inside the length prefix or payload.
    Truncated { expected: u64, available: u64 },
}

/// Read the next framed block and advance `input` past it.
///
/// A truncated frame consumes the rest of the stream.
pub fn next_frame<'a>(input: &mut &'a [u8]) -> Frame<'a> {
    let bytes: &'a [u8] = *input;
    if bytes.is_empty() {
        return Frame::End;
    }
    if bytes.len() < BLOCK_LEN_SIZE {
        *input = &[];
        return Frame::Truncated { expected: BLOCK_LEN_SIZE as u64, available: bytes.len() as u64 };
    }

    let len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let rest = &bytes[BLOCK_LEN_SIZE..];
    if rest.len() < len {
        *input = &[];
        return Frame::Truncated { expected: len as u64, available: rest.len() as u64 };
    }

    let (payload, tail) = rest.split_at(len);
    *input = tail;
    Frame::Block(payload)
}

/// Result of reading the presence mask.
#[derive(Debug, PartialEq, Eq)]
pub enum Mask {
    Bits(u32),
    /// Stream ended right after the movie block.
    End,
    /// Stream ended inside the mask.
    Truncated { available: u64 },
}

/// Read the presence mask and advance `input` past it.
pub fn read_presence_mask(input: &mut &[u8]) -> Mask {
    let bytes = *input;
    if bytes.is_empty() {
        return Mask::End;
    }
    if bytes.len() < PRESENCE_MASK_SIZE {
        *input = &[];
        return Mask::Truncated { available: bytes.len() as u64 };
    }
    let bits = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    *input = &bytes[PRESENCE_MASK_SIZE..];
    Mask::Bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        let bytes = [2, 0, 0, 0, 0xAA, 0xBB, 0, 0, 0, 0];
        let mut input: &[u8] = &bytes;
        assert_eq!(next_frame(&mut input), Frame::Block(&[0xAA, 0xBB]));
        assert_eq!(next_frame(&mut input), Frame::Block(&[]));
        assert_eq!(next_frame(&mut input), Frame::End);
    }

    #[test]
    fn test_truncated_frames() {
        let mut input: &[u8] = &[5, 0, 0, 0, 1, 2];
        assert_eq!(next_frame(&mut input), Frame::Truncated { expected: 5, available: 2 });
        assert!(input.is_empty());

        let mut input: &[u8] = &[1, 0];
        assert_eq!(next_frame(&mut input), Frame::Truncated { expected: 4, available: 2 });
    }

    #[test]
    fn test_presence_mask() {
        let mut input: &[u8] = &[0x05, 0, 0, 0, 9];
        assert_eq!(read_presence_mask(&mut input), Mask::Bits(5));
        assert_eq!(input, &[9]);

        let mut input: &[u8] = &[1, 2];
        assert_eq!(read_presence_mask(&mut input), Mask::Truncated { available: 2 });
        assert!(input.is_empty());

        let mut input: &[u8] = &[];
        assert_eq!(read_presence_mask(&mut input), Mask::End);
    }
}
