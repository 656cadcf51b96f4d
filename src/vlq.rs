//! The MIDI variable-length quantity: an unsigned integer packed 7 bits per
//! byte, most significant group first, high bit set on every byte but the
//! last. Delta times and all sysex/meta payload lengths use this encoding.

/// Encodes a value in the canonical minimal-length form. Only a value of
/// zero produces a bare `0x00`; no other encoding carries a leading
/// all-zero continuation byte.
pub fn encode(mut value: u32) -> Vec<u8> {
    let mut bytes = Vec::new();

    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        if !bytes.is_empty() {
            byte |= 0x80;
        }

        bytes.push(byte);

        if value == 0 {
            break;
        }
    }

    bytes.reverse();
    bytes
}

/// Decodes one quantity from the front of a byte iterator, returning the
/// value together with the number of bytes consumed. Returns `None` if the
/// iterator runs out before a terminating byte (high bit clear) is seen.
pub fn decode<ITER: Iterator<Item = u8>>(iter: &mut ITER) -> Option<(u32, usize)> {
    let mut value = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = iter.next()?;
        consumed += 1;
        value = (value << 7) | (byte & 0x7F) as u32;

        if byte & 0x80 == 0 {
            return Some((value, consumed));
        }
    }
}
