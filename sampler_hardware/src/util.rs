/// Encode a throttle level the way the device firmware expects it after `'n'`.
#[inline]
pub fn encode_throttle(level: u32) -> [u8; 4] {
    level.to_le_bytes()
}

/// Pop the first complete line (terminator included) off `pending`.
/// Returns None while no `\n` has arrived yet.
pub fn take_line(pending: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = pending.iter().position(|b| *b == b'\n')?;
    Some(pending.drain(..=pos).collect())
}
