use bytes::{BufMut, BytesMut};

/// Cheap integer to fixed-width decimal ASCII.
///
/// Digits are zero-padded up to `wid`; a `wid` of zero or less writes the
/// number without padding. Wider numbers are never truncated.
pub fn itoa(buf: &mut BytesMut, mut i: u64, wid: i32) {
    // assembled in reverse order
    let mut b = [0u8; 20];
    let mut bp = b.len() - 1;
    let mut wid = wid.min(b.len() as i32);
    while i >= 10 || wid > 1 {
        wid -= 1;
        let q = i / 10;
        b[bp] = b'0' + (i - q * 10) as u8;
        bp -= 1;
        i = q;
    }
    b[bp] = b'0' + i as u8;
    buf.put_slice(&b[bp..]);
}
