use bytes::{BufMut, BytesMut};
use chrono::{Datelike, Timelike};

use crate::itoa::itoa;

/// Writes `[prefix] [pid] YYYY-MM-DD HH:MM:SS ` to `buf`.
///
/// An empty prefix drops the `prefix] [` segment, leaving `[pid] `.
pub fn format_header<T>(buf: &mut BytesMut, t: &T, prefix: &str, pid: u32)
where
    T: Datelike + Timelike,
{
    buf.put_u8(b'[');
    if !prefix.is_empty() {
        buf.put_slice(prefix.as_bytes());
        buf.put_slice(b"] [");
    }
    itoa(buf, pid as u64, -1);
    buf.put_slice(b"] ");
    format_timestamp(buf, t);
    buf.put_u8(b' ');
}

/// Writes `[YYYY-MM-DD HH:MM:SS] ` to `buf`.
pub fn format_access_header<T>(buf: &mut BytesMut, t: &T)
where
    T: Datelike + Timelike,
{
    buf.put_u8(b'[');
    format_timestamp(buf, t);
    buf.put_slice(b"] ");
}

fn format_timestamp<T>(buf: &mut BytesMut, t: &T)
where
    T: Datelike + Timelike,
{
    itoa(buf, t.year().max(0) as u64, 4);
    buf.put_u8(b'-');
    itoa(buf, t.month() as u64, 2);
    buf.put_u8(b'-');
    itoa(buf, t.day() as u64, 2);
    buf.put_u8(b' ');
    itoa(buf, t.hour() as u64, 2);
    buf.put_u8(b':');
    itoa(buf, t.minute() as u64, 2);
    buf.put_u8(b':');
    itoa(buf, t.second() as u64, 2);
}

/// Appends `msg` and terminates the line unless `msg` already ends with `\n`.
pub fn append_message(buf: &mut BytesMut, msg: &str) {
    buf.put_slice(msg.as_bytes());
    if !msg.ends_with('\n') {
        buf.put_u8(b'\n');
    }
}
