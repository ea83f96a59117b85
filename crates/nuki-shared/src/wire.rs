//! Little-endian field reader/writer helpers shared by the codecs and models.
//!
//! Every read is bounds-checked up front so a short payload surfaces as
//! [`FrameError::Malformed`] instead of a panic inside `bytes::Buf`.

use bytes::{Buf, BufMut};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::FrameError;

pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    context: &'static str,
    total: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8], context: &'static str) -> Self {
        Self {
            buf,
            context,
            total: buf.len(),
        }
    }

    /// Fail unless at least `n` more bytes are available.
    pub(crate) fn need(&self, n: usize) -> Result<(), FrameError> {
        if self.buf.remaining() < n {
            let consumed = self.total - self.buf.remaining();
            return Err(FrameError::malformed(self.context, consumed + n, self.total));
        }
        Ok(())
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub(crate) fn u8(&mut self) -> Result<u8, FrameError> {
        self.need(1)?;
        Ok(self.buf.get_u8())
    }

    pub(crate) fn bool(&mut self) -> Result<bool, FrameError> {
        Ok(self.u8()? == 0x01)
    }

    pub(crate) fn u16_le(&mut self) -> Result<u16, FrameError> {
        self.need(2)?;
        Ok(self.buf.get_u16_le())
    }

    pub(crate) fn i16_le(&mut self) -> Result<i16, FrameError> {
        self.need(2)?;
        Ok(self.buf.get_i16_le())
    }

    pub(crate) fn u32_le(&mut self) -> Result<u32, FrameError> {
        self.need(4)?;
        Ok(self.buf.get_u32_le())
    }

    pub(crate) fn f32_le(&mut self) -> Result<f32, FrameError> {
        self.need(4)?;
        Ok(self.buf.get_f32_le())
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], FrameError> {
        self.need(N)?;
        let mut out = [0u8; N];
        self.buf.copy_to_slice(&mut out);
        Ok(out)
    }

    pub(crate) fn bytes(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        self.need(n)?;
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    /// Consume everything that is left.
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let rest = self.buf;
        self.buf = &[];
        rest
    }

    /// Null-padded fixed-size string field.
    pub(crate) fn name<const N: usize>(&mut self) -> Result<String, FrameError> {
        let raw = self.array::<N>()?;
        Ok(trim_name(&raw))
    }

    /// `year(LE16) month day hour minute second`; `None` when the fields are
    /// not a valid calendar date (e.g. a lock whose clock was never set).
    pub(crate) fn datetime(&mut self) -> Result<Option<NaiveDateTime>, FrameError> {
        let year = self.u16_le()?;
        let [month, day, hour, minute, second] = self.array::<5>()?;
        Ok(NaiveDate::from_ymd_opt(i32::from(year), u32::from(month), u32::from(day))
            .and_then(|date| {
                date.and_hms_opt(u32::from(hour), u32::from(minute), u32::from(second))
            }))
    }
}

pub(crate) fn trim_name(raw: &[u8]) -> String {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Copy `name` into a zeroed `N`-byte field, truncating if longer.
pub(crate) fn pad_name<const N: usize>(name: &str) -> [u8; N] {
    let mut out = [0u8; N];
    let bytes = name.as_bytes();
    let len = bytes.len().min(N);
    out[..len].copy_from_slice(&bytes[..len]);
    out
}

pub(crate) fn put_datetime(buf: &mut Vec<u8>, at: &NaiveDateTime) {
    use chrono::{Datelike, Timelike};
    buf.put_u16_le(at.year() as u16);
    buf.put_u8(at.month() as u8);
    buf.put_u8(at.day() as u8);
    buf.put_u8(at.hour() as u8);
    buf.put_u8(at.minute() as u8);
    buf.put_u8(at.second() as u8);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_read_reports_context() {
        let mut r = Reader::new(&[0x01, 0x02], "test field");
        assert_eq!(r.u8().unwrap(), 0x01);
        let err = r.u32_le().unwrap_err();
        assert_eq!(
            err,
            FrameError::Malformed {
                context: "test field",
                needed: 5,
                available: 2
            }
        );
    }

    #[test]
    fn test_name_trimming() {
        let field: [u8; 8] = pad_name("Door");
        assert_eq!(&field, b"Door\0\0\0\0");
        assert_eq!(trim_name(&field), "Door");

        let long: [u8; 4] = pad_name("Frontdoor");
        assert_eq!(&long, b"Fron");
    }

    #[test]
    fn test_invalid_date_is_none() {
        let mut r = Reader::new(&[0, 0, 0, 0, 0, 0, 0], "date");
        assert_eq!(r.datetime().unwrap(), None);
    }

    #[test]
    fn test_datetime_roundtrip() {
        let at = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(17, 4, 59)
            .unwrap();
        let mut buf = Vec::new();
        put_datetime(&mut buf, &at);
        assert_eq!(buf.len(), 7);
        assert_eq!(Reader::new(&buf, "date").datetime().unwrap(), Some(at));
    }
}
