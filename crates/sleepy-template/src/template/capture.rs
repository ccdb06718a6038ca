//! Buffered output capture.

use std::fmt;
use std::io;

/// A buffer that collects output to be bound as a placeholder value.
///
/// Obtained from [`Template::bind_start`](crate::Template::bind_start) and
/// handed back to [`Template::bind_stop`](crate::Template::bind_stop).
/// Accepts both `write!` flavours:
///
/// ```rust
/// use std::fmt::Write as _;
/// use sleepy_template::Capture;
///
/// let mut capture = Capture::new();
/// write!(capture, "<b>{}</b>", 42).unwrap();
/// assert_eq!(capture.as_str(), "<b>42</b>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    buffer: Vec<u8>,
}

impl Capture {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// The captured text. Invalid UTF-8 sequences are replaced.
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    /// Consumes the capture, returning its text.
    pub fn into_string(self) -> String {
        match String::from_utf8(self.buffer) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Write for Capture {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buffer.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_and_io_writes_accumulate() {
        let mut capture = Capture::new();
        fmt::Write::write_str(&mut capture, "a").unwrap();
        io::Write::write_all(&mut capture, b"b").unwrap();
        assert_eq!(capture.len(), 2);
        assert_eq!(capture.into_string(), "ab");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut capture = Capture::new();
        io::Write::write_all(&mut capture, &[b'x', 0xff]).unwrap();
        assert_eq!(capture.into_string(), "x\u{fffd}");
    }

    #[test]
    fn test_empty() {
        assert!(Capture::new().is_empty());
        assert_eq!(Capture::new().as_str(), "");
    }
}
