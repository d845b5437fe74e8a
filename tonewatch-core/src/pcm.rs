//! Signed 16-bit little-endian ("slin") sample encoding.

use std::io::{self, BufReader, Read};

/// Bytes per slin sample.
pub const SLIN_SAMPLE_BYTES: usize = 2;

/// Encode samples as a raw slin byte stream.
pub fn encode_slin(samples: &[i16]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * SLIN_SAMPLE_BYTES);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Decode one slin sample.
#[inline]
pub fn decode_slin(bytes: [u8; SLIN_SAMPLE_BYTES]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// Buffered sample reader over a raw slin byte stream.
pub struct SlinReader<R> {
    inner: BufReader<R>,
}

impl<R: Read> SlinReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Next sample, or `None` at end of stream. A dangling odd byte at the
    /// end counts as end of stream.
    ///
    /// Only a zero-length read marks the end; every error the source returns,
    /// `UnexpectedEof` included, is passed through.
    pub fn read_sample(&mut self) -> io::Result<Option<i16>> {
        let mut buf = [0u8; SLIN_SAMPLE_BYTES];
        let mut filled = 0;
        while filled < SLIN_SAMPLE_BYTES {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Ok(None),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(Some(decode_slin(buf)))
    }
}

impl<R: Read> Iterator for SlinReader<R> {
    type Item = io::Result<i16>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_sample().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn little_endian_layout() {
        let bytes = encode_slin(&[0x0102, -2]);
        assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
    }

    #[test]
    fn decode_matches_encode() {
        for s in [i16::MIN, -1, 0, 1, 12_345, i16::MAX] {
            let b = encode_slin(&[s]);
            assert_eq!(decode_slin([b[0], b[1]]), s);
        }
    }

    #[test]
    fn reader_stops_at_odd_trailing_byte() {
        let mut bytes = encode_slin(&[1, -1, 300]);
        bytes.push(0xAA);
        let samples: Vec<i16> = SlinReader::new(Cursor::new(bytes))
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(samples, vec![1, -1, 300]);
    }

    /// Yields its bytes one at a time, then fails with `kind`.
    struct TruncatedSource {
        bytes: Vec<u8>,
        pos: usize,
        kind: io::ErrorKind,
    }

    impl Read for TruncatedSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pos < self.bytes.len() {
                buf[0] = self.bytes[self.pos];
                self.pos += 1;
                return Ok(1);
            }
            Err(io::Error::new(self.kind, "tls stream truncated"))
        }
    }

    #[test]
    fn source_unexpected_eof_is_an_error() {
        let mut reader = SlinReader::new(TruncatedSource {
            bytes: encode_slin(&[7, -7]),
            pos: 0,
            kind: io::ErrorKind::UnexpectedEof,
        });
        assert_eq!(reader.read_sample().unwrap(), Some(7));
        assert_eq!(reader.read_sample().unwrap(), Some(-7));
        let err = reader.read_sample().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn interrupted_reads_are_retried() {
        struct Flaky {
            inner: Cursor<Vec<u8>>,
            interrupt: bool,
        }
        impl Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                self.interrupt = !self.interrupt;
                if self.interrupt {
                    return Err(io::ErrorKind::Interrupted.into());
                }
                self.inner.read(&mut buf[..1])
            }
        }

        let samples: Vec<i16> = SlinReader::new(Flaky {
            inner: Cursor::new(encode_slin(&[42, -42])),
            interrupt: false,
        })
        .collect::<io::Result<_>>()
        .unwrap();
        assert_eq!(samples, vec![42, -42]);
    }

    #[test]
    fn reader_on_empty_stream() {
        let mut reader = SlinReader::new(io::empty());
        assert!(reader.read_sample().unwrap().is_none());
    }
}
