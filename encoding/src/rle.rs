//! A byte-oriented run-length codec in the PackBits tradition,
//! as used by the RLE segments of uncompressed pixel representations.
//!
//! The encoded stream alternates control bytes and payload:
//! a control byte `n` in `0..=127` copies the next `n + 1` literal bytes;
//! a control byte `-m` (two's complement, `-127..=-1`) repeats the next
//! single byte `m + 1` times; `-128` is a no-op.
//!
//! Decoding supports three modes of operation:
//! whole-buffer decoding, decoding towards a target output count
//! which may stop mid-run and be resumed later,
//! and decoding into a caller-supplied buffer of fixed size,
//! reporting how many bytes were actually produced.

use snafu::{Backtrace, IntoError, ResultExt, Snafu};
use std::io::{self, Read};

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The input ended in the middle of a run:
    /// after a control byte, but before all of its payload.
    #[snafu(display("input exhausted in the middle of a run"))]
    UnexpectedEndOfInput { backtrace: Backtrace },
    /// Reading from the underlying source failed.
    #[snafu(display("failed to read run-length input: {}", source))]
    ReadInput {
        source: io::Error,
        backtrace: Backtrace,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// The state of a partially consumed run.
#[derive(Debug, Clone, Copy)]
enum Run {
    /// `n` literal bytes still to be copied from the input.
    Literal(usize),
    /// The given byte, repeated `n` more times.
    Repeat { byte: u8, remaining: usize },
}

/// A resumable decoder of a run-length encoded byte stream.
///
/// The decoder remembers its position within a run,
/// so interrupted decodes (on a filled output buffer or a reached
/// target count) continue exactly where they stopped.
#[derive(Debug)]
pub struct RleDecoder<R> {
    src: R,
    run: Option<Run>,
}

impl<R> RleDecoder<R>
where
    R: Read,
{
    /// Create a decoder reading encoded bytes from the given source.
    pub fn new(src: R) -> Self {
        RleDecoder { src, run: None }
    }

    /// Fetch the next run from the input.
    /// Returns `None` on a clean end of input (at a control byte boundary).
    fn next_run(&mut self) -> Result<Option<Run>> {
        loop {
            let mut control = [0u8; 1];
            match self.src.read(&mut control).context(ReadInputSnafu)? {
                0 => return Ok(None),
                _ => {}
            }
            match control[0] as i8 {
                -128 => continue, // no-op control byte
                h if h >= 0 => return Ok(Some(Run::Literal(h as usize + 1))),
                h => {
                    let mut byte = [0u8; 1];
                    self.src
                        .read_exact(&mut byte)
                        .map_err(|e| match e.kind() {
                            io::ErrorKind::UnexpectedEof => {
                                UnexpectedEndOfInputSnafu.build()
                            }
                            _ => ReadInputSnafu.into_error(e),
                        })?;
                    return Ok(Some(Run::Repeat {
                        byte: byte[0],
                        remaining: (1 - h as isize) as usize,
                    }));
                }
            }
        }
    }

    /// Produce at most `limit` bytes from the current or next run,
    /// appending them to `out`. Returns the number of bytes produced,
    /// or 0 on a clean end of input.
    fn pump(&mut self, out: &mut [u8]) -> Result<usize> {
        let run = match self.run.take() {
            Some(run) => run,
            None => match self.next_run()? {
                Some(run) => run,
                None => return Ok(0),
            },
        };

        match run {
            Run::Literal(n) => {
                let take = n.min(out.len());
                self.src
                    .read_exact(&mut out[..take])
                    .map_err(|e| match e.kind() {
                        io::ErrorKind::UnexpectedEof => UnexpectedEndOfInputSnafu.build(),
                        _ => ReadInputSnafu.into_error(e),
                    })?;
                if take < n {
                    self.run = Some(Run::Literal(n - take));
                }
                Ok(take)
            }
            Run::Repeat { byte, remaining } => {
                let take = remaining.min(out.len());
                for slot in &mut out[..take] {
                    *slot = byte;
                }
                if take < remaining {
                    self.run = Some(Run::Repeat {
                        byte,
                        remaining: remaining - take,
                    });
                }
                Ok(take)
            }
        }
    }

    /// Decode the whole remaining input, appending to `out`.
    /// Returns the number of bytes produced.
    pub fn decode_to_end(&mut self, out: &mut Vec<u8>) -> Result<usize> {
        let mut total = 0;
        let mut chunk = [0u8; 256];
        loop {
            let produced = self.pump(&mut chunk)?;
            if produced == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..produced]);
            total += produced;
        }
    }

    /// Decode exactly `target` bytes, appending to `out`.
    /// The decode may stop mid-run; the input stream and run state are
    /// left positioned for a subsequent call to resume.
    /// Exhausting the input before the target is reached is a
    /// malformed-input condition.
    pub fn decode_exact(&mut self, out: &mut Vec<u8>, target: usize) -> Result<()> {
        let start = out.len();
        out.resize(start + target, 0);
        let mut filled = 0;
        while filled < target {
            let produced = self.pump(&mut out[start + filled..])?;
            if produced == 0 {
                out.truncate(start + filled);
                return UnexpectedEndOfInputSnafu.fail();
            }
            filled += produced;
        }
        Ok(())
    }

    /// Decode into the given fixed-size buffer, truncating gracefully
    /// when the buffer is shorter than the decoded output.
    /// Returns the number of bytes actually written.
    /// Any interrupted run is retained for a later call.
    pub fn decode_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            let produced = self.pump(&mut buf[filled..])?;
            if produced == 0 {
                break;
            }
            filled += produced;
        }
        Ok(filled)
    }
}

/// Decode a whole run-length encoded buffer.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(src.len() * 2);
    RleDecoder::new(src).decode_to_end(&mut out)?;
    Ok(out)
}

/// Encode the given bytes with run-length compression.
///
/// Runs of three or more equal bytes become repeat runs;
/// everything else is grouped into literal runs of up to 128 bytes.
pub fn encode(src: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(src.len() / 2 + 2);
    let mut i = 0;
    while i < src.len() {
        // measure the run of equal bytes at the cursor
        let mut run_len = 1;
        while i + run_len < src.len() && src[i + run_len] == src[i] && run_len < 128 {
            run_len += 1;
        }
        if run_len >= 3 {
            out.push((1i16 - run_len as i16) as u8);
            out.push(src[i]);
            i += run_len;
            continue;
        }
        // gather literals until the next run of 3+ or the group limit
        let start = i;
        let mut len = 0;
        while i < src.len() && len < 128 {
            let mut ahead = 1;
            while i + ahead < src.len() && src[i + ahead] == src[i] && ahead < 3 {
                ahead += 1;
            }
            if ahead >= 3 {
                break;
            }
            i += 1;
            len += 1;
        }
        out.push((len - 1) as u8);
        out.extend_from_slice(&src[start..i]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // the canonical PackBits sample
    const ENCODED: &[u8] = &[
        0xFE, 0xAA, 0x02, 0x80, 0x00, 0x2A, 0xFD, 0xAA, 0x03, 0x80, 0x00, 0x2A, 0x22, 0xF7, 0xAA,
    ];
    const DECODED: &[u8] = &[
        0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0xAA, 0xAA, 0xAA, 0xAA, 0x80, 0x00, 0x2A, 0x22, 0xAA,
        0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA, 0xAA,
    ];

    #[test]
    fn whole_buffer_decode() {
        assert_eq!(decode(ENCODED).unwrap(), DECODED);
    }

    #[test]
    fn streamed_decode() {
        let mut decoder = RleDecoder::new(ENCODED);
        let mut out = Vec::new();
        let n = decoder.decode_to_end(&mut out).unwrap();
        assert_eq!(n, DECODED.len());
        assert_eq!(out, DECODED);
    }

    #[test]
    fn partial_decode_resumes_mid_run() {
        let mut decoder = RleDecoder::new(ENCODED);
        let mut out = Vec::new();
        // 8 bytes stops in the middle of the second repeat run
        decoder.decode_exact(&mut out, 8).unwrap();
        assert_eq!(out, &DECODED[..8]);
        // the resumed call continues exactly where the first stopped
        decoder.decode_exact(&mut out, DECODED.len() - 8).unwrap();
        assert_eq!(out, DECODED);
    }

    #[test]
    fn decode_into_short_buffer_reports_written() {
        let mut decoder = RleDecoder::new(ENCODED);
        let mut buf = [0u8; 10];
        let written = decoder.decode_into(&mut buf).unwrap();
        assert_eq!(written, 10);
        assert_eq!(&buf, &DECODED[..10]);

        // a buffer longer than the rest reports the true count
        let mut buf = [0u8; 64];
        let written = decoder.decode_into(&mut buf).unwrap();
        assert_eq!(written, DECODED.len() - 10);
        assert_eq!(&buf[..written], &DECODED[10..]);
    }

    #[test]
    fn exhausting_input_mid_run_is_an_error() {
        // repeat control byte with no payload
        assert!(matches!(
            decode(&[0xFD]),
            Err(Error::UnexpectedEndOfInput { .. })
        ));
        // literal control byte with not enough payload
        assert!(matches!(
            decode(&[0x04, 0x01, 0x02]),
            Err(Error::UnexpectedEndOfInput { .. })
        ));
        // asking for more than the input holds
        let mut decoder = RleDecoder::new(ENCODED);
        let mut out = Vec::new();
        assert!(matches!(
            decoder.decode_exact(&mut out, DECODED.len() + 1),
            Err(Error::UnexpectedEndOfInput { .. })
        ));
    }

    #[test]
    fn noop_control_byte_is_skipped() {
        assert_eq!(decode(&[0x80, 0x00, 0x41, 0x80]).unwrap(), &[0x41]);
    }

    #[test]
    fn encode_round_trips() {
        assert_eq!(decode(&encode(DECODED)).unwrap(), DECODED);

        let data: Vec<u8> = (0..=255u8).chain(std::iter::repeat(7).take(300)).collect();
        assert_eq!(decode(&encode(&data)).unwrap(), data);

        assert_eq!(encode(&[]), &[] as &[u8]);
        assert_eq!(decode(&encode(&[0x42])).unwrap(), &[0x42]);
    }
}
