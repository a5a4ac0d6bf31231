// Inbound line framing for the stdio transport

use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{AnyDelimiterCodec, AnyDelimiterCodecError, Decoder};

/// One inbound line, or the reason it cannot be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Line(String),
    Rejected(&'static str),
}

/// Newline-delimited decoder that reports unusable lines as items.
///
/// `FramedRead` ends the stream after the first decoder error, so oversized and
/// non-UTF-8 lines are surfaced as [`Inbound::Rejected`] and decoding carries on
/// with the next line. Only I/O failures are errors.
#[derive(Debug, Clone)]
pub struct InboundCodec {
    inner: AnyDelimiterCodec,
}

impl InboundCodec {
    pub fn new(max_length: usize) -> Self {
        Self {
            inner: AnyDelimiterCodec::new_with_max_length(b"\n".to_vec(), b"\n".to_vec(), max_length),
        }
    }

    fn classify(
        chunk: Result<Option<Bytes>, AnyDelimiterCodecError>,
    ) -> Result<Option<Inbound>, AnyDelimiterCodecError> {
        match chunk {
            Ok(Some(chunk)) => {
                let bytes: &[u8] = &chunk;
                let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
                Ok(Some(match std::str::from_utf8(bytes) {
                    Ok(line) => Inbound::Line(line.to_string()),
                    Err(_) => Inbound::Rejected("invalid UTF-8"),
                }))
            }
            Ok(None) => Ok(None),
            // the inner codec discards up to the next newline on its own
            Err(AnyDelimiterCodecError::MaxChunkLengthExceeded) => {
                Ok(Some(Inbound::Rejected("message too large")))
            }
            Err(e) => Err(e),
        }
    }
}

impl Decoder for InboundCodec {
    type Item = Inbound;
    type Error = AnyDelimiterCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, Self::Error> {
        Self::classify(self.inner.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Inbound>, Self::Error> {
        Self::classify(self.inner.decode_eof(buf))
    }
}
