//! # gRPC-Web Frame Codec
//!
//! A gRPC-Web body is a sequence of length-prefixed frames:
//!
//! ```text
//! +-------+----------------+-----------------+
//! | flags | length (u32 BE)| payload         |
//! | 1 B   | 4 B            | `length` bytes  |
//! +-------+----------------+-----------------+
//! ```
//!
//! * **Data frames** (`flags = 0x00`) carry a serialized Protobuf message.
//! * **Trailer frames** (`flags = 0x80`) carry a text block of `key: value\r\n` lines with the
//!   final `grpc-status` and `grpc-message` of the call.
//!
//! Every function here is pure and returns freshly allocated (or independently reference
//! counted) [`Bytes`], so a response can be assembled from several frames without aliasing.
use bytes::{Buf, BufMut, Bytes, BytesMut};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tonic::Code;

/// One byte of flags plus four bytes of length.
pub const HEADER_LEN: usize = 5;

/// Flag byte of an uncompressed data frame.
pub const DATA_FLAG: u8 = 0x00;

/// Flag byte of a trailer frame (most significant bit set).
pub const TRAILER_FLAG: u8 = 0x80;

const GRPC_STATUS: &str = "grpc-status";
const GRPC_MESSAGE: &str = "grpc-message";

/// Characters left untouched by JavaScript's `encodeURIComponent`, which is what
/// browser gRPC-Web clients use to decode `grpc-message`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("Malformed frame: declared length {declared} exceeds the {available} bytes available")]
    Truncated { declared: usize, available: usize },
    #[error("Malformed frame: unsupported flags {0:#04x} on a request frame")]
    UnsupportedFlags(u8),
    #[error("Payload of {0} bytes does not fit in a gRPC-Web frame")]
    TooLarge(usize),
    #[error("Malformed trailer block: {0}")]
    InvalidTrailer(String),
}

/// A single frame of a gRPC-Web body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Bytes),
    Trailer(Bytes),
}

/// Extracts the message payload from a request body holding a single data frame.
///
/// A body shorter than [`HEADER_LEN`] carries no frame at all and is treated as an empty
/// message, which is how clients send requests whose every field has its default value.
/// Compressed frames are not supported: any flag byte other than `0x00` is an error.
pub fn decode_data_frame(body: Bytes) -> Result<Bytes, FrameError> {
    if body.len() < HEADER_LEN {
        return Ok(Bytes::new());
    }

    let flags = body[0];
    if flags != DATA_FLAG {
        return Err(FrameError::UnsupportedFlags(flags));
    }

    let (declared, available) = read_length(&body);
    if declared > available {
        return Err(FrameError::Truncated {
            declared,
            available,
        });
    }

    Ok(body.slice(HEADER_LEN..HEADER_LEN + declared))
}

/// Wraps a serialized message into a data frame.
pub fn encode_data_frame(payload: &[u8]) -> Result<Bytes, FrameError> {
    encode_frame(DATA_FLAG, payload)
}

/// Builds the trailer frame that closes every gRPC-Web response.
pub fn encode_trailer_frame(code: Code, message: &str) -> Result<Bytes, FrameError> {
    let block = format!(
        "{GRPC_STATUS}: {}\r\n{GRPC_MESSAGE}: {}\r\n",
        code as i32,
        utf8_percent_encode(message, URI_COMPONENT)
    );

    encode_frame(TRAILER_FLAG, block.as_bytes())
}

/// Splits a complete gRPC-Web body into its frames, in order.
pub fn decode_frames(mut body: Bytes) -> Result<Vec<Frame>, FrameError> {
    let mut frames = Vec::new();

    while !body.is_empty() {
        if body.len() < HEADER_LEN {
            return Err(FrameError::Truncated {
                declared: HEADER_LEN,
                available: body.len(),
            });
        }

        let (declared, available) = read_length(&body);
        if declared > available {
            return Err(FrameError::Truncated {
                declared,
                available,
            });
        }

        let flags = body[0];
        let mut frame = body.split_to(HEADER_LEN + declared);
        frame.advance(HEADER_LEN);

        if flags & TRAILER_FLAG != 0 {
            frames.push(Frame::Trailer(frame));
        } else {
            frames.push(Frame::Data(frame));
        }
    }

    Ok(frames)
}

/// Parses the payload of a trailer frame back into a status code and a decoded message.
///
/// A missing `grpc-message` line yields an empty message; a missing `grpc-status` is an error.
pub fn parse_trailer_block(block: &[u8]) -> Result<(Code, String), FrameError> {
    let text = std::str::from_utf8(block)
        .map_err(|e| FrameError::InvalidTrailer(format!("not valid UTF-8: {e}")))?;

    let mut code = None;
    let mut message = String::new();

    for line in text.split("\r\n").filter(|line| !line.is_empty()) {
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| FrameError::InvalidTrailer(format!("line '{line}' has no ':'")))?;

        match key.trim().to_ascii_lowercase().as_str() {
            GRPC_STATUS => {
                let value: i32 = value.trim().parse().map_err(|_| {
                    FrameError::InvalidTrailer(format!("invalid grpc-status '{}'", value.trim()))
                })?;
                code = Some(Code::from(value));
            }
            GRPC_MESSAGE => {
                message = percent_decode_str(value.trim())
                    .decode_utf8()
                    .map_err(|e| FrameError::InvalidTrailer(format!("invalid grpc-message: {e}")))?
                    .into_owned();
            }
            // Unknown trailers are allowed by the protocol.
            _ => {}
        }
    }

    let code = code.ok_or_else(|| FrameError::InvalidTrailer("missing grpc-status".into()))?;
    Ok((code, message))
}

/// Returns the declared payload length and the number of bytes actually following the header.
fn read_length(body: &[u8]) -> (usize, usize) {
    let declared = (&body[1..HEADER_LEN]).get_u32() as usize;
    (declared, body.len() - HEADER_LEN)
}

fn encode_frame(flags: u8, payload: &[u8]) -> Result<Bytes, FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::TooLarge(payload.len()))?;

    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(flags);
    buf.put_u32(len);
    buf.put_slice(payload);

    Ok(buf.freeze())
}
