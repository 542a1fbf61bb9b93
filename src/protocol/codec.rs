//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │ CRC (4)  │     Payload (bincode)       │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! - Request frames: tag = request kind, payload = `Request`
//! - Response frames: tag = status, payload = `Body`
//! - CRC32 covers the payload only; length and CRC are big-endian

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::error::{GateError, Result};

use super::{Body, Request, RequestKind, Response, Status};

/// Header size: 1 byte tag + 4 bytes length + 4 bytes checksum
pub const HEADER_SIZE: usize = 9;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

fn encode_frame(tag: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(GateError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u8(tag);
    frame.put_u32(payload.len() as u32);
    frame.put_u32(crc32fast::hash(payload));
    frame.put_slice(payload);
    Ok(frame.to_vec())
}

/// Parsed header fields
struct FrameHeader {
    tag: u8,
    payload_len: usize,
    crc: u32,
}

fn parse_header(header: &[u8]) -> Result<FrameHeader> {
    if header.len() < HEADER_SIZE {
        return Err(GateError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            header.len()
        )));
    }

    let tag = header[0];
    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);
    let crc = u32::from_be_bytes([header[5], header[6], header[7], header[8]]);

    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(GateError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    Ok(FrameHeader {
        tag,
        payload_len: payload_len as usize,
        crc,
    })
}

/// Split a complete frame into tag and checked payload
fn decode_frame(bytes: &[u8]) -> Result<(u8, &[u8])> {
    let header = parse_header(bytes)?;

    let total_len = HEADER_SIZE + header.payload_len;
    if bytes.len() < total_len {
        return Err(GateError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let payload = &bytes[HEADER_SIZE..total_len];
    verify_crc(payload, header.crc)?;
    Ok((header.tag, payload))
}

fn verify_crc(payload: &[u8], expected: u32) -> Result<()> {
    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(GateError::Protocol(format!(
            "Checksum mismatch: expected {:08x}, got {:08x}",
            expected, actual
        )));
    }
    Ok(())
}

/// Read one frame, returning its tag and checked payload
fn read_frame<R: Read>(reader: &mut R) -> Result<(u8, Vec<u8>)> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    let header = parse_header(&header)?;

    let mut payload = vec![0u8; header.payload_len];
    if header.payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }
    verify_crc(&payload, header.crc)?;

    Ok((header.tag, payload))
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let payload = bincode::serialize(request)?;
    encode_frame(request.kind() as u8, &payload)
}

/// Decode a request from a complete frame
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (tag, payload) = decode_frame(bytes)?;
    request_from_parts(tag, payload)
}

fn request_from_parts(tag: u8, payload: &[u8]) -> Result<Request> {
    let kind = RequestKind::from_u8(tag).ok_or_else(|| {
        GateError::Protocol(format!("Unknown request type: 0x{:02x}", tag))
    })?;

    let request: Request = bincode::deserialize(payload)?;
    if request.kind() != kind {
        return Err(GateError::Protocol(format!(
            "Request type mismatch: header says {:?}, payload is {:?}",
            kind,
            request.kind()
        )));
    }
    Ok(request)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = bincode::serialize(&response.body)?;
    encode_frame(response.status as u8, &payload)
}

/// Decode a response from a complete frame
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (tag, payload) = decode_frame(bytes)?;
    response_from_parts(tag, payload)
}

fn response_from_parts(tag: u8, payload: &[u8]) -> Result<Response> {
    let status = Status::from_u8(tag).ok_or_else(|| {
        GateError::Protocol(format!("Unknown response status: 0x{:02x}", tag))
    })?;

    let body: Body = bincode::deserialize(payload)?;
    Ok(Response { status, body })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a complete request is received or an error occurs
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let (tag, payload) = read_frame(reader)?;
    request_from_parts(tag, &payload)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let (tag, payload) = read_frame(reader)?;
    response_from_parts(tag, &payload)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
