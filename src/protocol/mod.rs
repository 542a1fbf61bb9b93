//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │ Kind (1) │ Len (4)  │ CRC (4)  │     Payload (Request)       │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Request Kinds
//! - 0x01: PING              0x07: SCHEDULE_DOWNTIME
//! - 0x02: GET               0x08: DELETE_DOWNTIME
//! - 0x03: SET               0x09: LIST
//! - 0x04: ADD_HOST          0x0A: PROCESS_SHUTDOWN
//! - 0x05: ADD_SERVICE       0x0B: PROCESS_RESTART
//! - 0x06: ADD_CONTACT
//!
//! ## Response Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │ CRC (4)  │     Payload (Body)          │
//! └──────────┴──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Status Codes
//! - 0x00: OK
//! - 0x01: INVALID_PARAMETER
//! - 0x02: RUNTIME_ERROR

mod codec;
mod request;
mod response;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use request::{ObjectId, ObjectKind, Request, RequestKind, Value};
pub use response::{Body, Response, Status};
