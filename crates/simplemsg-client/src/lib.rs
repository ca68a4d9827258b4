//! simplemsg-client — the client side of the simple message exchange.
//!
//! A client connects, sends one posting, half-closes, and decodes a reply of
//! a status line followed by length-framed records:
//!
//! - [`transport`] resolves and connects, trying candidates in order.
//! - [`request`] writes the posting and signals end-of-request.
//! - [`response`] is the decoder state machine.
//! - [`sink`] is where record payloads are streamed.
//! - [`client`] ties the steps together for one exchange.

pub mod client;
pub mod error;
pub mod request;
pub mod response;
pub mod sink;
pub mod transport;

pub use client::{exchange, exchange_over, Endpoint};
pub use error::{
    ClientError, ConnectError, DecodeState, ProtocolError, ProtocolErrorKind, SendError,
};
pub use response::{RecordSummary, Response, ResponseDecoder};
pub use sink::{DirSink, MemorySink, RecordSink, SinkFactory};
