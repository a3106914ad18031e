//! Test doubles for kvdesk.
//!
//! - [`FakeStore`]: an in-memory [`RecordStore`](kvdesk_core::RecordStore) that
//!   records every call and can be told to fail.
//! - [`CannedServer`]: a one-shot HTTP responder on a local `TcpListener`,
//!   for exercising the HTTP client without a network.

pub mod fake;
pub mod http;

pub use fake::{Call, FakeStore, Op};
pub use http::{CannedResponse, CannedServer, CapturedRequest};
