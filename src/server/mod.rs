//! Transport boundary types.
//!
//! The dispatcher never parses raw bytes. A transport adapter converts its own
//! request representation into a [`Request`] (there is a `From` impl for
//! [`http::Request`]) and turns the resulting [`Response`] back into wire
//! format via [`Response::into_http`].

pub mod request;
pub mod response;

pub use request::{parse_query_params, HeaderVec, Request, MAX_INLINE_HEADERS};
pub use response::Response;
