//! Data models for the media proxy.
//!
//! Both types are built fresh per request and dropped with the response.

pub mod key;
pub mod object;
