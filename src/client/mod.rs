//! Client side of the search screen: a transport-agnostic view controller
//! and an HTTP transport for it.

pub mod http;
pub mod search_view;
