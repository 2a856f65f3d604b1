//! Selfservice server: correlation contexts for inbound requests and the
//! REST clients that carry them to upstream services.

pub mod cli;
pub mod clients;
pub mod context;
pub mod network;

#[cfg(test)]
mod test_support;
