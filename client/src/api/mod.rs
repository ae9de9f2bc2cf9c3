//! Remote menu access.
//!
//! [`MenuClient`] binds one menu to a [`Transport`]; [`HttpTransport`] is the
//! reqwest implementation configured by [`ApiConfig`].

pub mod context;
pub mod http;
pub mod menu;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

pub use context::ApiConfig;
pub use http::HttpTransport;
pub use menu::MenuClient;
pub use transport::{Transport, XCommand};
