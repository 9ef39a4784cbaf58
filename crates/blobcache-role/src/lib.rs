//! Role implementations for the blob cache: a [`server::ServerRole`]
//! (authoritative) and a [`proxy::ProxyRole`] (read-through), unified behind
//! [`service::Role`], plus the stateless [`client`] functions that drive the
//! wire protocol from either role or from an unrelated process.

pub mod client;
pub mod proxy;
pub mod server;
pub mod service;

pub use proxy::ProxyRole;
pub use server::ServerRole;
pub use service::Role;
