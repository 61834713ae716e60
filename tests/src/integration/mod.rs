//! # Integration Flows
//!
//! Every test drives a real [`lc_04_connector_server::ConnectorServer`]
//! through a [`lc_01_proxy_connector::ProxyConnectionManager`], with the
//! web connector answering on the server side and the server's card and
//! profile stores behind it.

#[cfg(test)]
mod fixtures;
#[cfg(test)]
mod proxy_to_web;
#[cfg(test)]
mod stores;
#[cfg(test)]
mod websocket;
