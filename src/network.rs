//! Network-state oracles.
//!
//! The pile never detects connectivity itself; it asks a [`NetworkOracle`]
//! right before deciding whether to run an action or defer it.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{NetworkConfig, NetworkMode};

/// Connectivity as reported by an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkState {
    Online,
    Offline,
}

impl NetworkState {
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl std::fmt::Display for NetworkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// Synchronous source of the current network state.
#[cfg_attr(test, mockall::automock)]
pub trait NetworkOracle: Send + Sync {
    /// Current state. No caching is implied.
    fn network_state(&self) -> NetworkState;
}

/// Manually toggled network state.
#[derive(Debug)]
pub struct NetworkSwitch {
    online: AtomicBool,
}

impl NetworkSwitch {
    #[must_use]
    pub const fn new(state: NetworkState) -> Self {
        Self {
            online: AtomicBool::new(state.is_online()),
        }
    }

    #[must_use]
    pub const fn online() -> Self {
        Self::new(NetworkState::Online)
    }

    #[must_use]
    pub const fn offline() -> Self {
        Self::new(NetworkState::Offline)
    }

    pub fn set(&self, state: NetworkState) {
        self.online.store(state.is_online(), Ordering::SeqCst);
    }
}

impl NetworkOracle for NetworkSwitch {
    fn network_state(&self) -> NetworkState {
        if self.online.load(Ordering::SeqCst) {
            NetworkState::Online
        } else {
            NetworkState::Offline
        }
    }
}

/// Reports online when a TCP connection to `address` succeeds within `timeout`.
#[derive(Debug, Clone)]
pub struct ProbeNetwork {
    address: String,
    timeout: Duration,
}

impl ProbeNetwork {
    #[must_use]
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    fn resolve(&self) -> Option<SocketAddr> {
        self.address
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
    }
}

impl NetworkOracle for ProbeNetwork {
    fn network_state(&self) -> NetworkState {
        let Some(addr) = self.resolve() else {
            debug!(address = %self.address, "probe address did not resolve");
            return NetworkState::Offline;
        };

        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(_) => NetworkState::Online,
            Err(e) => {
                debug!(address = %self.address, error = %e, "network probe failed");
                NetworkState::Offline
            },
        }
    }
}

/// Build the oracle selected by configuration.
#[must_use]
pub fn oracle_from_config(config: &NetworkConfig) -> Box<dyn NetworkOracle> {
    match config.mode {
        NetworkMode::Online => Box::new(NetworkSwitch::online()),
        NetworkMode::Offline => Box::new(NetworkSwitch::offline()),
        NetworkMode::Auto => Box::new(ProbeNetwork::new(
            config.probe_address.clone(),
            config.probe_timeout(),
        )),
    }
}
