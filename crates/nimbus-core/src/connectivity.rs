//! Network association with a bounded retry budget
//!
//! The radio itself is driven by an external collaborator. This module only
//! owns the policy: try a fixed number of times, then continue offline.

use serde::Serialize;
use thiserror_no_std::Error;

use log::{info, warn};

use crate::config::NetworkConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Connectivity {
    Online,
    /// Degraded mode, the station keeps sampling and rendering locally
    #[default]
    Offline,
}

impl Connectivity {
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// Failure reported by the link collaborator for one association attempt
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    #[error("Network not found")]
    NotFound,
    #[error("Authentication rejected")]
    AuthenticationFailed,
    #[error("Association timed out")]
    Timeout,
    #[error("Link driver error: {details}")]
    Driver { details: &'static str },
}

/// Try to join the configured network.
///
/// `attempt` is called with the 1-based attempt number until it succeeds or
/// `association_attempts` is exhausted. A budget of zero means no attempt is
/// made and the station starts offline.
pub fn associate<F>(config: &NetworkConfig<'_>, mut attempt: F) -> Connectivity
where
    F: FnMut(u8) -> Result<(), LinkError>,
{
    if config.ssid.is_empty() {
        info!("No network configured, running offline");
        return Connectivity::Offline;
    }

    for n in 1..=config.association_attempts {
        match attempt(n) {
            Ok(()) => {
                info!("Joined '{}' on attempt {}", config.ssid, n);
                return Connectivity::Online;
            }
            Err(e) => warn!(
                "Association attempt {}/{} failed: {}",
                n, config.association_attempts, e
            ),
        }
    }

    warn!(
        "Giving up on '{}' after {} attempts, running offline",
        config.ssid, config.association_attempts
    );
    Connectivity::Offline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network(attempts: u8) -> NetworkConfig<'static> {
        NetworkConfig {
            ssid: "station-net",
            password: "hunter22",
            association_attempts: attempts,
        }
    }

    #[test]
    fn test_first_success_stops_retrying() {
        let mut calls = 0;
        let result = associate(&network(10), |n| {
            calls += 1;
            if n == 3 { Ok(()) } else { Err(LinkError::Timeout) }
        });
        assert_eq!(result, Connectivity::Online);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_budget_is_bounded() {
        let mut calls = 0;
        let result = associate(&network(10), |_| {
            calls += 1;
            Err(LinkError::NotFound)
        });
        assert_eq!(result, Connectivity::Offline);
        assert_eq!(calls, 10);
    }

    #[test]
    fn test_zero_budget_and_missing_ssid() {
        let mut calls = 0;
        assert_eq!(
            associate(&network(0), |_| {
                calls += 1;
                Ok(())
            }),
            Connectivity::Offline
        );
        assert_eq!(
            associate(&NetworkConfig::default(), |_| {
                calls += 1;
                Ok(())
            }),
            Connectivity::Offline
        );
        assert_eq!(calls, 0);
    }
}
