// Raw snapshot models for the /varz monitoring endpoint

use serde::{Deserialize, Serialize};

/// One point-in-time read of a server's monitoring counters (the subset of
/// /varz the dashboard consumes). Every field is defaulted: servers omit
/// sections depending on configuration and version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Varz {
    pub server_id: String,
    pub server_name: String,
    pub version: String,
    /// Compact duration string, e.g. "2d3h40m".
    pub uptime: String,
    /// Server-reported wall clock (RFC 3339). Rate windows are measured on
    /// this, not on request time.
    pub now: String,
    pub cpu: f64,
    pub mem: u64,
    pub connections: u64,
    pub total_connections: u64,
    pub subscriptions: u64,
    pub slow_consumers: u64,
    pub in_msgs: i64,
    pub out_msgs: i64,
    pub in_bytes: i64,
    pub out_bytes: i64,
}

/// The rolling pair of snapshots rates are derived from. `previous` stays
/// absent until the second successful poll.
#[derive(Debug, Default)]
pub struct SampleHistory {
    previous: Option<Varz>,
    current: Option<Varz>,
}

impl SampleHistory {
    pub fn previous(&self) -> Option<&Varz> {
        self.previous.as_ref()
    }

    pub fn current(&self) -> Option<&Varz> {
        self.current.as_ref()
    }

    /// The just-consumed current becomes previous; `next` becomes current.
    pub fn advance(&mut self, next: Varz) {
        self.previous = self.current.take();
        self.current = Some(next);
    }
}
