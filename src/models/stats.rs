// Formatted server stats and monitor events (camelCase wire, as the web UI reads them)

use serde::Serialize;

use super::Varz;
use crate::format::{abbreviate_num, format_bytes, format_uptime, ms_time_diff};

/// Byte quantity scaled to the largest binary unit that keeps the value
/// under 1024; `display` is value and unit joined by one space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteValue {
    pub value: String,
    pub unit: String,
    pub display: String,
}

/// Count scaled to the largest K/M/B/T suffix that keeps the value under
/// 1000. `unit` is empty when no suffix applies, leaving `display` with a
/// trailing space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountValue {
    pub value: String,
    pub unit: String,
    pub display: String,
}

/// Display-ready stats for one poll: absolute gauges plus per-second rates
/// derived against the previous snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStats {
    pub server_name: String,
    pub version: String,
    pub uptime: String,
    pub cpu: f64,
    pub memory: ByteValue,
    pub conns: CountValue,
    pub total_conns: CountValue,
    pub subs: CountValue,
    pub slow_cons: CountValue,
    pub in_msgs: CountValue,
    pub out_msgs: CountValue,
    pub in_bytes: ByteValue,
    pub out_bytes: ByteValue,
    /// Elapsed server time since the previous sample; 0 on the first poll.
    pub time_delta_ms: i64,
    pub in_msgs_rate: CountValue,
    pub out_msgs_rate: CountValue,
    pub in_bytes_rate: ByteValue,
    pub out_bytes_rate: ByteValue,
}

/// Why a polling session halted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Timeout,
    Fetch,
    Other,
}

/// Classified halt reason, surfaced to subscribers exactly once.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorFailure {
    pub kind: FailureKind,
    pub detail: String,
}

/// One broadcast message per tick: stats on success, a failure on halt.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum MonitorEvent {
    Stats(ServerStats),
    Failed(MonitorFailure),
}

/// Derive display stats from the current snapshot and the one before it.
/// Counter deltas are clamped at zero so a post-restart decrease reads as a
/// 0 rate, never a negative one. With no previous snapshot the time delta
/// and all rates are 0.
pub fn derive_stats(previous: Option<&Varz>, current: &Varz) -> chrono::ParseResult<ServerStats> {
    let time_delta_ms = match previous {
        Some(prev) => ms_time_diff(&current.now, &prev.now)?,
        None => 0,
    };
    let time_delta_sec = time_delta_ms as f64 / 1000.0;

    let in_msgs_rate = rate(current.in_msgs, previous.map(|p| p.in_msgs), time_delta_sec);
    let out_msgs_rate = rate(current.out_msgs, previous.map(|p| p.out_msgs), time_delta_sec);
    let in_bytes_rate = rate(current.in_bytes, previous.map(|p| p.in_bytes), time_delta_sec);
    let out_bytes_rate = rate(current.out_bytes, previous.map(|p| p.out_bytes), time_delta_sec);

    Ok(ServerStats {
        server_name: current.server_name.clone(),
        version: current.version.clone(),
        uptime: format_uptime(&current.uptime),
        cpu: current.cpu,
        memory: format_bytes(current.mem as f64),
        conns: abbreviate_num(current.connections as f64),
        total_conns: abbreviate_num(current.total_connections as f64),
        subs: abbreviate_num(current.subscriptions as f64),
        slow_cons: abbreviate_num(current.slow_consumers as f64),
        in_msgs: abbreviate_num(current.in_msgs as f64),
        out_msgs: abbreviate_num(current.out_msgs as f64),
        in_bytes: format_bytes(current.in_bytes as f64),
        out_bytes: format_bytes(current.out_bytes as f64),
        time_delta_ms,
        in_msgs_rate: abbreviate_num(in_msgs_rate),
        out_msgs_rate: abbreviate_num(out_msgs_rate),
        in_bytes_rate: format_bytes(in_bytes_rate),
        out_bytes_rate: format_bytes(out_bytes_rate),
    })
}

/// Per-second rate of a cumulative counter between two samples.
fn rate(current: i64, previous: Option<i64>, time_delta_sec: f64) -> f64 {
    let delta = current - previous.unwrap_or(0);
    if time_delta_sec > 0.0 {
        delta.max(0) as f64 / time_delta_sec
    } else {
        0.0
    }
}
