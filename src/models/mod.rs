// Domain models (varz wire format in, formatted stats out)

mod stats;
mod varz;

pub use stats::{
    ByteValue, CountValue, FailureKind, MonitorEvent, MonitorFailure, ServerStats, derive_stats,
};
pub use varz::{SampleHistory, Varz};
