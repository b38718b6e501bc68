use std::sync::{Arc, RwLock};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use super::{TraceRecord, TraceSink, fmt_time};

/// Cloneable handle for reading the most recent trace record.
#[derive(Clone, Default)]
pub struct TraceHandle {
    inner: Arc<RwLock<Arc<TraceRecord>>>,
}

impl TraceHandle {
    /// Get the latest record snapshot.
    pub fn latest(&self) -> Arc<TraceRecord> {
        self.inner
            .read()
            .map(|r| Arc::clone(&*r))
            .unwrap_or_default()
    }

    /// Replace the stored record with a new snapshot.
    fn store(&self, record: TraceRecord) {
        if let Ok(mut w) = self.inner.write() {
            *w = Arc::new(record);
        }
    }
}

/// Sink that always keeps the latest record available via a shared handle.
///
/// Suitable for a live tuning display that polls the loop from outside.
#[derive(Serialize, Deserialize, Default)]
pub struct LatestTraceSink {
    #[serde(skip)]
    handle: TraceHandle,
}

impl LatestTraceSink {
    pub fn new() -> (Self, TraceHandle) {
        let handle = TraceHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

#[typetag::serde]
impl TraceSink for LatestTraceSink {
    fn record(&mut self, time: SystemTime, values: &[(&str, f64)]) {
        self.handle.store(TraceRecord {
            system_time: fmt_time(time),
            values: values
                .iter()
                .map(|(name, value)| ((*name).to_owned(), *value))
                .collect(),
        });
    }
}
