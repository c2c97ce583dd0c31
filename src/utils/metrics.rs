use std::collections::HashMap;
use std::sync::Arc;
use lazy_static::lazy_static;
use parking_lot::Mutex;

/// Metrics registry (simple, Prometheus-style)
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    gauges: Arc<Mutex<HashMap<String, f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1);
    }

    pub fn add_counter(&self, name: &str, by: u64) {
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += by;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn set_gauge(&self, name: &str, val: f64) {
        let mut gauges = self.gauges.lock();
        gauges.insert(name.to_string(), val);
    }

    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, f64>) {
        (self.counters.lock().clone(), self.gauges.lock().clone())
    }

    /// One-line `name=value` rendering of every metric, sorted by name.
    pub fn summary(&self) -> String {
        let (counters, gauges) = self.snapshot();
        let mut parts: Vec<String> = counters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        parts.extend(gauges.iter().map(|(k, v)| format!("{}={}", k, v)));
        parts.sort();
        parts.join(" ")
    }
}

lazy_static! {
    pub static ref METRICS: MetricsRegistry = MetricsRegistry::new();
}
