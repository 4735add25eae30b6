// Prometheus counters for runs and batches
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    /// kind: single | batch | exec, verdict: passed | failed | error
    pub static ref RUNS_TOTAL: IntCounterVec = register_counter_vec(
        "testbench_runs_total",
        "Single test case runs and free-form executions",
        &["kind", "verdict"],
    );

    /// outcome: passed | failed | error
    pub static ref BATCHES_TOTAL: IntCounterVec = register_counter_vec(
        "testbench_batches_total",
        "Batch submissions over all test cases",
        &["outcome"],
    );
}

fn register_counter_vec(name: &str, help: &str, labels: &[&str]) -> IntCounterVec {
    let counter = IntCounterVec::new(Opts::new(name, help), labels)
        .unwrap_or_else(|e| panic!("invalid metric definition {}: {}", name, e));
    REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap_or_else(|e| panic!("failed to register metric {}: {}", name, e));
    counter
}

pub fn record_run(kind: &str, verdict: &str) {
    RUNS_TOTAL.with_label_values(&[kind, verdict]).inc();
}

pub fn record_batch(outcome: &str) {
    BATCHES_TOTAL.with_label_values(&[outcome]).inc();
}

/// Everything in the registry, in the Prometheus text format
pub fn render() -> Result<String, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_counters() {
        record_run("single", "passed");
        record_batch("failed");

        let text = render().unwrap();
        assert!(text.contains("testbench_runs_total"));
        assert!(text.contains("kind=\"single\""));
        assert!(text.contains("testbench_batches_total"));
        assert!(text.contains("outcome=\"failed\""));
    }
}
