// src/metrics.rs
//! Board and publish counters, plus an optional Prometheus recorder for the
//! console binary (`metrics` command renders the exposition text).

use anyhow::{Context as _, Result};
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const BOARD_MUTATIONS: &str = "board_mutations_total";
pub const VISITOR_INCREMENTS: &str = "board_visitor_increments_total";
pub const FALLBACKS: &str = "board_fallbacks_total";
pub const PUBLISHES: &str = "content_publish_total";

/// One-time registration so series show up before the first increment.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            BOARD_MUTATIONS,
            "Notice/guest-post writes by operation and outcome."
        );
        describe_counter!(VISITOR_INCREMENTS, "Visitor counter increments.");
        describe_counter!(
            FALLBACKS,
            "Starts that ended in demo mode (local storage)."
        );
        describe_counter!(PUBLISHES, "Content publish attempts by outcome.");
    });
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "error"
    }
}

pub fn record_mutation(op: &'static str, ok: bool) {
    ensure_metrics_described();
    counter!(BOARD_MUTATIONS, "op" => op, "outcome" => outcome(ok)).increment(1);
}

pub fn record_visitor_increment(ok: bool) {
    ensure_metrics_described();
    counter!(VISITOR_INCREMENTS, "outcome" => outcome(ok)).increment(1);
}

pub fn record_fallback(reason: &'static str) {
    ensure_metrics_described();
    counter!(FALLBACKS, "reason" => reason).increment(1);
}

pub fn record_publish(label: &'static str) {
    ensure_metrics_described();
    counter!(PUBLISHES, "outcome" => label).increment(1);
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the process-wide Prometheus recorder. Fails if one is already set.
    pub fn install() -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Prometheus exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
