use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub reconcile_runs_total: IntCounter,
    pub reconcile_pending_shipments: IntGauge,
    pub eligible_couriers: IntGauge,
    pub courier_lookup_failures_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Courier assignment attempts by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of a single courier assignment in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let reconcile_runs_total =
            IntCounter::new("reconcile_runs_total", "Reconciliation sweeps started")
                .expect("valid reconcile_runs_total metric");

        let reconcile_pending_shipments = IntGauge::new(
            "reconcile_pending_shipments",
            "Unassigned door-to-door shipments left after the last sweep",
        )
        .expect("valid reconcile_pending_shipments metric");

        let eligible_couriers = IntGauge::new(
            "eligible_couriers",
            "Couriers with a known position at the last lookup",
        )
        .expect("valid eligible_couriers metric");

        let courier_lookup_failures_total = IntCounter::new(
            "courier_lookup_failures_total",
            "User directory reads that failed during courier lookup",
        )
        .expect("valid courier_lookup_failures_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(reconcile_runs_total.clone()))
            .expect("register reconcile_runs_total");
        registry
            .register(Box::new(reconcile_pending_shipments.clone()))
            .expect("register reconcile_pending_shipments");
        registry
            .register(Box::new(eligible_couriers.clone()))
            .expect("register eligible_couriers");
        registry
            .register(Box::new(courier_lookup_failures_total.clone()))
            .expect("register courier_lookup_failures_total");

        Self {
            registry,
            assignments_total,
            assignment_latency_seconds,
            reconcile_runs_total,
            reconcile_pending_shipments,
            eligible_couriers,
            courier_lookup_failures_total,
        }
    }

    pub fn record_assignment(&self, outcome: &str, elapsed_seconds: f64) {
        self.assignments_total.with_label_values(&[outcome]).inc();
        self.assignment_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_seconds);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
