use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_assigned_total: IntCounter,
    pub orders_unassigned_total: IntCounter,
    pub orders_completed_total: IntCounter,
    pub imports_total: IntCounterVec,
    pub engine_latency_seconds: HistogramVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_assigned_total =
            IntCounter::new("orders_assigned_total", "Orders handed to a courier")
                .expect("valid orders_assigned_total metric");

        let orders_unassigned_total = IntCounter::new(
            "orders_unassigned_total",
            "Active orders released after a courier profile change",
        )
        .expect("valid orders_unassigned_total metric");

        let orders_completed_total =
            IntCounter::new("orders_completed_total", "Orders marked delivered")
                .expect("valid orders_completed_total metric");

        let imports_total = IntCounterVec::new(
            Opts::new("imports_total", "Import batches by entity and outcome"),
            &["entity", "outcome"],
        )
        .expect("valid imports_total metric");

        let engine_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "engine_latency_seconds",
                "Latency of engine operations in seconds",
            ),
            &["operation", "outcome"],
        )
        .expect("valid engine_latency_seconds metric");

        registry
            .register(Box::new(orders_assigned_total.clone()))
            .expect("register orders_assigned_total");
        registry
            .register(Box::new(orders_unassigned_total.clone()))
            .expect("register orders_unassigned_total");
        registry
            .register(Box::new(orders_completed_total.clone()))
            .expect("register orders_completed_total");
        registry
            .register(Box::new(imports_total.clone()))
            .expect("register imports_total");
        registry
            .register(Box::new(engine_latency_seconds.clone()))
            .expect("register engine_latency_seconds");

        Self {
            registry,
            orders_assigned_total,
            orders_unassigned_total,
            orders_completed_total,
            imports_total,
            engine_latency_seconds,
        }
    }

    /// Records one engine call under `operation`, labelled by whether it succeeded.
    pub fn observe<T, E>(&self, operation: &str, elapsed_secs: f64, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "success" } else { "error" };
        self.engine_latency_seconds
            .with_label_values(&[operation, outcome])
            .observe(elapsed_secs);
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
