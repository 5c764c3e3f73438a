use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("Failed to encode metrics: {0}")]
    Encoding(String),
}

/// Prometheus metrics for the menu service
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    // HTTP metrics
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    pub http_requests_in_flight: GaugeVec,

    // Database metrics
    pub database_operations_total: CounterVec,
    pub database_operation_duration_seconds: HistogramVec,

    // Business metrics
    pub menu_operations_total: CounterVec,
    pub menu_items_served: HistogramVec,
    pub admin_logins_total: CounterVec,
    pub admin_sessions_active: Gauge,
    pub image_uploads_total: CounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        info!("Initializing Prometheus metrics");

        let http_requests_total = CounterVec::new(
            Opts::new(
                "http_requests_total",
                "Total number of HTTP requests processed",
            ),
            &["method", "endpoint", "status_code"],
        )?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "endpoint"],
        )?;

        let http_requests_in_flight = GaugeVec::new(
            Opts::new(
                "http_requests_in_flight",
                "Number of HTTP requests currently being processed",
            ),
            &["method", "endpoint"],
        )?;

        let database_operations_total = CounterVec::new(
            Opts::new(
                "database_operations_total",
                "Total number of database operations",
            ),
            &["operation", "table", "status"],
        )?;

        let database_operation_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "database_operation_duration_seconds",
                "Database operation duration in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
            &["operation", "table"],
        )?;

        let menu_operations_total = CounterVec::new(
            Opts::new(
                "menu_operations_total",
                "Total number of menu operations by menu kind",
            ),
            &["operation", "kind", "status"],
        )?;

        let menu_items_served = HistogramVec::new(
            HistogramOpts::new(
                "menu_items_served",
                "Number of items returned per public menu request",
            )
            .buckets(vec![0.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
            &["kind", "language"],
        )?;

        let admin_logins_total = CounterVec::new(
            Opts::new("admin_logins_total", "Admin login attempts"),
            &["status"],
        )?;

        let admin_sessions_active =
            Gauge::new("admin_sessions_active", "Number of open admin sessions")?;

        let image_uploads_total = CounterVec::new(
            Opts::new("image_uploads_total", "Menu image uploads"),
            &["kind", "status"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(database_operations_total.clone()))?;
        registry.register(Box::new(database_operation_duration_seconds.clone()))?;
        registry.register(Box::new(menu_operations_total.clone()))?;
        registry.register(Box::new(menu_items_served.clone()))?;
        registry.register(Box::new(admin_logins_total.clone()))?;
        registry.register(Box::new(admin_sessions_active.clone()))?;
        registry.register(Box::new(image_uploads_total.clone()))?;

        info!("Prometheus metrics initialized successfully");

        Ok(Metrics {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            http_requests_in_flight,
            database_operations_total,
            database_operation_duration_seconds,
            menu_operations_total,
            menu_items_served,
            admin_logins_total,
            admin_sessions_active,
            image_uploads_total,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode all metrics in Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding(e.to_string()))
    }

    pub fn record_http_request(
        &self,
        method: &str,
        endpoint: &str,
        status_code: u16,
        duration_seconds: f64,
    ) {
        let status_str = status_code.to_string();

        self.http_requests_total
            .with_label_values(&[method, endpoint, &status_str])
            .inc();

        self.http_request_duration_seconds
            .with_label_values(&[method, endpoint])
            .observe(duration_seconds);
    }

    pub fn record_database_operation(
        &self,
        operation: &str,
        table: &str,
        success: bool,
        duration_seconds: f64,
    ) {
        let status = if success { "success" } else { "error" };

        self.database_operations_total
            .with_label_values(&[operation, table, status])
            .inc();

        self.database_operation_duration_seconds
            .with_label_values(&[operation, table])
            .observe(duration_seconds);
    }

    /// Count a category/item/menu operation for one menu kind
    pub fn record_menu_operation(&self, operation: &str, kind: &str, success: bool) {
        let status = if success { "success" } else { "error" };

        self.menu_operations_total
            .with_label_values(&[operation, kind, status])
            .inc();
    }

    pub fn record_menu_served(&self, kind: &str, language: &str, items: usize) {
        self.menu_items_served
            .with_label_values(&[kind, language])
            .observe(items as f64);
    }

    pub fn record_admin_login(&self, success: bool) {
        let status = if success { "success" } else { "rejected" };
        self.admin_logins_total.with_label_values(&[status]).inc();
    }

    pub fn set_admin_sessions(&self, count: usize) {
        self.admin_sessions_active.set(count as f64);
    }

    pub fn record_image_upload(&self, kind: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        self.image_uploads_total
            .with_label_values(&[kind, status])
            .inc();
    }

    pub fn increment_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .inc();
    }

    pub fn decrement_in_flight(&self, method: &str, endpoint: &str) {
        self.http_requests_in_flight
            .with_label_values(&[method, endpoint])
            .dec();
    }
}
