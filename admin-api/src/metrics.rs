use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

use crate::seeder::SeedReport;

#[derive(Clone)]
pub struct AuthMetrics {
    registry: Registry,
    login_attempts: IntCounterVec,
    refresh_attempts: IntCounterVec,
    seed_items: IntCounterVec,
}

impl AuthMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let login_attempts = IntCounterVec::new(
            Opts::new(
                "auth_login_attempts_total",
                "Count of login attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(login_attempts.clone()))?;

        let refresh_attempts = IntCounterVec::new(
            Opts::new(
                "auth_refresh_attempts_total",
                "Count of refresh attempts grouped by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(refresh_attempts.clone()))?;

        let seed_items = IntCounterVec::new(
            Opts::new(
                "auth_seed_items_total",
                "Count of seeded catalog items grouped by phase and outcome",
            ),
            &["phase", "outcome"],
        )?;
        registry.register(Box::new(seed_items.clone()))?;

        Ok(Self {
            registry,
            login_attempts,
            refresh_attempts,
            seed_items,
        })
    }

    pub fn login_attempt(&self, outcome: &str) {
        self.login_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn refresh_attempt(&self, outcome: &str) {
        self.refresh_attempts.with_label_values(&[outcome]).inc();
    }

    pub fn record_seed(&self, report: &SeedReport) {
        let counts = [
            ("permission", "created", report.permissions_created),
            ("permission", "existing", report.permissions_existing),
            ("permission", "failed", report.permissions_failed),
            ("role", "created", report.roles_created),
            ("role", "updated", report.roles_updated),
            ("role", "failed", report.roles_failed),
            ("grant", "added", report.grants_added),
            ("grant", "failed", report.grants_failed),
        ];
        for (phase, outcome, count) in counts {
            self.seed_items
                .with_label_values(&[phase, outcome])
                .inc_by(count as u64);
        }
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
