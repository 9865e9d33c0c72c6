// Prometheus metrics for the resize endpoint
//
// - Request outcome counters
// - Pipeline stage latency histograms (fetch, transform)
// - Source size histogram

use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramTimer, HistogramVec, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics registry for the service
pub struct ImagineMetrics {
    /// Resize requests by outcome (transformed, redirected, rejected, ...)
    pub requests: IntCounterVec,

    /// Pipeline stage duration histogram (in seconds)
    pub stage_duration: HistogramVec,

    /// Size of fetched source images (in bytes)
    pub source_bytes: Histogram,
}

/// Global singleton instance of metrics
static METRICS: OnceLock<ImagineMetrics> = OnceLock::new();

impl ImagineMetrics {
    /// Initialize and return the global metrics instance
    ///
    /// Registration happens on first use; subsequent calls return the same
    /// instance.
    pub fn global() -> &'static Self {
        METRICS.get_or_init(|| {
            let requests = register_int_counter_vec!(
                "imagine_requests_total",
                "Total number of resize requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register imagine_requests_total metric");

            let stage_duration = register_histogram_vec!(
                "imagine_stage_duration_seconds",
                "Duration of resize pipeline stages in seconds",
                &["stage"], // fetch, transform
                vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
            )
            .expect("Failed to register imagine_stage_duration_seconds metric");

            let source_bytes = register_histogram!(
                "imagine_source_bytes",
                "Size of fetched source images in bytes",
                prometheus::exponential_buckets(1024.0, 4.0, 10)
                    .expect("valid exponential bucket parameters")
            )
            .expect("Failed to register imagine_source_bytes metric");

            ImagineMetrics {
                requests,
                stage_duration,
                source_bytes,
            }
        })
    }

    /// Count one finished resize request
    pub fn record_outcome(&self, outcome: &str) {
        self.requests.with_label_values(&[outcome]).inc();
    }

    /// Start timing a pipeline stage; the duration is recorded on drop
    pub fn start_stage_timer(&self, stage: &str) -> HistogramTimer {
        self.stage_duration.with_label_values(&[stage]).start_timer()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn export(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            tracing::warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
