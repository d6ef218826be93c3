//! Tracing subscriber setup.
//!
//! Logs always go to stdout through a `fmt` layer filtered by `RUST_LOG`
//! (default `info`). With the `telemetry` feature, spans are additionally
//! exported over OTLP when any `OTEL_EXPORTER_OTLP_*` variable is set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
use otlp::{TelemetryProtocol, init_tracer_provider};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installed tracing pipeline. Flushes pending spans when dropped.
#[allow(missing_debug_implementations)]
pub struct Telemetry {
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<opentelemetry_sdk::trace::SdkTracerProvider>,
}

impl Telemetry {
    /// Installs the global tracing subscriber.
    ///
    /// # Panics
    ///
    /// Panics if a global subscriber was already installed, or if the OTLP
    /// exporter cannot be built.
    #[must_use]
    pub fn init() -> Self {
        #[cfg(feature = "telemetry")]
        {
            if let Some(protocol) = TelemetryProtocol::from_env() {
                use opentelemetry::trace::TracerProvider as _;

                let tracer_provider = init_tracer_provider(protocol);
                let tracer = tracer_provider.tracer("relay402-gateway");
                tracing_subscriber::registry()
                    .with(env_filter())
                    .with(tracing_subscriber::fmt::layer())
                    .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
                    .init();
                tracing::info!(?protocol, "OpenTelemetry span export enabled");
                return Self {
                    tracer_provider: Some(tracer_provider),
                };
            }
        }

        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .init();
        Self {
            #[cfg(feature = "telemetry")]
            tracer_provider: None,
        }
    }
}

impl Drop for Telemetry {
    fn drop(&mut self) {
        #[cfg(feature = "telemetry")]
        {
            if let Some(tracer_provider) = self.tracer_provider.take() {
                if let Err(e) = tracer_provider.shutdown() {
                    tracing::warn!("Failed to flush spans: {e}");
                }
            }
        }
    }
}

#[cfg(feature = "telemetry")]
mod otlp {
    use std::env;

    use opentelemetry::KeyValue;
    use opentelemetry_sdk::Resource;
    use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
    use opentelemetry_semantic_conventions::SCHEMA_URL;
    use opentelemetry_semantic_conventions::attribute::{
        DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION,
    };

    /// OTLP transport.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) enum TelemetryProtocol {
        Http,
        Grpc,
    }

    impl TelemetryProtocol {
        /// Returns the protocol to export with, or `None` when OTLP is not configured.
        pub(super) fn from_env() -> Option<Self> {
            let enabled = ["ENDPOINT", "HEADERS", "PROTOCOL"]
                .iter()
                .any(|suffix| env::var(format!("OTEL_EXPORTER_OTLP_{suffix}")).is_ok());
            enabled.then(|| Self::parse(env::var("OTEL_EXPORTER_OTLP_PROTOCOL").ok().as_deref()))
        }

        fn parse(value: Option<&str>) -> Self {
            match value {
                Some("grpc") => Self::Grpc,
                _ => Self::Http,
            }
        }
    }

    fn resource() -> Resource {
        let deployment_env = env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_owned());
        Resource::builder()
            .with_service_name(env!("CARGO_PKG_NAME"))
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    pub(super) fn init_tracer_provider(protocol: TelemetryProtocol) -> SdkTracerProvider {
        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::Http => exporter.with_http().build(),
            TelemetryProtocol::Grpc => exporter.with_tonic().build(),
        };
        let exporter = exporter.expect("Failed to build OTLP span exporter");

        SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(resource())
            .with_batch_exporter(exporter)
            .build()
    }

}
