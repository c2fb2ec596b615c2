use super::alerts::{AlertDispatcher, AlertEvent, CORRELATION_FIELDS, SpanSummary};
use super::config::ServiceContext;
use chrono::Utc;
use std::collections::BTreeMap;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

const REDACTED: &str = "[REDACTED]";
const SENSITIVE_MARKERS: [&str; 6] = [
    "secret",
    "token",
    "password",
    "authorization",
    "webhook",
    "signature",
];

/// Turns events at or above `min_level` into alerts.
#[derive(Clone)]
pub(crate) struct ErrorAlertLayer {
    dispatcher: AlertDispatcher,
    service_context: ServiceContext,
    min_level: Level,
}

impl ErrorAlertLayer {
    pub(crate) fn new(
        dispatcher: AlertDispatcher,
        service_context: ServiceContext,
        min_level: Level,
    ) -> Self {
        Self {
            dispatcher,
            service_context,
            min_level,
        }
    }
}

#[derive(Default)]
struct FieldMapVisitor {
    values: BTreeMap<String, String>,
}

impl FieldMapVisitor {
    fn put(&mut self, field: &Field, value: String) {
        let name = field.name();
        let value = if is_sensitive(name) {
            REDACTED.to_string()
        } else {
            value
        };
        self.values.insert(name.to_string(), value);
    }
}

impl Visit for FieldMapVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.put(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

/// Span fields cached in the span's extensions.
struct SpanFieldMap(BTreeMap<String, String>);

/// Fills correlation fields the event left out from the innermost span that
/// carries them, so an `error!` inside a booking span still names the booking.
fn inherit_correlation(fields: &mut BTreeMap<String, String>, spans: &[SpanSummary]) {
    for key in CORRELATION_FIELDS {
        if fields.contains_key(key) {
            continue;
        }
        if let Some(value) = spans.iter().rev().find_map(|span| span.fields.get(key)) {
            fields.insert(key.to_string(), value.clone());
        }
    }
}

impl<S> Layer<S> for ErrorAlertLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut collector = FieldMapVisitor::default();
        attrs.record(&mut collector);

        if collector.values.is_empty() {
            return;
        }
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(SpanFieldMap(collector.values));
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut collector = FieldMapVisitor::default();
        values.record(&mut collector);
        if collector.values.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<SpanFieldMap>() {
            Some(existing) => existing.0.extend(collector.values),
            None => extensions.insert(SpanFieldMap(collector.values)),
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.min_level {
            return;
        }

        let mut collector = FieldMapVisitor::default();
        event.record(&mut collector);
        let message = collector.values.remove("message").map(|raw| unquote(&raw));

        let spans = ctx
            .event_span(event)
            .map(|span| {
                span.scope()
                    .from_root()
                    .map(|s| SpanSummary {
                        name: s.metadata().name().to_string(),
                        fields: s
                            .extensions()
                            .get::<SpanFieldMap>()
                            .map(|f| f.0.clone())
                            .unwrap_or_default(),
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let mut fields = collector.values;
        inherit_correlation(&mut fields, &spans);

        let location = match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => Some(format!("{file}:{line}")),
            _ => None,
        };

        self.dispatcher.dispatch(AlertEvent {
            level: *metadata.level(),
            timestamp: Utc::now(),
            service_name: self.service_context.service_name.clone(),
            environment: self.service_context.environment.clone(),
            component: self.service_context.component.clone(),
            target: metadata.target().to_string(),
            location,
            message,
            fields,
            spans,
        });
    }
}

fn unquote(input: &str) -> String {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

fn is_sensitive(field_name: &str) -> bool {
    let field = field_name.to_ascii_lowercase();
    SENSITIVE_MARKERS.iter().any(|marker| field.contains(marker))
}
