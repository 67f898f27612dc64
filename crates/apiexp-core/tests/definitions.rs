//! Metric definition validation.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use apiexp_core::metric::{self, validate_definitions, HTTP_REQUEST_NUM};
use apiexp_core::{LabelName, MetricDefinition, MetricKind, ValueSource};

fn by_path(name: &str) -> MetricDefinition {
    MetricDefinition::new(
        name,
        "help",
        MetricKind::Gauge,
        ValueSource::Requests,
        vec![LabelName::Path],
    )
}

#[test]
fn duplicate_name_is_rejected() {
    let defs = vec![by_path("a_total"), by_path("a_total")];
    let err = validate_definitions(&defs).expect_err("must fail");
    assert_eq!(err.code().as_str(), "REGISTRATION");
    assert!(err.to_string().contains("a_total"));
}

#[test]
fn unknown_label_name_is_rejected() {
    let err = MetricDefinition::parse_labels(
        "x",
        "help",
        MetricKind::Gauge,
        ValueSource::Requests,
        &["path", "tenant"],
    )
    .expect_err("must fail");
    assert_eq!(err.code().as_str(), "REGISTRATION");
}

#[test]
fn repeated_label_is_rejected() {
    let def = MetricDefinition::new(
        "x",
        "help",
        MetricKind::Gauge,
        ValueSource::Requests,
        vec![LabelName::Path, LabelName::Path],
    );
    assert!(def.validate().is_err());
}

#[test]
fn runtime_driven_metric_must_be_unlabeled_counter() {
    let labeled = MetricDefinition::new(
        "up",
        "help",
        MetricKind::Counter,
        ValueSource::UptimeTicks,
        vec![LabelName::Path],
    );
    assert!(labeled.validate().is_err());

    let windowed =
        MetricDefinition::new("up", "help", MetricKind::Gauge, ValueSource::UptimeTicks, vec![]);
    assert!(windowed.validate().is_err());
}

#[test]
fn parse_labels_keeps_order() {
    let def = MetricDefinition::parse_labels(
        "from",
        "help",
        MetricKind::Gauge,
        ValueSource::Requests,
        &["ip", "path", "code"],
    )
    .unwrap();
    assert_eq!(def.labels(), [LabelName::Ip, LabelName::Path, LabelName::Code]);
}

#[test]
fn default_set_shape() {
    let defs = metric::default_definitions();
    let windowed: Vec<_> = defs
        .iter()
        .filter(|d| d.kind().is_windowed())
        .map(|d| d.name())
        .collect();
    assert_eq!(windowed.len(), 4);
    assert!(windowed.contains(&HTTP_REQUEST_NUM));
    let uptime = defs.iter().find(|d| d.source() == ValueSource::UptimeTicks).unwrap();
    assert_eq!(uptime.name(), "uptime");
    assert!(uptime.labels().is_empty());
    assert!(uptime.help().contains("ticks"));
}
