//! Prometheus exposition of a sample set.
//!
//! Samples are regrouped into `prometheus` metric families, one per metric
//! name in order of first appearance, and rendered by its `TextEncoder`.

use prometheus::proto::{Counter, Gauge, LabelPair, Metric, MetricFamily, MetricType};
use prometheus::{Encoder, TextEncoder};

use crate::descriptor::DescriptorRegistry;
use crate::error::MonitorError;
use crate::sample::{MetricKind, Sample};

/// Content type of [`encode_text`] output.
pub fn content_type() -> String {
    TextEncoder::new().format_type().to_string()
}

/// Group samples into families. Kind and help come from the registry when it
/// knows the family, otherwise from the first sample.
pub fn metric_families(registry: &DescriptorRegistry, samples: &[Sample]) -> Vec<MetricFamily> {
    let mut families: Vec<MetricFamily> = Vec::new();
    for sample in samples {
        let index = match families.iter().position(|f| f.get_name() == sample.name) {
            Some(index) => index,
            None => {
                let (kind, help) = match registry.find(&sample.name) {
                    Some(desc) => (desc.kind, desc.help),
                    None => (sample.kind, ""),
                };
                families.push(family(&sample.name, kind, help));
                families.len() - 1
            }
        };
        let family = &mut families[index];
        let kind = match family.get_field_type() {
            MetricType::COUNTER => MetricKind::Counter,
            _ => MetricKind::Gauge,
        };
        family.mut_metric().push(metric(sample, kind));
    }
    families
}

/// Render samples in the Prometheus text format.
pub fn encode_text(registry: &DescriptorRegistry, samples: &[Sample]) -> Result<String, MonitorError> {
    let families = metric_families(registry, samples);
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn family(name: &str, kind: MetricKind, help: &str) -> MetricFamily {
    let mut family = MetricFamily::default();
    family.set_name(name.to_string());
    family.set_help(help.to_string());
    family.set_field_type(match kind {
        MetricKind::Gauge => MetricType::GAUGE,
        MetricKind::Counter => MetricType::COUNTER,
    });
    family
}

fn metric(sample: &Sample, kind: MetricKind) -> Metric {
    let mut metric = Metric::default();
    for (name, value) in &sample.labels {
        let mut pair = LabelPair::default();
        pair.set_name(name.clone());
        pair.set_value(value.clone());
        metric.mut_label().push(pair);
    }
    match kind {
        MetricKind::Gauge => {
            let mut gauge = Gauge::default();
            gauge.set_value(sample.value);
            metric.set_gauge(gauge);
        }
        MetricKind::Counter => {
            let mut counter = Counter::default();
            counter.set_value(sample.value);
            metric.set_counter(counter);
        }
    }
    metric
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DescriptorSpec;

    const SPECS: &[DescriptorSpec] = &[
        DescriptorSpec {
            name: "up",
            kind: MetricKind::Gauge,
            labels: &[],
            help: "Is OVN stack up (1) or is it down (0).",
        },
        DescriptorSpec {
            name: "failed_req_count",
            kind: MetricKind::Counter,
            labels: &["system_id"],
            help: "The number of failed requests to OVN stack.",
        },
    ];

    #[test]
    fn test_encode_headers_and_values() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let samples = vec![
            registry.get(0).sample(1.0, &[]).unwrap(),
            registry.get(1).sample(7.0, &["host-a"]).unwrap(),
        ];
        let text = encode_text(&registry, &samples).unwrap();
        let expected = "\
# HELP ovn_up Is OVN stack up (1) or is it down (0).
# TYPE ovn_up gauge
ovn_up 1
# HELP ovn_failed_req_count The number of failed requests to OVN stack.
# TYPE ovn_failed_req_count counter
ovn_failed_req_count{system_id=\"host-a\"} 7
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_families_group_in_first_seen_order() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let samples = vec![
            registry.get(1).sample(1.0, &["a"]).unwrap(),
            registry.get(0).sample(0.0, &[]).unwrap(),
            registry.get(1).sample(2.5, &["c"]).unwrap(),
        ];
        let families = metric_families(&registry, &samples);
        assert_eq!(families.len(), 2);
        assert_eq!(families[0].get_name(), "ovn_failed_req_count");
        assert_eq!(families[0].get_field_type(), MetricType::COUNTER);
        assert_eq!(families[0].get_metric().len(), 2);
        assert_eq!(families[0].get_metric()[1].get_counter().get_value(), 2.5);
        assert_eq!(families[0].get_metric()[1].get_label()[0].get_value(), "c");
        assert_eq!(families[1].get_name(), "ovn_up");
        assert_eq!(families[1].get_field_type(), MetricType::GAUGE);
    }

    #[test]
    fn test_label_values_are_escaped() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let samples = vec![registry.get(1).sample(1.0, &["a\"b\\c"]).unwrap()];
        let text = encode_text(&registry, &samples).unwrap();
        assert!(text.contains("ovn_failed_req_count{system_id=\"a\\\"b\\\\c\"} 1\n"));
    }

    #[test]
    fn test_unknown_family_keeps_sample_kind() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let samples = vec![Sample::new("other_total", MetricKind::Counter, 3.0)];
        let families = metric_families(&registry, &samples);
        assert_eq!(families[0].get_field_type(), MetricType::COUNTER);
        assert!(encode_text(&registry, &samples).unwrap().contains("other_total 3\n"));
    }

    #[test]
    fn test_content_type() {
        assert!(content_type().starts_with("text/plain; version=0.0.4"));
    }
}
