use crate::error::MonitorError;
use crate::sample::{MetricKind, Sample};

/// Static description of a metric family.
#[derive(Debug, Clone, Copy)]
pub struct DescriptorSpec {
    pub name: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
    pub help: &'static str,
}

/// A metric family with its fully qualified name.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub fq_name: String,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
    pub help: &'static str,
}

impl Descriptor {
    /// Build a sample of this family. `label_values` pairs up positionally
    /// with the descriptor's label names and must match them in number.
    pub fn sample(&self, value: f64, label_values: &[&str]) -> Result<Sample, MonitorError> {
        if self.labels.len() != label_values.len() {
            return Err(MonitorError::LabelArity {
                name: self.fq_name.clone(),
                expected: self.labels.len(),
                actual: label_values.len(),
            });
        }
        Ok(Sample {
            name: self.fq_name.clone(),
            kind: self.kind,
            value,
            labels: self
                .labels
                .iter()
                .zip(label_values)
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }
}

/// Descriptors built once from a static table.
///
/// Lookups are positional: index `i` is the `i`-th entry of the table the
/// registry was built from.
#[derive(Debug, Clone)]
pub struct DescriptorRegistry {
    descriptors: Vec<Descriptor>,
}

impl DescriptorRegistry {
    pub fn new(namespace: &str, specs: &[DescriptorSpec]) -> Self {
        let descriptors = specs
            .iter()
            .map(|spec| Descriptor {
                fq_name: if namespace.is_empty() {
                    spec.name.to_string()
                } else {
                    format!("{}_{}", namespace, spec.name)
                },
                kind: spec.kind,
                labels: spec.labels,
                help: spec.help,
            })
            .collect();
        Self { descriptors }
    }

    pub fn get(&self, index: usize) -> &Descriptor {
        &self.descriptors[index]
    }

    pub fn find(&self, fq_name: &str) -> Option<&Descriptor> {
        self.descriptors.iter().find(|d| d.fq_name == fq_name)
    }

    /// Every descriptor, in table order.
    pub fn describe(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPECS: &[DescriptorSpec] = &[
        DescriptorSpec {
            name: "up",
            kind: MetricKind::Gauge,
            labels: &[],
            help: "Is the stack up.",
        },
        DescriptorSpec {
            name: "pid",
            kind: MetricKind::Gauge,
            labels: &["system_id", "component"],
            help: "Process id.",
        },
    ];

    #[test]
    fn test_registry_prefixes_namespace() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get(0).fq_name, "ovn_up");
        assert_eq!(registry.get(1).fq_name, "ovn_pid");
        assert!(registry.find("ovn_pid").is_some());
        assert!(registry.find("pid").is_none());
    }

    #[test]
    fn test_descriptor_sample() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let s = registry.get(1).sample(1234.0, &["sys", "ovn-northd"]).unwrap();
        assert_eq!(s.name, "ovn_pid");
        assert_eq!(s.kind, MetricKind::Gauge);
        assert_eq!(
            s.labels,
            vec![
                ("system_id".to_string(), "sys".to_string()),
                ("component".to_string(), "ovn-northd".to_string()),
            ]
        );
    }

    #[test]
    fn test_label_arity_is_checked() {
        let registry = DescriptorRegistry::new("ovn", SPECS);
        let err = registry.get(1).sample(1.0, &["sys"]).unwrap_err();
        assert!(matches!(
            err,
            MonitorError::LabelArity {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(registry.get(0).sample(1.0, &["extra"]).is_err());
        assert!(registry.get(0).sample(1.0, &[]).is_ok());
    }
}
