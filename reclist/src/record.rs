//! Result records and the normalization of test return values.

use crate::annotation::{ChartType, TestDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Number of leading items shown when previewing a distribution.
pub const PREVIEW_LEN: usize = 3;

/// Decimal places kept when displaying a scalar.
pub const DISPLAY_DECIMALS: i32 = 4;

/// Value returned by a rec test.
///
/// The shape is whatever the test computed; which chart (if any) is drawn
/// for it is decided by the test's declared [`ChartType`], not by this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestOutcome {
    /// A single number
    Scalar(f64),
    /// Category name to number, e.g. accuracy per country
    Categories(BTreeMap<String, f64>),
    /// An ordered sequence of numbers, e.g. per-miss similarity scores
    Distribution(Vec<f64>),
    /// Anything else, kept as JSON
    Other(serde_json::Value),
}

impl TestOutcome {
    /// Human-readable name of the value's shape.
    pub fn shape(&self) -> &'static str {
        match self {
            TestOutcome::Scalar(_) => "scalar",
            TestOutcome::Categories(_) => "mapping",
            TestOutcome::Distribution(_) => "sequence",
            TestOutcome::Other(_) => "other",
        }
    }

    /// The scalar value, if this outcome is one.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            TestOutcome::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    /// Summary-table rendering: scalars rounded, mappings pretty-printed,
    /// sequences cut to a short preview.
    pub fn display_value(&self) -> String {
        match self {
            TestOutcome::Scalar(value) => round_for_display(*value).to_string(),
            TestOutcome::Categories(map) => {
                serde_json::to_string_pretty(map).unwrap_or_else(|_| format!("{:?}", map))
            }
            TestOutcome::Distribution(values) => {
                let mut preview: Vec<serde_json::Value> = values
                    .iter()
                    .take(PREVIEW_LEN)
                    .map(|v| serde_json::json!(v))
                    .collect();
                preview.push(serde_json::Value::String("...".to_string()));
                serde_json::to_string_pretty(&preview).unwrap_or_else(|_| format!("{:?}", values))
            }
            TestOutcome::Other(value) => match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        }
    }
}

fn round_for_display(value: f64) -> f64 {
    let factor = 10f64.powi(DISPLAY_DECIMALS);
    (value * factor).round() / factor
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Scalar(value) => write!(f, "{}", value),
            TestOutcome::Categories(map) => {
                write!(f, "{}", serde_json::to_string(map).map_err(|_| fmt::Error)?)
            }
            TestOutcome::Distribution(values) => {
                write!(f, "{}", serde_json::to_string(values).map_err(|_| fmt::Error)?)
            }
            TestOutcome::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for TestOutcome {
    fn from(value: f64) -> Self {
        TestOutcome::Scalar(value)
    }
}

impl From<f32> for TestOutcome {
    fn from(value: f32) -> Self {
        TestOutcome::Scalar(f64::from(value))
    }
}

impl From<BTreeMap<String, f64>> for TestOutcome {
    fn from(value: BTreeMap<String, f64>) -> Self {
        TestOutcome::Categories(value)
    }
}

impl From<HashMap<String, f64>> for TestOutcome {
    fn from(value: HashMap<String, f64>) -> Self {
        TestOutcome::Categories(value.into_iter().collect())
    }
}

impl From<Vec<f64>> for TestOutcome {
    fn from(value: Vec<f64>) -> Self {
        TestOutcome::Distribution(value)
    }
}

impl From<serde_json::Value> for TestOutcome {
    fn from(value: serde_json::Value) -> Self {
        TestOutcome::Other(value)
    }
}

impl From<TestOutcome> for serde_json::Value {
    fn from(outcome: TestOutcome) -> Self {
        serde_json::to_value(&outcome).unwrap_or(serde_json::Value::Null)
    }
}

/// Normalized outcome of one executed rec test.
///
/// Serialized as `{name, description, result, display_type}`; `name` is the
/// test's display label. The test's own identifier is kept in `test` for
/// naming charts but is not part of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(skip)]
    pub test: String,
    pub name: String,
    pub description: String,
    pub result: TestOutcome,
    pub display_type: Option<ChartType>,
}

impl TestRecord {
    pub fn new(descriptor: &TestDescriptor, result: TestOutcome) -> Self {
        Self {
            test: descriptor.name.clone(),
            name: descriptor.display_label.clone(),
            description: descriptor.description.clone(),
            result,
            display_type: descriptor.chart_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_display_rounds_only_for_display() {
        let outcome = TestOutcome::from(0.123456789);
        assert_eq!(outcome.display_value(), "0.1235");
        assert_eq!(outcome.as_scalar(), Some(0.123456789));

        assert_eq!(TestOutcome::from(0.8).display_value(), "0.8");
    }

    #[test]
    fn test_distribution_preview() {
        let outcome = TestOutcome::from(vec![0.1, 0.2, 0.3, 0.4, 0.5]);
        let preview: serde_json::Value = serde_json::from_str(&outcome.display_value()).unwrap();
        assert_eq!(preview, json!([0.1, 0.2, 0.3, "..."]));
    }

    #[test]
    fn test_categories_display_is_pretty_json() {
        let mut map = BTreeMap::new();
        map.insert("US".to_string(), 10.0);
        map.insert("CA".to_string(), 20.0);
        let outcome = TestOutcome::from(map);

        let display = outcome.display_value();
        assert!(display.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&display).unwrap();
        assert_eq!(parsed, json!({"CA": 20.0, "US": 10.0}));
    }

    #[test]
    fn test_other_falls_back_to_text() {
        assert_eq!(TestOutcome::from(json!("fine")).display_value(), "fine");
        assert_eq!(TestOutcome::from(json!(true)).display_value(), "true");
    }

    #[test]
    fn test_untagged_deserialization_picks_shape() {
        let scalar: TestOutcome = serde_json::from_value(json!(0.5)).unwrap();
        assert_eq!(scalar, TestOutcome::Scalar(0.5));

        let categories: TestOutcome = serde_json::from_value(json!({"US": 10})).unwrap();
        assert_eq!(categories.shape(), "mapping");

        let distribution: TestOutcome = serde_json::from_value(json!([1, 2.5])).unwrap();
        assert_eq!(distribution, TestOutcome::Distribution(vec![1.0, 2.5]));

        let other: TestOutcome = serde_json::from_value(json!({"nested": {"a": 1}})).unwrap();
        assert_eq!(other.shape(), "other");
    }

    #[test]
    fn test_record_serialization_shape() {
        let descriptor = TestDescriptor {
            name: "accuracy".to_string(),
            display_label: "Accuracy".to_string(),
            chart_kind: Some(ChartType::Scalar),
            description: "Compute the accuracy".to_string(),
        };
        let record = TestRecord::new(&descriptor, TestOutcome::from(0.8));
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "Accuracy",
                "description": "Compute the accuracy",
                "result": 0.8,
                "display_type": "scalar"
            })
        );
        assert_eq!(record.test, "accuracy");
    }
}
