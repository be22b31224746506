//! Marking suite methods as rec tests.
//!
//! A suite declares its tests with [`rec_tests!`](crate::rec_tests), which
//! keeps each method exactly as written and records a [`TestDescriptor`]
//! next to it:
//!
//! ```rust
//! use reclist::annotation::{RecList, TestResult};
//! use reclist::rec_tests;
//!
//! struct Toy;
//!
//! rec_tests! {
//!     impl Toy {
//!         /// Compute the accuracy
//!         #[rec_test(test_type = "Accuracy", display = Scalar)]
//!         pub fn accuracy(&self) -> TestResult<f64> {
//!             Ok(0.8)
//!         }
//!     }
//! }
//!
//! impl RecList for Toy {
//!     fn model_name(&self) -> String {
//!         "ToyModel".to_string()
//!     }
//! }
//!
//! // the annotated method is still an ordinary method
//! assert_eq!(Toy.accuracy().unwrap(), 0.8);
//! ```

use crate::metrics::MetricError;
use crate::record::TestOutcome;
use serde::{Deserialize, Serialize};
use similarity::SimilarityError;
use std::fmt;
use thiserror::Error;

/// Errors raised from inside a rec test body
#[derive(Error, Debug)]
pub enum TestError {
    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    #[error("Similarity error: {0}")]
    Similarity(#[from] SimilarityError),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("{0}")]
    Failed(String),
}

pub type TestResult<T> = Result<T, TestError>;

/// Declared rendering intent for a test's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    /// A single number; not plotted
    Scalar,
    /// Bar chart of a category → value mapping
    Bars,
    /// Histogram of a sequence of values
    Bins,
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChartType::Scalar => "scalar",
            ChartType::Bars => "bars",
            ChartType::Bins => "bins",
        };
        write!(f, "{}", label)
    }
}

/// Metadata attached to a rec test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestDescriptor {
    /// Identifier of the test method
    pub name: String,
    /// Category label shown in reports and sent to telemetry
    pub display_label: String,
    /// Chart drawn for the result, if any
    pub chart_kind: Option<ChartType>,
    /// Documentation of the test method
    pub description: String,
}

/// A test body: the suite plus the arguments the run was started with.
pub type TestFn<S> = fn(&S, &<S as RecTests>::Args) -> TestResult<TestOutcome>;

/// A test callable paired with its descriptor.
pub struct RecTest<S: RecTests> {
    descriptor: TestDescriptor,
    func: TestFn<S>,
}

impl<S: RecTests> RecTest<S> {
    pub fn new(
        name: impl Into<String>,
        display_label: impl Into<String>,
        chart_kind: Option<ChartType>,
        description: impl Into<String>,
        func: TestFn<S>,
    ) -> Self {
        Self {
            descriptor: TestDescriptor {
                name: name.into(),
                display_label: display_label.into(),
                chart_kind,
                description: description.into().trim().to_string(),
            },
            func,
        }
    }

    pub fn descriptor(&self) -> &TestDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Run the test against a suite value.
    pub fn call(&self, suite: &S, args: &S::Args) -> TestResult<TestOutcome> {
        (self.func)(suite, args)
    }
}

impl<S: RecTests> Clone for RecTest<S> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            func: self.func,
        }
    }
}

impl<S: RecTests> fmt::Debug for RecTest<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecTest")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// The declared test table of a suite type.
pub trait RecTests: Sized {
    /// Arguments handed to every test of a run; `()` unless declared.
    type Args;

    fn rec_tests() -> Vec<RecTest<Self>>;
}

/// A suite of rec tests bound to one model/dataset/predictions context.
pub trait RecList: RecTests {
    /// Name of the model under test, used in the run path and report.
    fn model_name(&self) -> String;

    /// Name of the suite; defaults to the type's name.
    fn name(&self) -> String {
        short_type_name::<Self>().to_string()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Build a description from rustdoc lines.
///
/// Each `///` line arrives with its leading space; lines are joined and the
/// whole text trimmed. No docs gives an empty description.
pub fn doc_description(lines: &[&str]) -> String {
    lines
        .iter()
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Declare the rec tests of a suite.
///
/// Wraps an inherent `impl` block. Every method must carry a
/// `#[rec_test(test_type = "...")]` attribute (optionally with
/// `display = Scalar | Bars | Bins`) after its doc comment and return a
/// `TestResult<T>` where `T: Into<TestOutcome>`. The methods are emitted
/// unchanged, and `RecTests` is implemented with one entry per method in
/// declaration order.
///
/// A leading `#[rec_args(Type)]` sets `RecTests::Args`. Methods then take
/// either only `&self` or `&self` plus one `&Type` parameter, which receives
/// the arguments given to the run.
#[macro_export]
macro_rules! rec_tests {
    (
        $(#[rec_args($args:ty)])?
        impl $suite:ident {
            $(
                $(#[doc = $doc:literal])*
                #[rec_test(test_type = $test_type:literal $(, display = $display:ident)? $(,)?)]
                $vis:vis fn $name:ident $params:tt -> $ret:ty $body:block
            )*
        }
    ) => {
        impl $suite {
            $(
                $(#[doc = $doc])*
                $vis fn $name $params -> $ret $body
            )*
        }

        impl $crate::annotation::RecTests for $suite {
            type Args = $crate::rec_tests!(@args $($args)?);

            fn rec_tests() -> ::std::vec::Vec<$crate::annotation::RecTest<Self>> {
                ::std::vec![
                    $(
                        $crate::annotation::RecTest::<Self>::new(
                            ::std::stringify!($name),
                            $test_type,
                            $crate::rec_tests!(@chart $($display)?),
                            $crate::annotation::doc_description(&[$($doc),*]),
                            |suite: &Self, args: &<Self as $crate::annotation::RecTests>::Args| {
                                $crate::rec_tests!(@call suite, args, $name $params)
                                    .map($crate::record::TestOutcome::from)
                            },
                        ),
                    )*
                ]
            }
        }
    };
    (@args) => {
        ()
    };
    (@args $args:ty) => {
        $args
    };
    (@call $suite:ident, $args:ident, $name:ident (&self $(,)?)) => {{
        let _ = $args;
        $suite.$name()
    }};
    (@call $suite:ident, $args:ident, $name:ident (&self, $arg:ident : $arg_ty:ty $(,)?)) => {
        $suite.$name($args)
    };
    (@chart) => {
        ::std::option::Option::None
    };
    (@chart $display:ident) => {
        ::std::option::Option::Some($crate::annotation::ChartType::$display)
    };
}
