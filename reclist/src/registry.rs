use crate::annotation::{RecTest, RecTests};
use tracing::{debug, warn};

/// Ordered name → test table for one suite type.
///
/// Iteration follows declaration order. A later test with an already
/// registered name replaces the earlier one in place.
pub struct TestRegistry<S: RecTests> {
    tests: Vec<RecTest<S>>,
}

impl<S: RecTests> TestRegistry<S> {
    pub fn new() -> Self {
        Self { tests: Vec::new() }
    }

    /// Collect the tests declared on `S`.
    pub fn discover() -> Self {
        let registry = Self::from_tests(S::rec_tests());
        debug!(
            "Discovered {} rec tests on {}",
            registry.len(),
            std::any::type_name::<S>()
        );
        registry
    }

    pub fn from_tests(tests: impl IntoIterator<Item = RecTest<S>>) -> Self {
        let mut registry = Self::new();
        for test in tests {
            registry.register(test);
        }
        registry
    }

    pub fn register(&mut self, test: RecTest<S>) {
        if test.name().is_empty() {
            warn!(
                "Skipping rec test without a name (label: {})",
                test.descriptor().display_label
            );
            return;
        }

        match self.tests.iter().position(|t| t.name() == test.name()) {
            Some(index) => {
                warn!(
                    "Rec test '{}' registered twice; keeping the last definition",
                    test.name()
                );
                self.tests[index] = test;
            }
            None => self.tests.push(test),
        }
    }

    pub fn get(&self, name: &str) -> Option<&RecTest<S>> {
        self.tests.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tests.iter().map(|t| t.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecTest<S>> {
        self.tests.iter()
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl<S: RecTests> Default for TestRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}
