//! Registry of solver backends.
//!
//! Holds all registered backends and provides lookup by id and selection
//! by problem class.

use std::collections::HashMap;
use std::sync::Arc;

use super::backend::{SolveError, SolverBackend};
use super::backends::{ClarabelBackend, HighsBackend, MicrolpBackend};
use super::ProblemClass;

/// Create with `BackendRegistry::new()` for empty or
/// `BackendRegistry::with_defaults()` for the built-in backends.
#[derive(Default)]
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn SolverBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers microlp, clarabel and highs. Backends whose feature is off
    /// are registered too and report `is_available() == false`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MicrolpBackend));
        registry.register(Arc::new(ClarabelBackend));
        registry.register(Arc::new(HighsBackend));
        registry
    }

    pub fn register(&mut self, backend: Arc<dyn SolverBackend>) {
        self.backends.insert(backend.id().to_string(), backend);
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn SolverBackend>> {
        self.backends.get(id).cloned()
    }

    /// Sorted ids of every registered backend.
    pub fn list(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.backends.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Sorted ids of available backends that support `class`.
    pub fn backends_for(&self, class: ProblemClass) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .backends
            .iter()
            .filter(|(_, b)| b.supports(class) && b.is_available())
            .map(|(id, _)| id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Best available backend for a problem class.
    ///
    /// Priority: HiGHS when compiled in, then the pure-Rust solvers.
    pub fn select(&self, class: ProblemClass) -> Option<Arc<dyn SolverBackend>> {
        let preferred: &[&str] = match class {
            ProblemClass::LinearProgram => &["highs", "clarabel", "microlp"],
            ProblemClass::MixedInteger => &["highs", "microlp"],
        };

        for id in preferred {
            if let Some(backend) = self.backends.get(*id) {
                if backend.supports(class) && backend.is_available() {
                    return Some(backend.clone());
                }
            }
        }

        self.backends
            .values()
            .find(|b| b.supports(class) && b.is_available())
            .cloned()
    }

    /// Resolve a user request: `"auto"` selects by class, anything else must
    /// name an available backend that supports the class.
    pub fn resolve(
        &self,
        requested: &str,
        class: ProblemClass,
    ) -> Result<Arc<dyn SolverBackend>, SolveError> {
        if requested.eq_ignore_ascii_case("auto") {
            return self.select(class).ok_or(SolveError::NoBackend(class));
        }
        let backend = self
            .get(requested)
            .ok_or_else(|| SolveError::UnknownBackend(requested.to_string()))?;
        if !backend.is_available() {
            return Err(SolveError::Unavailable(requested.to_string()));
        }
        if !backend.supports(class) {
            return Err(SolveError::UnsupportedClass {
                backend: requested.to_string(),
                class,
            });
        }
        Ok(backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::{LinearProgram, SolveOutcome, SolverSettings};

    struct MockBackend {
        id: String,
        classes: Vec<ProblemClass>,
        available: bool,
    }

    impl SolverBackend for MockBackend {
        fn id(&self) -> &str {
            &self.id
        }
        fn supported_classes(&self) -> &[ProblemClass] {
            &self.classes
        }
        fn is_available(&self) -> bool {
            self.available
        }
        fn solve(
            &self,
            _program: &LinearProgram,
            _settings: &SolverSettings,
        ) -> Result<SolveOutcome, SolveError> {
            unimplemented!("mock")
        }
    }

    fn mock(id: &str, classes: Vec<ProblemClass>, available: bool) -> Arc<dyn SolverBackend> {
        Arc::new(MockBackend {
            id: id.to_string(),
            classes,
            available,
        })
    }

    #[test]
    fn test_select_prefers_highs_when_available() {
        let mut registry = BackendRegistry::new();
        registry.register(mock("microlp", vec![ProblemClass::MixedInteger], true));
        registry.register(mock("highs", vec![ProblemClass::MixedInteger], true));
        let selected = registry.select(ProblemClass::MixedInteger).unwrap();
        assert_eq!(selected.id(), "highs");
    }

    #[test]
    fn test_select_skips_unavailable() {
        let mut registry = BackendRegistry::new();
        registry.register(mock("microlp", vec![ProblemClass::MixedInteger], true));
        registry.register(mock("highs", vec![ProblemClass::MixedInteger], false));
        let selected = registry.select(ProblemClass::MixedInteger).unwrap();
        assert_eq!(selected.id(), "microlp");
    }

    #[test]
    fn test_select_falls_back_to_any_matching_backend() {
        let mut registry = BackendRegistry::new();
        registry.register(mock("custom", vec![ProblemClass::LinearProgram], true));
        assert_eq!(
            registry.select(ProblemClass::LinearProgram).unwrap().id(),
            "custom"
        );
        assert!(registry.select(ProblemClass::MixedInteger).is_none());
    }

    #[test]
    fn test_resolve_errors() {
        let mut registry = BackendRegistry::new();
        registry.register(mock("lp-only", vec![ProblemClass::LinearProgram], true));
        registry.register(mock("offline", vec![ProblemClass::MixedInteger], false));

        assert!(matches!(
            registry.resolve("nope", ProblemClass::LinearProgram),
            Err(SolveError::UnknownBackend(_))
        ));
        assert!(matches!(
            registry.resolve("offline", ProblemClass::MixedInteger),
            Err(SolveError::Unavailable(_))
        ));
        assert!(matches!(
            registry.resolve("lp-only", ProblemClass::MixedInteger),
            Err(SolveError::UnsupportedClass { .. })
        ));
        assert!(matches!(
            registry.resolve("AUTO", ProblemClass::MixedInteger),
            Err(SolveError::NoBackend(ProblemClass::MixedInteger))
        ));
    }

    #[test]
    fn test_defaults_register_all_backends() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(registry.list(), vec!["clarabel", "highs", "microlp"]);
        #[cfg(feature = "solver-microlp")]
        assert!(registry
            .backends_for(ProblemClass::MixedInteger)
            .contains(&"microlp"));
    }
}
