//! Engine selection with fixed precedence.

use std::sync::Arc;

use tracing::debug;

use crate::engine::DownloadEngine;

/// The engines a dispatcher can route a download through.
///
/// Selection precedence, highest first:
/// 1. the global alternate-engine switch, fixed at construction;
/// 2. a per-request override engine;
/// 3. the default engine.
///
/// The global switch outranks per-request overrides, so enabling it redirects
/// every download in the process, including ones whose callers installed
/// their own engine.
pub struct EngineRegistry {
    default_engine: Arc<dyn DownloadEngine>,
    alternate_engine: Arc<dyn DownloadEngine>,
    use_alternate: bool,
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("default_engine", &self.default_engine.name())
            .field("alternate_engine", &self.alternate_engine.name())
            .field("use_alternate", &self.use_alternate)
            .finish()
    }
}

impl EngineRegistry {
    /// Creates a registry over the given engine pair.
    #[must_use]
    pub fn new(
        default_engine: Arc<dyn DownloadEngine>,
        alternate_engine: Arc<dyn DownloadEngine>,
        use_alternate: bool,
    ) -> Self {
        Self {
            default_engine,
            alternate_engine,
            use_alternate,
        }
    }

    /// Selects the engine for one download.
    #[must_use]
    pub fn select<'a>(
        &'a self,
        override_engine: Option<&'a Arc<dyn DownloadEngine>>,
    ) -> &'a Arc<dyn DownloadEngine> {
        if self.use_alternate {
            debug!(
                engine = self.alternate_engine.name(),
                "alternate engine switch active"
            );
            return &self.alternate_engine;
        }
        if let Some(engine) = override_engine {
            debug!(engine = engine.name(), "using override engine");
            return engine;
        }
        &self.default_engine
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::path::Path;

    use async_trait::async_trait;

    use crate::engine::{EngineConcurrency, EngineError, Metadata};

    struct StubEngine {
        name: &'static str,
    }

    #[async_trait]
    impl DownloadEngine for StubEngine {
        fn name(&self) -> &str {
            self.name
        }

        fn concurrency(&self) -> EngineConcurrency {
            EngineConcurrency::Concurrent
        }

        async fn fetch(
            &self,
            _source_url: &str,
            _dest_dir: &Path,
        ) -> Result<Option<Metadata>, EngineError> {
            Ok(None)
        }
    }

    fn engine(name: &'static str) -> Arc<dyn DownloadEngine> {
        Arc::new(StubEngine { name })
    }

    #[test]
    fn test_select_defaults_without_switch_or_override() {
        let registry = EngineRegistry::new(engine("default"), engine("alternate"), false);
        assert_eq!(registry.select(None).name(), "default");
    }

    #[test]
    fn test_select_prefers_override_over_default() {
        let registry = EngineRegistry::new(engine("default"), engine("alternate"), false);
        let override_engine = engine("override");
        assert_eq!(registry.select(Some(&override_engine)).name(), "override");
    }

    #[test]
    fn test_select_switch_picks_alternate() {
        let registry = EngineRegistry::new(engine("default"), engine("alternate"), true);
        assert_eq!(registry.select(None).name(), "alternate");
    }

    #[test]
    fn test_select_switch_outranks_override() {
        let registry = EngineRegistry::new(engine("default"), engine("alternate"), true);
        let override_engine = engine("override");
        assert_eq!(registry.select(Some(&override_engine)).name(), "alternate");
    }

    #[test]
    fn test_registry_debug_lists_engine_names() {
        let registry = EngineRegistry::new(engine("default"), engine("alternate"), false);
        let rendered = format!("{registry:?}");
        assert!(rendered.contains("default"), "Expected names in: {rendered}");
        assert!(rendered.contains("alternate"), "Expected names in: {rendered}");
    }
}
