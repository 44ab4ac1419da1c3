//! Compiled derivations keyed by transport tag

use std::collections::HashMap;
use std::sync::Arc;

use super::{CommandDerivation, PythonModuleDerivation};
use crate::manifest::TransportType;

/// Lookup table from transport tag to derivation.
///
/// Built once at startup and read-only afterwards.
#[derive(Clone, Default)]
pub struct DerivationRegistry {
    derivations: HashMap<TransportType, Arc<dyn CommandDerivation>>,
}

impl DerivationRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the derivations compiled into this crate: the OpenAI
    /// assistant server for `stdio`.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            TransportType::Stdio,
            Arc::new(PythonModuleDerivation::openai_assistant()),
        );
        registry
    }

    /// Register a derivation, replacing any previous one for the transport.
    pub fn register(
        &mut self,
        transport: TransportType,
        derivation: Arc<dyn CommandDerivation>,
    ) -> Option<Arc<dyn CommandDerivation>> {
        self.derivations.insert(transport, derivation)
    }

    pub fn get(&self, transport: TransportType) -> Option<Arc<dyn CommandDerivation>> {
        self.derivations.get(&transport).cloned()
    }

    pub fn contains(&self, transport: TransportType) -> bool {
        self.derivations.contains_key(&transport)
    }

    /// Registered transports, sorted by tag.
    pub fn transports(&self) -> Vec<TransportType> {
        let mut transports: Vec<_> = self.derivations.keys().copied().collect();
        transports.sort_by_key(|t| t.to_string());
        transports
    }
}

impl std::fmt::Debug for DerivationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for transport in self.transports() {
            if let Some(derivation) = self.derivations.get(&transport) {
                map.entry(&transport, &derivation.name());
            }
        }
        map.finish()
    }
}
