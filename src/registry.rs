//! References to shared entities (organisations, subdivisions, collections).
//!
//! Creating shared entities is owned by the persistence layer. The engine
//! only computes a stable content hash and asks an [`EntityRegistry`] for
//! the reference; implementations must guarantee at-most-once creation when
//! called concurrently.

use crate::document::Reference;
use sha2::{Digest, Sha256};

/// Default base URL of generated references.
pub const DEFAULT_BASE_URL: &str = "https://sonar.ch/api";

/// Kind of shared entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Organisation,
    Subdivision,
    Collection,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Organisation => "organisations",
            EntityKind::Subdivision => "subdivisions",
            EntityKind::Collection => "collections",
        }
    }
}

/// Resolves (and possibly creates) shared entities.
pub trait EntityRegistry: Send + Sync {
    /// Reference of an organisation identified by its code.
    fn organisation(&self, code: &str) -> Reference;

    /// Reference of a subdivision or collection owned by `organisation`.
    /// `hash` is the content key computed by [`entity_hash`].
    fn resolve(&self, kind: EntityKind, organisation: &str, name: &str, hash: &str) -> Reference;
}

/// Registry building deterministic links without side effects.
#[derive(Debug, Clone)]
pub struct LinkRegistry {
    base_url: String,
}

impl Default for LinkRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl LinkRegistry {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn link(&self, kind: EntityKind, id: &str) -> Reference {
        Reference::new(format!("{}/{}/{}", self.base_url, kind.as_str(), id))
    }
}

impl EntityRegistry for LinkRegistry {
    fn organisation(&self, code: &str) -> Reference {
        self.link(EntityKind::Organisation, code)
    }

    fn resolve(&self, kind: EntityKind, _organisation: &str, _name: &str, hash: &str) -> Reference {
        self.link(kind, hash)
    }
}

/// Content hash of an entity: SHA-256 of its kind, owner and normalized name.
pub fn entity_hash(kind: EntityKind, organisation: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_str().as_bytes());
    hasher.update(b"|");
    hasher.update(organisation.trim().to_lowercase().as_bytes());
    hasher.update(b"|");
    hasher.update(name.trim().to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}
