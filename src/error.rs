//! Engine error type.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants fall into
//! two groups: programmer misuse (touching a disposed entity, parenting a node
//! to itself, invalid physics parameters) and configuration problems (no
//! active scene, no renderer or camera bound, unknown scene identifier).
//! Messages always carry the entity tag or resource name involved.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    // ---- misuse -----------------------------------------------------------
    #[error("entity '{tag}' has been disposed and can not be used for '{op}'")]
    EntityDisposed { tag: String, op: &'static str },

    #[error("unknown entity handle passed to '{op}'")]
    UnknownEntity { op: &'static str },

    #[error("component (ID {id}) has been disposed and can not be used for '{op}'")]
    ComponentDisposed { id: i32, op: &'static str },

    #[error("unknown component handle passed to '{op}'")]
    UnknownComponent { op: &'static str },

    #[error("entity '{tag}' can not be made a child of itself")]
    SelfParenting { tag: String },

    #[error("entity '{tag}' can not be parented to one of its own descendants")]
    HierarchyCycle { tag: String },

    #[error("entity '{child}' is not a child of '{parent}'")]
    NotAChild { parent: String, child: String },

    #[error("component (ID {id}) is already owned by another entity; remove it first")]
    ComponentAlreadyOwned { id: i32 },

    #[error("component ID {id} is reserved for built-in components; custom IDs must be >= 0")]
    ReservedComponentId { id: i32 },

    #[error("mass must be greater than zero, got {0}")]
    InvalidMass(f32),

    #[error("invalid shape: {0}")]
    InvalidShape(String),

    #[error("'{0}' is not a hex colour")]
    InvalidColor(String),

    #[error("can not solve '{op}': the parent global matrix is not invertible (zero scale on an axis?)")]
    SingularMatrix { op: &'static str },

    #[error("unknown or removed physics body")]
    UnknownBody,

    // ---- configuration ----------------------------------------------------
    #[error("no scene is active; set one with SceneManager::set_active_scene")]
    NoActiveScene,

    #[error("no renderer is bound; set one with SceneManager::set_renderer")]
    NoRenderer,

    #[error("no camera is bound; set one with SceneManager::set_camera")]
    NoCamera,

    #[error("no scenes have been registered; add scenes with SceneManager::add_scene")]
    NoScenesRegistered,

    #[error("scene '{0}' was not found in the scene manager")]
    SceneNotFound(String),

    #[error("scene index {index} is out of range (0..{len})")]
    SceneIndexOutOfRange { index: usize, len: usize },

    #[error("scene identifier '{0}' is already in use")]
    DuplicateScene(String),

    #[error("configuration error: {0}")]
    Config(String),
}
