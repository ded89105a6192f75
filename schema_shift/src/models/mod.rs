//! Entity model
//!
//! Declared entities, their discovery on disk, relationship synthesis and
//! validation.

pub mod entity;
pub mod enums;
pub mod field_type;
pub mod registry;
pub mod relation;
pub mod synthesizer;
pub mod validator;

// Re-export key types
pub use entity::{Edge, EdgeKind, Entity, EnumDef, Field, IdentityKind, Index, PolymorphicTarget, ReferentialAction};
pub use enums::EnumRegistry;
pub use field_type::FieldType;
pub use registry::EntityRegistry;
pub use synthesizer::{RelationSynthesizer, SynthesisReport, UnresolvedEdge};
pub use validator::{IssueLocation, ValidationIssue, ValidationReport, Validator};
