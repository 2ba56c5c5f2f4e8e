//! Constraint generation for microfluidic schematics.
//!
//! A [`Schematic`] describes nodes, ports, channels and design constraints.
//! [`Strategy`] implementations turn it into QF_NRA declarations and
//! assertions, a [`TranslationUnit`] caches the output, and [`synthesize`]
//! sends it to a [`SolverSession`](microflow_solver::SolverSession) and
//! writes the solved values back with [`annotate`].
//!
//! Provides:
//! - [`schematic`]: the device graph, typed attribute access and a builder
//! - [`types`]: the type hierarchy used for subtype-aware queries
//! - [`naming`]: the variable naming scheme linking constraints to entities
//! - [`strategy`]: the strategy trait, sets and translation units
//! - [`strategies`]: placement, hydraulics, droplet and electrophoresis rules
//! - [`annotate`]: back-annotation of interval results
//! - [`synthesis`]: the end-to-end pipeline

pub mod annotate;
pub mod config;
pub mod error;
pub mod naming;
pub mod params;
pub mod schematic;
pub mod strategies;
pub mod strategy;
pub mod synthesis;
pub mod types;

pub use annotate::annotate;
pub use config::{ChipArea, LengthRule, PlacementConfig, SynthesisConfig};
pub use error::{CodegenError, SynthesisError};
pub use naming::SymbolPath;
pub use params::ProcessParameters;
pub use schematic::{
    AttributeValue, Attributes, Connection, ConstraintInstance, Entity, Node, Port, PortRef,
    Schematic, SchematicBuilder,
};
pub use strategies::{fluid_dynamics, microfluidic, placement};
pub use strategy::{Strategy, StrategySet, TranslationUnit};
pub use synthesis::{Synthesis, build_script, synthesize};
pub use types::{TypeDef, TypeKind, TypeTable};
