//! Domain strategies and the standard strategy sets.
//!
//! Every strategy declares each variable it references; the pipeline removes
//! the resulting duplicate declarations. A numeric entity attribute whose key
//! matches a variable's attribute segment pins that variable to its value.

mod conservation;
mod crossing;
mod droplet;
mod electrophoresis;
mod layout;
mod pressure;
mod resistance;
mod terminals;
mod tjunction;

pub use conservation::FlowConservation;
pub use crossing::CrossingAngle;
pub use droplet::{DropletVolumeConstraint, JUNCTION, VOLUME};
pub use electrophoresis::ElectrophoreticCross;
pub use layout::{
    ChannelLength, ChannelLengthBounds, ChipBounds, JunctionCollinearity, MAX_LENGTH,
    MinimumNodeDistance, NodePlacement,
};
pub use pressure::ChannelPressureDrop;
pub use resistance::ChannelResistance;
pub use terminals::FluidTerminals;
pub use tjunction::{
    ALPHA, CONTINUOUS_PORT, DEFAULT_GUTTER_FRACTION, DISPERSED_PORT, GUTTER_FRACTION, OUTPUT_PORT,
    TJunction, V_FILL, V_OUTPUT,
};

use microflow_smtlib::{Expr, Symbol, qfnra};

use crate::config::{PlacementConfig, SynthesisConfig};
use crate::error::CodegenError;
use crate::schematic::{Connection, Entity, Schematic};
use crate::strategy::StrategySet;
use crate::types::{MICROFLUIDIC_CHANNEL, TypeTable};

/// Node placement, chip bounds, spacing, channel length and collinearity.
pub fn placement(config: &PlacementConfig) -> StrategySet {
    StrategySet::new("placement")
        .with(NodePlacement)
        .with(ChipBounds::new(config.chip_area))
        .with(MinimumNodeDistance)
        .with(ChannelLength::new(config.length_rule))
        .with(ChannelLengthBounds)
        .with(JunctionCollinearity)
}

/// Channel hydraulics, conservation, terminals and droplet generation.
pub fn fluid_dynamics() -> StrategySet {
    StrategySet::new("fluidDynamics")
        .with(ChannelResistance)
        .with(ChannelPressureDrop)
        .with(FlowConservation)
        .with(FluidTerminals)
        .with(TJunction)
        .with(DropletVolumeConstraint)
}

/// Everything needed to synthesize a microfluidic chip.
pub fn microfluidic(config: &SynthesisConfig) -> StrategySet {
    StrategySet::new("microfluidic")
        .with(placement(&config.placement))
        .with(CrossingAngle)
        .with(fluid_dynamics())
        .with(ElectrophoreticCross)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn var(symbol: &Symbol) -> Expr {
    Expr::from(symbol)
}

pub(crate) fn declare<'a>(out: &mut Vec<Expr>, symbols: impl IntoIterator<Item = &'a Symbol>) {
    out.extend(symbols.into_iter().map(qfnra::declare_real));
}

/// Assert `symbol = value` if `entity` carries a numeric `key`.
pub(crate) fn pin(
    out: &mut Vec<Expr>,
    entity: &impl Entity,
    owner: &str,
    key: &str,
    symbol: &Symbol,
) -> Result<(), CodegenError> {
    if let Some(value) = entity.optional_real(owner, key)? {
        out.push(qfnra::assert_eq(var(symbol), qfnra::real(value)?));
    }
    Ok(())
}

pub(crate) fn channels<'a>(
    schematic: &'a Schematic,
    types: &TypeTable,
) -> Result<Vec<(&'a str, &'a Connection)>, CodegenError> {
    schematic.connections_of(types, MICROFLUIDIC_CHANNEL)
}
