//! Node placement on the chip plane.
//!
//! Every node gets a position `(n.x, n.y)`. Channel lengths follow from the
//! positions of their end nodes under the configured length rule.

use microflow_smtlib::{Expr, qfnra};

use super::tjunction::{CONTINUOUS_PORT, OUTPUT_PORT, port_channel};
use super::{channels, declare, pin, var};
use crate::config::{ChipArea, LengthRule};
use crate::error::CodegenError;
use crate::naming::{LENGTH, PositionVars, X, Y, entity_var};
use crate::params::ProcessParameters;
use crate::schematic::{Connection, Entity, Schematic};
use crate::strategy::Strategy;
use crate::types::{T_JUNCTION, TypeTable};

pub const MAX_LENGTH: &str = "maxLength";

/// `(Δx, Δy)` from one position to another.
fn offset(from: &PositionVars, to: &PositionVars) -> (Expr, Expr) {
    (
        qfnra::sub(var(&to.x), var(&from.x)),
        qfnra::sub(var(&to.y), var(&from.y)),
    )
}

/// `|e|` as `ite(e >= 0, e, -e)`.
fn abs(e: Expr) -> Expr {
    qfnra::ite(qfnra::ge(e.clone(), qfnra::zero()), e.clone(), qfnra::neg(e))
}

fn endpoints(channel: &Connection) -> Result<(PositionVars, PositionVars), CodegenError> {
    Ok((
        PositionVars::new(&channel.from.node)?,
        PositionVars::new(&channel.to.node)?,
    ))
}

/// Declares every node position; numeric `x`/`y` attributes pin them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodePlacement;

impl Strategy for NodePlacement {
    fn name(&self) -> &str {
        "nodePlacement"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        _types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, node) in &schematic.nodes {
            let pos = PositionVars::new(name)?;
            declare(&mut out, [&pos.x, &pos.y]);
            pin(&mut out, node, name, X, &pos.x)?;
            pin(&mut out, node, name, Y, &pos.y)?;
        }
        Ok(out)
    }
}

/// Keeps nodes in the first quadrant, and inside the chip when it is finite.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChipBounds {
    area: ChipArea,
}

impl ChipBounds {
    pub fn new(area: ChipArea) -> Self {
        Self { area }
    }
}

impl Strategy for ChipBounds {
    fn name(&self) -> &str {
        "chipBounds"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        _types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for name in schematic.nodes.keys() {
            let pos = PositionVars::new(name)?;
            declare(&mut out, [&pos.x, &pos.y]);
            out.push(qfnra::assert_ge(var(&pos.x), qfnra::zero()));
            out.push(qfnra::assert_ge(var(&pos.y), qfnra::zero()));
            if self.area == ChipArea::Finite {
                out.push(qfnra::assert_le(
                    var(&pos.x),
                    qfnra::real(params.max_chip_x())?,
                ));
                out.push(qfnra::assert_le(
                    var(&pos.y),
                    qfnra::real(params.max_chip_y())?,
                ));
            }
        }
        Ok(out)
    }
}

/// Every pair of nodes at least `minNodeDistance` apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumNodeDistance;

impl Strategy for MinimumNodeDistance {
    fn name(&self) -> &str {
        "minimumNodeDistance"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        _types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let positions = schematic
            .nodes
            .keys()
            .map(|name| PositionVars::new(name))
            .collect::<Result<Vec<_>, _>>()?;
        let min_squared = params.min_node_distance().powi(2);
        let mut out = Vec::new();
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                declare(&mut out, [&a.x, &a.y, &b.x, &b.y]);
                let (dx, dy) = offset(a, b);
                out.push(qfnra::assert_ge(
                    qfnra::add(qfnra::square(dx), qfnra::square(dy)),
                    qfnra::real(min_squared)?,
                ));
            }
        }
        Ok(out)
    }
}

/// Relates channel length to the distance between its end nodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelLength {
    rule: LengthRule,
}

impl ChannelLength {
    pub fn new(rule: LengthRule) -> Self {
        Self { rule }
    }
}

impl Strategy for ChannelLength {
    fn name(&self) -> &str {
        "channelLength"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, channel) in channels(schematic, types)? {
            let length = entity_var(name, LENGTH)?;
            let (from, to) = endpoints(channel)?;
            declare(&mut out, [&length, &from.x, &from.y, &to.x, &to.y]);
            let (dx, dy) = offset(&from, &to);
            out.push(match self.rule {
                LengthRule::Euclidean => qfnra::assert_eq(
                    qfnra::square(var(&length)),
                    qfnra::add(qfnra::square(dx), qfnra::square(dy)),
                ),
                LengthRule::Manhattan => {
                    qfnra::assert_eq(var(&length), qfnra::add(abs(dx), abs(dy)))
                }
            });
            out.push(qfnra::assert_gt(var(&length), qfnra::zero()));
        }
        Ok(out)
    }
}

/// `minChannelLength <= L`, and `L <= maxLength` where a channel sets it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelLengthBounds;

impl Strategy for ChannelLengthBounds {
    fn name(&self) -> &str {
        "channelLengthBounds"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, channel) in channels(schematic, types)? {
            let length = entity_var(name, LENGTH)?;
            declare(&mut out, [&length]);
            out.push(qfnra::assert_ge(
                var(&length),
                qfnra::real(params.min_channel_length())?,
            ));
            if let Some(max) = channel.optional_real(name, MAX_LENGTH)? {
                out.push(qfnra::assert_le(var(&length), qfnra::real(max)?));
            }
        }
        Ok(out)
    }
}

/// A T-junction sits on the line through its continuous and output far ends.
#[derive(Debug, Clone, Copy, Default)]
pub struct JunctionCollinearity;

impl Strategy for JunctionCollinearity {
    fn name(&self) -> &str {
        "junctionCollinearity"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, _) in schematic.nodes_of(types, T_JUNCTION)? {
            let far = |port| -> Result<PositionVars, CodegenError> {
                let (channel, connection) = port_channel(schematic, types, name, port)?;
                let node = connection.far_node(name).ok_or_else(|| {
                    CodegenError::schema(channel, format!("not attached to `{name}`"))
                })?;
                PositionVars::new(node)
            };
            let a = far(CONTINUOUS_PORT)?;
            let b = far(OUTPUT_PORT)?;
            let p = PositionVars::new(name)?;
            declare(&mut out, [&a.x, &a.y, &b.x, &b.y, &p.x, &p.y]);
            let (abx, aby) = offset(&a, &b);
            let (apx, apy) = offset(&a, &p);
            out.push(qfnra::assert_eq(
                qfnra::sub(qfnra::mul(abx, apy), qfnra::mul(aby, apx)),
                qfnra::zero(),
            ));
        }
        Ok(out)
    }
}
