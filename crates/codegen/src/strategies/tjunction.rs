//! Droplet generation at T-junctions.
//!
//! The squeezing-regime model: the dispersed phase fills the junction to
//! `V_fill`, then grows by `α·(Q_d/Q_c)·h·w_c²` before pinch-off. `V_fill`
//! has a closed form when the dispersed inlet is no wider than the
//! continuous channel and a circular-segment correction otherwise.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use microflow_smtlib::{Expr, Symbol, qfnra};

use super::{declare, pin, var};
use crate::error::CodegenError;
use crate::naming::{ChannelVars, PRESSURE, entity_var, port_var};
use crate::params::ProcessParameters;
use crate::schematic::{Connection, Entity, Node, Schematic};
use crate::strategy::Strategy;
use crate::types::{MICROFLUIDIC_CHANNEL, T_JUNCTION, TypeTable};

pub const CONTINUOUS_PORT: &str = "continuous";
pub const DISPERSED_PORT: &str = "dispersed";
pub const OUTPUT_PORT: &str = "output";

pub const V_FILL: &str = "v_fill";
pub const V_OUTPUT: &str = "v_output";
pub const ALPHA: &str = "alpha";
pub const GUTTER_FRACTION: &str = "gutterFraction";
pub const DEFAULT_GUTTER_FRACTION: f64 = 0.1;

/// `3π/8`
pub(crate) const FILL_AREA: f64 = 3.0 * PI / 8.0;
/// `(π/2)(1 − π/4)`
pub(crate) const FILL_CORRECTION: f64 = FRAC_PI_2 * (1.0 - FRAC_PI_4);

/// Geometry, flow and droplet volume at every T-junction.
///
/// Flow rates here are outflow-positive relative to the junction ports, so
/// both inlet channels carry negative values.
#[derive(Debug, Clone, Copy, Default)]
pub struct TJunction;

/// The channel on one junction port and its orientation.
struct Branch<'a> {
    name: &'a str,
    vars: ChannelVars,
    /// The channel starts at the junction.
    leaves: bool,
}

/// The single channel attached to `node.port`.
pub(super) fn port_channel<'a>(
    schematic: &'a Schematic,
    types: &TypeTable,
    node: &'a str,
    port: &'a str,
) -> Result<(&'a str, &'a Connection), CodegenError> {
    let mut attached: Vec<(&'a str, &'a Connection)> = Vec::new();
    for (name, connection) in schematic.connections_at_port(node, port) {
        if types.is_subtype(&connection.type_name, MICROFLUIDIC_CHANNEL)? {
            attached.push((name, connection));
        }
    }
    match attached[..] {
        [single] => Ok(single),
        _ => Err(CodegenError::schema(
            node,
            format!(
                "port `{port}` needs exactly one channel, found {}",
                attached.len()
            ),
        )),
    }
}

impl<'a> Branch<'a> {
    fn find(
        schematic: &'a Schematic,
        types: &TypeTable,
        node: &'a str,
        port: &'a str,
    ) -> Result<Self, CodegenError> {
        let (name, connection) = port_channel(schematic, types, node, port)?;
        Ok(Self {
            name,
            vars: ChannelVars::new(name)?,
            leaves: connection.from.is(node, port),
        })
    }

    /// Flow with outflow from the junction positive.
    fn outflow(&self) -> Expr {
        if self.leaves {
            var(&self.vars.flow_rate)
        } else {
            qfnra::neg(var(&self.vars.flow_rate))
        }
    }

    /// Flow with inflow into the junction positive.
    fn inflow(&self) -> Expr {
        if self.leaves {
            qfnra::neg(var(&self.vars.flow_rate))
        } else {
            var(&self.vars.flow_rate)
        }
    }
}

impl TJunction {
    fn gutter_fraction(name: &str, node: &Node) -> Result<f64, CodegenError> {
        let epsilon = node
            .optional_real(name, GUTTER_FRACTION)?
            .unwrap_or(DEFAULT_GUTTER_FRACTION);
        if !(0.0..1.0).contains(&epsilon) {
            return Err(CodegenError::schema(
                name,
                format!("`{GUTTER_FRACTION}` must lie in [0, 1), got {epsilon}"),
            ));
        }
        Ok(epsilon)
    }

    /// `ite(w_in <= w_c, base, base + h·w_c²·r²·(½·asin(s) + ½·s·√(1 − s²)))`
    fn fill_volume(w_c: &Symbol, h: &Symbol, w_in: &Symbol) -> Result<Expr, CodegenError> {
        let section = || qfnra::mul(var(h), qfnra::square(var(w_c)));
        let base = qfnra::mul(
            section(),
            qfnra::sub(
                qfnra::real(FILL_AREA)?,
                qfnra::mul(
                    qfnra::real(FILL_CORRECTION)?,
                    qfnra::div(var(h), var(w_c)),
                ),
            ),
        );
        let one = qfnra::real(1.0)?;
        let half = qfnra::real(0.5)?;
        let ratio = qfnra::div(var(w_in), var(w_c));
        let s = qfnra::sub(one.clone(), qfnra::div(var(w_c), var(w_in)));
        let segment = qfnra::add(
            qfnra::mul(half.clone(), qfnra::arcsin(s.clone())),
            qfnra::mul(
                qfnra::mul(half, s.clone()),
                qfnra::sqrt(qfnra::sub(one, qfnra::square(s))),
            ),
        );
        let complex = qfnra::add(
            base.clone(),
            qfnra::mul(qfnra::mul(section(), qfnra::square(ratio)), segment),
        );
        Ok(qfnra::ite(qfnra::le(var(w_in), var(w_c)), base, complex))
    }
}

impl Strategy for TJunction {
    fn name(&self) -> &str {
        "tJunction"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, node) in schematic.nodes_of(types, T_JUNCTION)? {
            for port in [CONTINUOUS_PORT, DISPERSED_PORT, OUTPUT_PORT] {
                if !node.ports.contains_key(port) {
                    return Err(CodegenError::schema(name, format!("missing port `{port}`")));
                }
            }
            let epsilon = Self::gutter_fraction(name, node)?;
            let continuous = Branch::find(schematic, types, name, CONTINUOUS_PORT)?;
            let dispersed = Branch::find(schematic, types, name, DISPERSED_PORT)?;
            let output = Branch::find(schematic, types, name, OUTPUT_PORT)?;
            tracing::trace!(
                junction = name,
                continuous = continuous.name,
                dispersed = dispersed.name,
                output = output.name,
                "junction branches"
            );

            let v_fill = entity_var(name, V_FILL)?;
            let v_output = entity_var(name, V_OUTPUT)?;
            let alpha = entity_var(name, ALPHA)?;
            let pressures = [
                port_var(name, CONTINUOUS_PORT, PRESSURE)?,
                port_var(name, DISPERSED_PORT, PRESSURE)?,
                port_var(name, OUTPUT_PORT, PRESSURE)?,
            ];
            let (c, d, o) = (&continuous.vars, &dispersed.vars, &output.vars);
            declare(
                &mut out,
                [
                    &c.width,
                    &c.height,
                    &c.viscosity,
                    &c.flow_rate,
                    &d.width,
                    &d.height,
                    &d.flow_rate,
                    &o.width,
                    &o.height,
                    &o.viscosity,
                    &o.flow_rate,
                ],
            );
            declare(&mut out, &pressures);
            declare(&mut out, [&v_fill, &v_output, &alpha]);
            for (key, symbol) in [(V_FILL, &v_fill), (V_OUTPUT, &v_output), (ALPHA, &alpha)] {
                pin(&mut out, node, name, key, symbol)?;
            }

            // Geometry and fluid continuity across the junction.
            out.push(qfnra::assert_eq(var(&c.height), var(&d.height)));
            out.push(qfnra::assert_eq(var(&c.height), var(&o.height)));
            out.push(qfnra::assert_eq(var(&c.width), var(&o.width)));
            out.push(qfnra::assert_eq(var(&c.viscosity), var(&o.viscosity)));
            out.push(qfnra::assert_eq(var(&pressures[0]), var(&pressures[1])));
            out.push(qfnra::assert_eq(var(&pressures[0]), var(&pressures[2])));

            out.push(qfnra::assert_gt(output.outflow(), qfnra::zero()));
            out.push(qfnra::assert_lt(continuous.outflow(), qfnra::zero()));
            out.push(qfnra::assert_lt(dispersed.outflow(), qfnra::zero()));

            out.push(qfnra::assert_eq(
                var(&v_fill),
                Self::fill_volume(&c.width, &c.height, &d.width)?,
            ));
            out.push(qfnra::assert_eq(
                var(&alpha),
                qfnra::real((1.0 - FRAC_PI_4) / (1.0 - epsilon))?,
            ));
            let growth = qfnra::mul(
                qfnra::mul(
                    qfnra::mul(
                        var(&alpha),
                        qfnra::div(dispersed.inflow(), continuous.inflow()),
                    ),
                    var(&c.height),
                ),
                qfnra::square(var(&c.width)),
            );
            out.push(qfnra::assert_eq(
                var(&v_output),
                qfnra::add(var(&v_fill), growth),
            ));
        }
        Ok(out)
    }
}
