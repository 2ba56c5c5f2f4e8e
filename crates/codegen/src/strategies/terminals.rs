use microflow_smtlib::{Expr, Symbol, qfnra};

use super::{declare, var};
use crate::error::CodegenError;
use crate::naming::{PRESSURE, VISCOSITY, entity_var, port_var};
use crate::params::ProcessParameters;
use crate::schematic::{Entity, Node, Schematic};
use crate::strategy::Strategy;
use crate::types::{FLUID_ENTRY, FLUID_EXIT, MICROFLUIDIC_CHANNEL, TypeTable};

/// Boundary conditions at fluid entries and exits.
///
/// An entry fixes the viscosity of every channel it feeds and has
/// non-negative port pressures. Exit ports sit at the node's `pressure`
/// attribute, or at zero gauge pressure without one. An entry carrying
/// `pressure` fixes its ports the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluidTerminals;

impl FluidTerminals {
    fn port_pressures(
        out: &mut Vec<Expr>,
        name: &str,
        node: &Node,
    ) -> Result<Vec<Symbol>, CodegenError> {
        let mut symbols = Vec::with_capacity(node.ports.len());
        for port in node.ports.keys() {
            let symbol = port_var(name, port, PRESSURE)?;
            declare(out, [&symbol]);
            symbols.push(symbol);
        }
        Ok(symbols)
    }
}

impl Strategy for FluidTerminals {
    fn name(&self) -> &str {
        "fluidTerminals"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();

        for (name, node) in schematic.nodes_of(types, FLUID_ENTRY)? {
            let viscosity = node.required_real(name, VISCOSITY)?;
            for (channel, connection) in schematic.connections_at(name) {
                if !types.is_subtype(&connection.type_name, MICROFLUIDIC_CHANNEL)? {
                    continue;
                }
                let symbol = entity_var(channel, VISCOSITY)?;
                declare(&mut out, [&symbol]);
                out.push(qfnra::assert_eq(var(&symbol), qfnra::real(viscosity)?));
            }
            let pinned = node.optional_real(name, PRESSURE)?;
            for symbol in Self::port_pressures(&mut out, name, node)? {
                out.push(qfnra::assert_ge(var(&symbol), qfnra::zero()));
                if let Some(pressure) = pinned {
                    out.push(qfnra::assert_eq(var(&symbol), qfnra::real(pressure)?));
                }
            }
        }

        for (name, node) in schematic.nodes_of(types, FLUID_EXIT)? {
            let pressure = node.optional_real(name, PRESSURE)?.unwrap_or(0.0);
            for symbol in Self::port_pressures(&mut out, name, node)? {
                out.push(qfnra::assert_eq(var(&symbol), qfnra::real(pressure)?));
            }
        }

        Ok(out)
    }
}
