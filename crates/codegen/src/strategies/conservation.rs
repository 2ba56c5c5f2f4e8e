use microflow_smtlib::{Expr, qfnra};

use super::{declare, var};
use crate::error::CodegenError;
use crate::naming::{FLOW_RATE, entity_var};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::strategy::Strategy;
use crate::types::{CONTROL_POINT, MICROFLUIDIC_CHANNEL, TypeTable};

/// Kirchhoff's current law at every control point.
///
/// Channels ending at the node flow in, channels starting there flow out, so
/// a positive flow rate runs along the channel's `from → to` direction.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowConservation;

impl Strategy for FlowConservation {
    fn name(&self) -> &str {
        "flowConservation"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (node, _) in schematic.nodes_of(types, CONTROL_POINT)? {
            let mut inflow = Vec::new();
            let mut outflow = Vec::new();
            for (name, channel) in schematic.connections_at(node) {
                if !types.is_subtype(&channel.type_name, MICROFLUIDIC_CHANNEL)? {
                    continue;
                }
                let flow = entity_var(name, FLOW_RATE)?;
                declare(&mut out, [&flow]);
                // A self-loop is both.
                if channel.to.node == node {
                    inflow.push(var(&flow));
                }
                if channel.from.node == node {
                    outflow.push(var(&flow));
                }
            }
            if inflow.is_empty() && outflow.is_empty() {
                continue;
            }
            out.push(qfnra::assert_eq(qfnra::sum(inflow), qfnra::sum(outflow)));
        }
        Ok(out)
    }
}
