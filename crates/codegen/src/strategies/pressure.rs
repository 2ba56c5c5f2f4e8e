use microflow_smtlib::{Expr, qfnra};

use super::{channels, declare, pin, var};
use crate::error::CodegenError;
use crate::naming::{ChannelVars, FLOW_RATE, PRESSURE, port_var};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::strategy::Strategy;
use crate::types::TypeTable;

/// Hagen–Poiseuille: `Δp = Q·R` along every channel, measured `from → to`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelPressureDrop;

impl Strategy for ChannelPressureDrop {
    fn name(&self) -> &str {
        "channelPressureDrop"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, channel) in channels(schematic, types)? {
            let vars = ChannelVars::new(name)?;
            let p_from = port_var(&channel.from.node, &channel.from.port, PRESSURE)?;
            let p_to = port_var(&channel.to.node, &channel.to.port, PRESSURE)?;
            declare(
                &mut out,
                [&p_from, &p_to, &vars.flow_rate, &vars.resistance],
            );
            pin(&mut out, channel, name, FLOW_RATE, &vars.flow_rate)?;
            for (end, symbol) in [(&channel.from, &p_from), (&channel.to, &p_to)] {
                let port = schematic.require_port(name, end)?;
                pin(&mut out, port, &end.node, PRESSURE, symbol)?;
            }
            out.push(qfnra::assert_eq(
                qfnra::sub(var(&p_from), var(&p_to)),
                qfnra::mul(var(&vars.flow_rate), var(&vars.resistance)),
            ));
        }
        Ok(out)
    }
}
