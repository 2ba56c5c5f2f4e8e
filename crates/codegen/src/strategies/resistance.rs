use microflow_smtlib::{Expr, qfnra};

use super::{channels, declare, pin, var};
use crate::error::CodegenError;
use crate::naming::{ChannelVars, HEIGHT, LENGTH, RESISTANCE, VISCOSITY, WIDTH};
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::strategy::Strategy;
use crate::types::TypeTable;

/// Hydraulic resistance of a rectangular channel.
///
/// `R = 12·μ·L / (w·h³·(1 − 0.63·h/w))`, valid for `h < w`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelResistance;

impl ChannelResistance {
    fn resistance(vars: &ChannelVars) -> Result<Expr, CodegenError> {
        let w = || var(&vars.width);
        let h = || var(&vars.height);
        let numerator = qfnra::mul(
            qfnra::mul(qfnra::real(12.0)?, var(&vars.viscosity)),
            var(&vars.length),
        );
        let shape = qfnra::sub(
            qfnra::real(1.0)?,
            qfnra::mul(qfnra::real(0.63)?, qfnra::div(h(), w())),
        );
        let denominator = qfnra::mul(qfnra::mul(w(), qfnra::pow(h(), qfnra::int(3))), shape);
        Ok(qfnra::div(numerator, denominator))
    }
}

impl Strategy for ChannelResistance {
    fn name(&self) -> &str {
        "channelResistance"
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
            let quantities = [
                (WIDTH, &vars.width),
                (HEIGHT, &vars.height),
                (VISCOSITY, &vars.viscosity),
                (LENGTH, &vars.length),
                (RESISTANCE, &vars.resistance),
            ];
            declare(&mut out, quantities.iter().map(|(_, s)| *s));
            for (key, symbol) in quantities {
                pin(&mut out, channel, name, key, symbol)?;
            }
            for (_, symbol) in quantities {
                out.push(qfnra::assert_gt(var(symbol), qfnra::zero()));
            }
            out.push(qfnra::assert_lt(var(&vars.height), var(&vars.width)));
            out.push(qfnra::assert_eq(
                var(&vars.resistance),
                Self::resistance(&vars)?,
            ));
        }
        Ok(out)
    }
}
