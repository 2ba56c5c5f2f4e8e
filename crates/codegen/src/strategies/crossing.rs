use microflow_smtlib::{Expr, qfnra};

use super::{channels, declare, var};
use crate::error::CodegenError;
use crate::naming::PositionVars;
use crate::params::ProcessParameters;
use crate::schematic::Schematic;
use crate::strategy::Strategy;
use crate::types::TypeTable;

/// Bounds the angle between any two channels meeting at a node.
///
/// For channels `B→A` and `B→C` the vectors `u = A − B`, `v = C − B` must
/// satisfy `(u·v)² >= cos²θ·|u|²·|v|²`, the squared form of
/// `|cos ∠(u, v)| >= cos θ`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossingAngle;

fn delta(to: &PositionVars, from: &PositionVars) -> (Expr, Expr) {
    (
        qfnra::sub(var(&to.x), var(&from.x)),
        qfnra::sub(var(&to.y), var(&from.y)),
    )
}

fn norm_squared((dx, dy): &(Expr, Expr)) -> Expr {
    qfnra::add(qfnra::square(dx.clone()), qfnra::square(dy.clone()))
}

impl Strategy for CrossingAngle {
    fn name(&self) -> &str {
        "crossingAngle"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let cos_squared = params.critical_crossing_angle().cos().powi(2);
        let all = channels(schematic, types)?;
        let mut out = Vec::new();
        for middle in schematic.nodes.keys() {
            let far: Vec<&str> = all
                .iter()
                .filter_map(|(_, channel)| channel.far_node(middle))
                .filter(|far| *far != middle.as_str())
                .collect();
            for (i, a) in far.iter().enumerate() {
                for c in &far[i + 1..] {
                    if a == c {
                        continue;
                    }
                    let (pa, pb, pc) = (
                        PositionVars::new(a)?,
                        PositionVars::new(middle)?,
                        PositionVars::new(c)?,
                    );
                    declare(&mut out, [&pa.x, &pa.y, &pb.x, &pb.y, &pc.x, &pc.y]);
                    let u = delta(&pa, &pb);
                    let v = delta(&pc, &pb);
                    let dot = qfnra::add(
                        qfnra::mul(u.0.clone(), v.0.clone()),
                        qfnra::mul(u.1.clone(), v.1.clone()),
                    );
                    out.push(qfnra::assert_ge(
                        qfnra::square(dot),
                        qfnra::mul(
                            qfnra::mul(qfnra::real(cos_squared)?, norm_squared(&u)),
                            norm_squared(&v),
                        ),
                    ));
                }
            }
        }
        Ok(out)
    }
}
