use microflow_smtlib::{Expr, qfnra};

use super::tjunction::V_OUTPUT;
use super::{declare, pin, var};
use crate::error::CodegenError;
use crate::naming::entity_var;
use crate::params::ProcessParameters;
use crate::schematic::{Entity, Schematic};
use crate::strategy::Strategy;
use crate::types::{DROPLET_VOLUME_CONSTRAINT, T_JUNCTION, TypeTable};

pub const JUNCTION: &str = "junction";
pub const VOLUME: &str = "volume";

/// Ties a requested droplet volume to the output volume of a T-junction.
#[derive(Debug, Clone, Copy, Default)]
pub struct DropletVolumeConstraint;

impl Strategy for DropletVolumeConstraint {
    fn name(&self) -> &str {
        "dropletVolumeConstraint"
    }

    fn generate(
        &self,
        schematic: &Schematic,
        _params: &ProcessParameters,
        types: &TypeTable,
    ) -> Result<Vec<Expr>, CodegenError> {
        let mut out = Vec::new();
        for (name, constraint) in schematic.constraints_of(types, DROPLET_VOLUME_CONSTRAINT)? {
            let junction = constraint.required_text(name, JUNCTION)?;
            let node = schematic.node(junction).ok_or_else(|| {
                CodegenError::schema(name, format!("junction `{junction}` does not exist"))
            })?;
            if !types.is_subtype(&node.type_name, T_JUNCTION)? {
                return Err(CodegenError::schema(
                    name,
                    format!("`{junction}` is a {}, not a {T_JUNCTION}", node.type_name),
                ));
            }

            let volume = entity_var(name, VOLUME)?;
            let v_output = entity_var(junction, V_OUTPUT)?;
            declare(&mut out, [&volume, &v_output]);
            pin(&mut out, constraint, name, VOLUME, &volume)?;
            out.push(qfnra::assert_eq(var(&volume), var(&v_output)));
        }
        Ok(out)
    }
}
