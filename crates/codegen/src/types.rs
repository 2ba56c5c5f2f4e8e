//! Type table for schematic entities.
//!
//! Types form single-inheritance chains per kind. A strategy targets a type
//! name and applies to every entity whose type equals it or descends from it.

use rustc_hash::FxHashMap;

use crate::error::CodegenError;

pub const MICROFLUIDIC_NODE: &str = "microfluidicNode";
pub const CONTROL_POINT: &str = "controlPoint";
pub const T_JUNCTION: &str = "tJunction";
pub const FLUID_ENTRY: &str = "fluidEntry";
pub const FLUID_EXIT: &str = "fluidExit";
pub const ELECTROPHORETIC_CROSS: &str = "electrophoreticCross";
pub const MICROFLUIDIC_PORT: &str = "microfluidicPort";
pub const MICROFLUIDIC_CHANNEL: &str = "microfluidicChannel";
pub const DROPLET_VOLUME_CONSTRAINT: &str = "dropletVolumeConstraint";

/// What kind of entity a type describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Node,
    Port,
    Connection,
    Constraint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub kind: TypeKind,
    pub supertype: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: FxHashMap<String, TypeDef>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The microfluidic type hierarchy.
    pub fn microfluidic() -> Self {
        let mut table = Self::new();
        let entries: [(&str, TypeKind, Option<&str>); 9] = [
            (MICROFLUIDIC_NODE, TypeKind::Node, None),
            (CONTROL_POINT, TypeKind::Node, Some(MICROFLUIDIC_NODE)),
            (T_JUNCTION, TypeKind::Node, Some(CONTROL_POINT)),
            (FLUID_ENTRY, TypeKind::Node, Some(MICROFLUIDIC_NODE)),
            (FLUID_EXIT, TypeKind::Node, Some(MICROFLUIDIC_NODE)),
            (ELECTROPHORETIC_CROSS, TypeKind::Node, Some(MICROFLUIDIC_NODE)),
            (MICROFLUIDIC_PORT, TypeKind::Port, None),
            (MICROFLUIDIC_CHANNEL, TypeKind::Connection, None),
            (DROPLET_VOLUME_CONSTRAINT, TypeKind::Constraint, None),
        ];
        for (name, kind, supertype) in entries {
            table.types.insert(
                name.to_string(),
                TypeDef {
                    kind,
                    supertype: supertype.map(str::to_string),
                },
            );
        }
        table
    }

    /// Register a type. The supertype must already exist with the same kind,
    /// which keeps every chain finite.
    pub fn register(
        &mut self,
        name: &str,
        kind: TypeKind,
        supertype: Option<&str>,
    ) -> Result<(), CodegenError> {
        if let Some(parent) = supertype {
            let parent_def = self.require(parent)?;
            if parent_def.kind != kind {
                return Err(CodegenError::schema(
                    name,
                    format!("supertype {parent} is a {:?} type", parent_def.kind),
                ));
            }
        }
        self.types.insert(
            name.to_string(),
            TypeDef {
                kind,
                supertype: supertype.map(str::to_string),
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn require(&self, name: &str) -> Result<&TypeDef, CodegenError> {
        self.get(name)
            .ok_or_else(|| CodegenError::UnknownType(name.to_string()))
    }

    /// True if `name` is `target` or inherits from it.
    pub fn is_subtype(&self, name: &str, target: &str) -> Result<bool, CodegenError> {
        self.require(target)?;
        let mut current = name;
        loop {
            if current == target {
                return Ok(true);
            }
            match &self.require(current)?.supertype {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microfluidic_hierarchy() {
        let types = TypeTable::microfluidic();
        assert_eq!(types.len(), 9);
        assert!(types.is_subtype(T_JUNCTION, CONTROL_POINT).unwrap());
        assert!(types.is_subtype(T_JUNCTION, MICROFLUIDIC_NODE).unwrap());
        assert!(types.is_subtype(CONTROL_POINT, CONTROL_POINT).unwrap());
        assert!(!types.is_subtype(FLUID_ENTRY, CONTROL_POINT).unwrap());
        assert!(!types.is_subtype(CONTROL_POINT, T_JUNCTION).unwrap());
        assert_eq!(types.get(MICROFLUIDIC_CHANNEL).unwrap().kind, TypeKind::Connection);
    }

    #[test]
    fn unknown_types_are_reported() {
        let types = TypeTable::microfluidic();
        assert_eq!(
            types.is_subtype("valve", CONTROL_POINT),
            Err(CodegenError::UnknownType("valve".to_string()))
        );
        assert_eq!(
            types.is_subtype(T_JUNCTION, "mixer"),
            Err(CodegenError::UnknownType("mixer".to_string()))
        );
    }

    #[test]
    fn register_checks_supertype() {
        let mut types = TypeTable::microfluidic();
        types
            .register("serpentineMixer", TypeKind::Node, Some(CONTROL_POINT))
            .unwrap();
        assert!(types.is_subtype("serpentineMixer", MICROFLUIDIC_NODE).unwrap());

        assert!(matches!(
            types.register("weird", TypeKind::Port, Some(CONTROL_POINT)),
            Err(CodegenError::SchemaMismatch { .. })
        ));
        assert_eq!(
            types.register("orphan", TypeKind::Node, Some("missing")),
            Err(CodegenError::UnknownType("missing".to_string()))
        );
    }
}
