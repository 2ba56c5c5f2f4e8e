//! Writing solved values back onto the schematic.

use microflow_solver::IntervalResult;

use crate::error::CodegenError;
use crate::naming::SymbolPath;
use crate::schematic::{AttributeValue, Schematic, SchematicBuilder};

/// Where a solved symbol lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target<'a> {
    Node(&'a str),
    Connection(&'a str),
    Constraint(&'a str),
    Port(&'a str, &'a str),
}

fn classify<'a>(schematic: &Schematic, path: &SymbolPath<'a>) -> Option<Target<'a>> {
    match *path {
        SymbolPath::Entity { entity, .. } => {
            if schematic.node(entity).is_some() {
                Some(Target::Node(entity))
            } else if schematic.connection(entity).is_some() {
                Some(Target::Connection(entity))
            } else if schematic.constraint(entity).is_some() {
                Some(Target::Constraint(entity))
            } else {
                None
            }
        }
        SymbolPath::Port { node, port, .. } => schematic
            .node(node)
            .filter(|n| n.ports.contains_key(port))
            .map(|_| Target::Port(node, port)),
    }
}

/// Copy `schematic` with every solved variable stored as an attribute.
///
/// Each value is the midpoint of its interval. Symbols that do not name an
/// existing entity, or whose interval has no finite midpoint, are skipped.
/// An unsatisfiable result yields an unchanged copy.
pub fn annotate(schematic: &Schematic, result: &IntervalResult) -> Result<Schematic, CodegenError> {
    if !result.is_satisfiable() {
        return Ok(schematic.clone());
    }
    let mut builder = SchematicBuilder::from_schematic(schematic);
    let mut written = 0usize;
    for (symbol, interval) in result.iter() {
        let Some(path) = SymbolPath::parse(symbol.as_str()) else {
            tracing::debug!(symbol = %symbol, "not an entity path, skipped");
            continue;
        };
        let Some(target) = classify(schematic, &path) else {
            tracing::debug!(symbol = %symbol, "no matching entity, skipped");
            continue;
        };
        let value = interval.midpoint();
        if !value.is_finite() {
            tracing::warn!(symbol = %symbol, interval = %interval, "no finite midpoint, skipped");
            continue;
        }
        let key = path.attribute();
        let value = AttributeValue::Real(value);
        builder = match target {
            Target::Node(node) => builder.node_attribute(node, key, value),
            Target::Connection(connection) => builder.connection_attribute(connection, key, value),
            Target::Constraint(constraint) => builder.constraint_attribute(constraint, key, value),
            Target::Port(node, port) => builder.port_attribute(node, port, key, value),
        };
        written += 1;
    }
    tracing::debug!(written, total = result.len(), "annotated schematic");
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schematic::Entity;
    use crate::types::{
        DROPLET_VOLUME_CONSTRAINT, FLUID_ENTRY, MICROFLUIDIC_CHANNEL, MICROFLUIDIC_PORT,
    };
    use microflow_smtlib::Symbol;
    use microflow_solver::Interval;
    use std::collections::BTreeMap;

    fn schematic() -> Schematic {
        SchematicBuilder::new("chip")
            .node("a", FLUID_ENTRY)
            .port("a", "out", MICROFLUIDIC_PORT)
            .node("b", FLUID_ENTRY)
            .port("b", "in", MICROFLUIDIC_PORT)
            .connection("ch0", MICROFLUIDIC_CHANNEL, ("a", "out"), ("b", "in"))
            .constraint("drop", DROPLET_VOLUME_CONSTRAINT)
            .build()
            .unwrap()
    }

    fn result(entries: &[(&str, f64, f64)]) -> IntervalResult {
        let intervals: BTreeMap<Symbol, Interval> = entries
            .iter()
            .map(|&(name, lo, hi)| (Symbol::new(name).unwrap(), Interval::new(lo, hi).unwrap()))
            .collect();
        IntervalResult::satisfiable(intervals)
    }

    fn real(value: Option<&AttributeValue>) -> Option<f64> {
        value.and_then(AttributeValue::as_real)
    }

    #[test]
    fn unsatisfiable_leaves_schematic_unchanged() {
        let original = schematic();
        let annotated = annotate(&original, &IntervalResult::unsatisfiable()).unwrap();
        assert_eq!(annotated, original);
    }

    #[test]
    fn writes_midpoints_to_every_entity_kind() {
        let original = schematic();
        let annotated = annotate(
            &original,
            &result(&[
                ("a.x", 1.0, 3.0),
                ("ch0.width", 0.0001, 0.0003),
                ("drop.volume", 5.0, 5.0),
                ("a.out.pressure", -2.0, 2.0),
            ]),
        )
        .unwrap();
        let node = annotated.node("a").unwrap();
        assert_eq!(real(node.attribute("x")), Some(2.0));
        let channel = annotated.connection("ch0").unwrap();
        let width = real(channel.attribute("width")).unwrap();
        assert!((width - 0.0002).abs() < 1e-12);
        let constraint = annotated.constraint("drop").unwrap();
        assert_eq!(real(constraint.attribute("volume")), Some(5.0));
        let port = &annotated.node("a").unwrap().ports["out"];
        assert_eq!(real(port.attribute("pressure")), Some(0.0));

        assert!(original.node("a").unwrap().attribute("x").is_none());
    }

    #[test]
    fn unclassifiable_symbols_are_skipped() {
        let original = schematic();
        let annotated = annotate(
            &original,
            &result(&[
                ("ghost.x", 1.0, 1.0),
                ("a.missing.pressure", 1.0, 1.0),
                ("a.b.c.d", 1.0, 1.0),
                ("plain", 1.0, 1.0),
            ]),
        )
        .unwrap();
        assert_eq!(annotated, original);
    }

    #[test]
    fn unbounded_interval_is_skipped() {
        let annotated = annotate(
            &schematic(),
            &result(&[
                ("a.x", f64::NEG_INFINITY, f64::INFINITY),
                ("a.y", 1.0, f64::INFINITY),
            ]),
        )
        .unwrap();
        let node = annotated.node("a").unwrap();
        assert!(node.attribute("x").is_none());
        assert!(node.attribute("y").is_none());
    }

    #[test]
    fn nodes_take_precedence_over_connections() {
        let original = SchematicBuilder::from_schematic(&schematic())
            .connection("a", MICROFLUIDIC_CHANNEL, ("a", "out"), ("b", "in"))
            .build()
            .unwrap();
        let annotated = annotate(&original, &result(&[("a.length", 4.0, 4.0)])).unwrap();
        assert!(annotated.node("a").unwrap().attribute("length").is_some());
        assert!(annotated.connection("a").unwrap().attribute("length").is_none());
    }
}
