//! Solver variable names.
//!
//! A variable is named `<entity>.<attribute>` or `<node>.<port>.<attribute>`.
//! This naming is the only link between generated constraints and the
//! schematic, so entity names must be valid symbols without `.`.

use microflow_smtlib::Symbol;

use crate::error::CodegenError;

pub const WIDTH: &str = "width";
pub const HEIGHT: &str = "height";
pub const VISCOSITY: &str = "viscosity";
pub const LENGTH: &str = "length";
pub const RESISTANCE: &str = "resistance";
pub const FLOW_RATE: &str = "flow_rate";
pub const PRESSURE: &str = "pressure";
pub const X: &str = "x";
pub const Y: &str = "y";

/// Reject names that cannot appear as a path segment.
pub fn validate_segment(name: &str) -> Result<(), CodegenError> {
    if name.contains('.') || Symbol::new(name).is_err() {
        return Err(CodegenError::schema(
            name,
            "name must be a valid symbol without '.'",
        ));
    }
    Ok(())
}

/// `<entity>.<attribute>`
pub fn entity_var(entity: &str, attribute: &str) -> Result<Symbol, CodegenError> {
    Ok(Symbol::new(format!("{entity}.{attribute}"))?)
}

/// `<node>.<port>.<attribute>`
pub fn port_var(node: &str, port: &str, attribute: &str) -> Result<Symbol, CodegenError> {
    Ok(Symbol::new(format!("{node}.{port}.{attribute}"))?)
}

/// Decoded variable name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolPath<'a> {
    Entity {
        entity: &'a str,
        attribute: &'a str,
    },
    Port {
        node: &'a str,
        port: &'a str,
        attribute: &'a str,
    },
}

impl<'a> SymbolPath<'a> {
    /// Split on `.`; only two or three non-empty segments decode.
    pub fn parse(name: &'a str) -> Option<Self> {
        let segments: Vec<&str> = name.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return None;
        }
        match segments[..] {
            [entity, attribute] => Some(SymbolPath::Entity { entity, attribute }),
            [node, port, attribute] => Some(SymbolPath::Port {
                node,
                port,
                attribute,
            }),
            _ => None,
        }
    }

    pub fn attribute(&self) -> &'a str {
        match self {
            SymbolPath::Entity { attribute, .. } | SymbolPath::Port { attribute, .. } => {
                *attribute
            }
        }
    }
}

/// Variables of one channel.
#[derive(Debug, Clone)]
pub struct ChannelVars {
    pub width: Symbol,
    pub height: Symbol,
    pub viscosity: Symbol,
    pub length: Symbol,
    pub resistance: Symbol,
    pub flow_rate: Symbol,
}

impl ChannelVars {
    pub fn new(channel: &str) -> Result<Self, CodegenError> {
        Ok(Self {
            width: entity_var(channel, WIDTH)?,
            height: entity_var(channel, HEIGHT)?,
            viscosity: entity_var(channel, VISCOSITY)?,
            length: entity_var(channel, LENGTH)?,
            resistance: entity_var(channel, RESISTANCE)?,
            flow_rate: entity_var(channel, FLOW_RATE)?,
        })
    }
}

/// Position variables of one node.
#[derive(Debug, Clone)]
pub struct PositionVars {
    pub x: Symbol,
    pub y: Symbol,
}

impl PositionVars {
    pub fn new(node: &str) -> Result<Self, CodegenError> {
        Ok(Self {
            x: entity_var(node, X)?,
            y: entity_var(node, Y)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_variable_names() {
        let vars = ChannelVars::new("ch0").unwrap();
        assert_eq!(vars.width.as_str(), "ch0.width");
        assert_eq!(vars.flow_rate.as_str(), "ch0.flow_rate");
        assert_eq!(
            port_var("n1", "in", PRESSURE).unwrap().as_str(),
            "n1.in.pressure"
        );
    }

    #[test]
    fn invalid_entity_name_fails() {
        assert!(matches!(
            entity_var("1abc", WIDTH),
            Err(CodegenError::Expression(_))
        ));
        assert!(validate_segment("a.b").is_err());
        assert!(validate_segment("a b").is_err());
        assert!(validate_segment("ch_0").is_ok());
    }

    #[test]
    fn decode_paths() {
        assert_eq!(
            SymbolPath::parse("ch0.width"),
            Some(SymbolPath::Entity {
                entity: "ch0",
                attribute: "width"
            })
        );
        assert_eq!(
            SymbolPath::parse("n1.in.pressure"),
            Some(SymbolPath::Port {
                node: "n1",
                port: "in",
                attribute: "pressure"
            })
        );
        assert_eq!(SymbolPath::parse("n1.in.pressure").unwrap().attribute(), "pressure");
        for bad in ["x", "a.b.c.d", "a..b", ".a", "a."] {
            assert_eq!(SymbolPath::parse(bad), None, "{bad}");
        }
    }
}
