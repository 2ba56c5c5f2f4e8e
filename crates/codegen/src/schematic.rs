//! Read-only device graph consumed by the strategies.
//!
//! Entities live in ordered maps keyed by name so that iteration, and thus
//! generated output, is reproducible. New schematics, including annotated
//! copies, are produced through [`SchematicBuilder`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CodegenError;
use crate::naming::validate_segment;
use crate::types::TypeTable;

/// A typed attribute value.
///
/// Deserializes from plain JSON scalars: integers become `Integer`, other
/// numbers `Real`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl AttributeValue {
    /// Numeric value; integers widen to `f64`.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            AttributeValue::Real(v) => Some(*v),
            AttributeValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            AttributeValue::Integer(_) => "integer",
            AttributeValue::Real(_) => "real",
            AttributeValue::Text(_) => "text",
            AttributeValue::Bool(_) => "bool",
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Real(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Integer(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// Typed attribute access shared by every entity kind.
///
/// `owner` names the entity in schema-mismatch errors.
pub trait Entity {
    fn type_name(&self) -> &str;
    fn attributes(&self) -> &Attributes;

    fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes().get(key)
    }

    /// Numeric attribute if present; a non-numeric value is an error.
    fn optional_real(&self, owner: &str, key: &str) -> Result<Option<f64>, CodegenError> {
        match self.attribute(key) {
            None => Ok(None),
            Some(value) => value
                .as_real()
                .map(Some)
                .ok_or_else(|| wrong_kind(owner, key, "numeric", value)),
        }
    }

    fn required_real(&self, owner: &str, key: &str) -> Result<f64, CodegenError> {
        self.optional_real(owner, key)?
            .ok_or_else(|| missing(owner, key))
    }

    fn required_integer(&self, owner: &str, key: &str) -> Result<i64, CodegenError> {
        let value = self.attribute(key).ok_or_else(|| missing(owner, key))?;
        value
            .as_integer()
            .ok_or_else(|| wrong_kind(owner, key, "integer", value))
    }

    fn required_text(&self, owner: &str, key: &str) -> Result<&str, CodegenError> {
        let value = self.attribute(key).ok_or_else(|| missing(owner, key))?;
        value
            .as_text()
            .ok_or_else(|| wrong_kind(owner, key, "text", value))
    }
}

fn missing(owner: &str, key: &str) -> CodegenError {
    CodegenError::schema(owner, format!("missing attribute `{key}`"))
}

fn wrong_kind(owner: &str, key: &str, expected: &str, found: &AttributeValue) -> CodegenError {
    CodegenError::schema(
        owner,
        format!(
            "attribute `{key}` must be {expected}, found {}",
            found.kind_name()
        ),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Port {
    pub type_name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub type_name: String,
    #[serde(default)]
    pub ports: BTreeMap<String, Port>,
    #[serde(default)]
    pub attributes: Attributes,
}

/// One end of a connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub node: String,
    pub port: String,
}

impl PortRef {
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }

    pub fn is(&self, node: &str, port: &str) -> bool {
        self.node == node && self.port == port
    }
}

/// A directed edge; `from → to` is the canonical flow direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub type_name: String,
    pub from: PortRef,
    pub to: PortRef,
    #[serde(default)]
    pub attributes: Attributes,
}

impl Connection {
    /// The end at `node`, preferring `from`.
    pub fn end_at(&self, node: &str) -> Option<&PortRef> {
        if self.from.node == node {
            Some(&self.from)
        } else if self.to.node == node {
            Some(&self.to)
        } else {
            None
        }
    }

    /// The node at the other end from `node`.
    pub fn far_node(&self, node: &str) -> Option<&str> {
        if self.from.node == node {
            Some(&self.to.node)
        } else if self.to.node == node {
            Some(&self.from.node)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintInstance {
    pub type_name: String,
    #[serde(default)]
    pub attributes: Attributes,
}

macro_rules! impl_entity {
    ($($ty:ty),*) => {
        $(
            impl Entity for $ty {
                fn type_name(&self) -> &str {
                    &self.type_name
                }

                fn attributes(&self) -> &Attributes {
                    &self.attributes
                }
            }
        )*
    };
}

impl_entity!(Port, Node, Connection, ConstraintInstance);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schematic {
    pub name: String,
    #[serde(default)]
    pub nodes: BTreeMap<String, Node>,
    #[serde(default)]
    pub connections: BTreeMap<String, Connection>,
    #[serde(default)]
    pub constraints: BTreeMap<String, ConstraintInstance>,
}

impl Schematic {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Load from JSON and check names and connection endpoints.
    pub fn from_json(text: &str) -> Result<Self, CodegenError> {
        let schematic: Schematic = serde_json::from_str(text)
            .map_err(|e| CodegenError::schema("<json>", e.to_string()))?;
        schematic.validate()?;
        Ok(schematic)
    }

    pub fn to_json(&self) -> Result<String, CodegenError> {
        serde_json::to_string_pretty(self).map_err(|e| CodegenError::schema(&self.name, e.to_string()))
    }

    /// Every name is a valid path segment and every connection end exists.
    pub fn validate(&self) -> Result<(), CodegenError> {
        for (name, node) in &self.nodes {
            validate_segment(name)?;
            for port in node.ports.keys() {
                validate_segment(port)?;
            }
        }
        for (name, connection) in &self.connections {
            validate_segment(name)?;
            self.require_port(name, &connection.from)?;
            self.require_port(name, &connection.to)?;
        }
        for name in self.constraints.keys() {
            validate_segment(name)?;
        }
        Ok(())
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn connection(&self, name: &str) -> Option<&Connection> {
        self.connections.get(name)
    }

    pub fn constraint(&self, name: &str) -> Option<&ConstraintInstance> {
        self.constraints.get(name)
    }

    pub fn require_node(&self, name: &str) -> Result<&Node, CodegenError> {
        self.node(name)
            .ok_or_else(|| CodegenError::schema(name, "no such node"))
    }

    /// The port an edge end refers to; `owner` names the referring entity.
    pub fn require_port(&self, owner: &str, end: &PortRef) -> Result<&Port, CodegenError> {
        self.node(&end.node)
            .and_then(|node| node.ports.get(&end.port))
            .ok_or_else(|| {
                CodegenError::schema(owner, format!("no port {}.{}", end.node, end.port))
            })
    }

    /// Nodes whose type is `target` or a subtype, in name order.
    pub fn nodes_of<'a>(
        &'a self,
        types: &TypeTable,
        target: &str,
    ) -> Result<Vec<(&'a str, &'a Node)>, CodegenError> {
        of_type(&self.nodes, types, target)
    }

    pub fn connections_of<'a>(
        &'a self,
        types: &TypeTable,
        target: &str,
    ) -> Result<Vec<(&'a str, &'a Connection)>, CodegenError> {
        of_type(&self.connections, types, target)
    }

    pub fn constraints_of<'a>(
        &'a self,
        types: &TypeTable,
        target: &str,
    ) -> Result<Vec<(&'a str, &'a ConstraintInstance)>, CodegenError> {
        of_type(&self.constraints, types, target)
    }

    /// Connections with either end at `node`.
    pub fn connections_at<'a>(
        &'a self,
        node: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Connection)> + 'a {
        self.connections
            .iter()
            .filter(move |(_, c)| c.from.node == node || c.to.node == node)
            .map(|(name, c)| (name.as_str(), c))
    }

    /// Connections with an end at the given node port.
    pub fn connections_at_port<'a>(
        &'a self,
        node: &'a str,
        port: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Connection)> + 'a {
        self.connections
            .iter()
            .filter(move |(_, c)| c.from.is(node, port) || c.to.is(node, port))
            .map(|(name, c)| (name.as_str(), c))
    }
}

fn of_type<'a, E: Entity>(
    entities: &'a BTreeMap<String, E>,
    types: &TypeTable,
    target: &str,
) -> Result<Vec<(&'a str, &'a E)>, CodegenError> {
    types.require(target)?;
    let mut matched = Vec::new();
    for (name, entity) in entities {
        if types.is_subtype(entity.type_name(), target)? {
            matched.push((name.as_str(), entity));
        }
    }
    Ok(matched)
}

/// Produces new schematics; the source is never modified.
///
/// Methods chain by value. The first invalid step is remembered and returned
/// from [`SchematicBuilder::build`].
#[derive(Debug, Clone)]
pub struct SchematicBuilder {
    schematic: Schematic,
    error: Option<CodegenError>,
}

impl SchematicBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schematic: Schematic::new(name),
            error: None,
        }
    }

    /// Start from a copy of an existing schematic.
    pub fn from_schematic(schematic: &Schematic) -> Self {
        Self {
            schematic: schematic.clone(),
            error: None,
        }
    }

    fn fail(&mut self, err: CodegenError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    fn check_name(&mut self, name: &str) -> bool {
        match validate_segment(name) {
            Ok(()) => true,
            Err(err) => {
                self.fail(err);
                false
            }
        }
    }

    pub fn node(mut self, name: &str, type_name: &str) -> Self {
        if self.check_name(name) {
            self.schematic.nodes.insert(
                name.to_string(),
                Node {
                    type_name: type_name.to_string(),
                    ports: BTreeMap::new(),
                    attributes: Attributes::new(),
                },
            );
        }
        self
    }

    pub fn port(mut self, node: &str, port: &str, type_name: &str) -> Self {
        if !self.check_name(port) {
            return self;
        }
        match self.schematic.nodes.get_mut(node) {
            Some(n) => {
                n.ports.insert(
                    port.to_string(),
                    Port {
                        type_name: type_name.to_string(),
                        attributes: Attributes::new(),
                    },
                );
            }
            None => self.fail(CodegenError::schema(node, "no such node")),
        }
        self
    }

    pub fn connection(
        mut self,
        name: &str,
        type_name: &str,
        from: (&str, &str),
        to: (&str, &str),
    ) -> Self {
        if !self.check_name(name) {
            return self;
        }
        let connection = Connection {
            type_name: type_name.to_string(),
            from: PortRef::new(from.0, from.1),
            to: PortRef::new(to.0, to.1),
            attributes: Attributes::new(),
        };
        let ends = self
            .schematic
            .require_port(name, &connection.from)
            .and(self.schematic.require_port(name, &connection.to))
            .map(|_| ());
        match ends {
            Ok(()) => {
                self.schematic
                    .connections
                    .insert(name.to_string(), connection);
            }
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn constraint(mut self, name: &str, type_name: &str) -> Self {
        if self.check_name(name) {
            self.schematic.constraints.insert(
                name.to_string(),
                ConstraintInstance {
                    type_name: type_name.to_string(),
                    attributes: Attributes::new(),
                },
            );
        }
        self
    }

    pub fn node_attribute(
        mut self,
        node: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        match self.schematic.nodes.get_mut(node) {
            Some(n) => {
                n.attributes.insert(key.to_string(), value.into());
            }
            None => self.fail(CodegenError::schema(node, "no such node")),
        }
        self
    }

    pub fn port_attribute(
        mut self,
        node: &str,
        port: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        match self
            .schematic
            .nodes
            .get_mut(node)
            .and_then(|n| n.ports.get_mut(port))
        {
            Some(p) => {
                p.attributes.insert(key.to_string(), value.into());
            }
            None => self.fail(CodegenError::schema(
                node,
                format!("no port {node}.{port}"),
            )),
        }
        self
    }

    pub fn connection_attribute(
        mut self,
        connection: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        match self.schematic.connections.get_mut(connection) {
            Some(c) => {
                c.attributes.insert(key.to_string(), value.into());
            }
            None => self.fail(CodegenError::schema(connection, "no such connection")),
        }
        self
    }

    pub fn constraint_attribute(
        mut self,
        constraint: &str,
        key: &str,
        value: impl Into<AttributeValue>,
    ) -> Self {
        match self.schematic.constraints.get_mut(constraint) {
            Some(c) => {
                c.attributes.insert(key.to_string(), value.into());
            }
            None => self.fail(CodegenError::schema(constraint, "no such constraint")),
        }
        self
    }

    pub fn build(self) -> Result<Schematic, CodegenError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.schematic),
        }
    }
}
