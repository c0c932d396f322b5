//! Expression tree nodes
//!
//! A rule formula is a tree of [`Node`]s. Trees are authored elsewhere and
//! arrive pre-built in the wire format described on [`NodeDto`].

use super::function::Function;
use crate::error::CoreError;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Wire marker of a constant node
pub const CONSTANT_TYPE: &str = "Constant";

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeDto", into = "NodeDto")]
pub enum Node {
    /// Literal value
    Constant(Value),

    /// Function application
    Apply(Application),
}

/// A function applied to positional and named children
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub function: Function,
    /// Author-ordered positional children
    pub children: Vec<Node>,
    /// Named children, no ordering guarantee
    pub named_children: HashMap<String, Node>,
}

impl Node {
    /// Create a constant node
    pub fn constant(value: impl Into<Value>) -> Self {
        Node::Constant(value.into())
    }

    /// Create a function node with positional children
    pub fn apply(function: Function, children: Vec<Node>) -> Self {
        Node::Apply(Application {
            function,
            children,
            named_children: HashMap::new(),
        })
    }

    /// Create a function node with named children only
    pub fn apply_named<'a>(
        function: Function,
        named: impl IntoIterator<Item = (&'a str, Node)>,
    ) -> Self {
        Node::Apply(Application {
            function,
            children: Vec::new(),
            named_children: named
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect(),
        })
    }

    /// Attach a named child. No-op on constants.
    pub fn with_named(mut self, name: &str, child: Node) -> Self {
        if let Node::Apply(app) = &mut self {
            app.named_children.insert(name.to_string(), child);
        }
        self
    }

    /// `Payload(field)`
    pub fn payload(field: &str) -> Self {
        Node::apply(Function::Payload, vec![Node::constant(field)])
    }

    /// `DatabaseAccess` following `path` from `table` and reading `field`
    pub fn database_access(table: &str, path: &[&str], field: &str) -> Self {
        let path = path.iter().map(|p| Value::from(*p)).collect::<Vec<_>>();
        Node::apply_named(
            Function::DatabaseAccess,
            [
                ("tableName", Node::constant(table)),
                ("fieldName", Node::constant(field)),
                ("path", Node::constant(path)),
            ],
        )
    }

    /// `CustomListAccess` of the list `list_id`
    pub fn custom_list(list_id: &str) -> Self {
        Node::apply_named(
            Function::CustomListAccess,
            [("customListId", Node::constant(list_id))],
        )
    }

    pub fn function(&self) -> Option<&Function> {
        match self {
            Node::Constant(_) => None,
            Node::Apply(app) => Some(&app.function),
        }
    }

    /// Relative cost of evaluating this subtree
    pub fn cost(&self) -> u32 {
        match self {
            Node::Constant(_) => 0,
            Node::Apply(app) => {
                let children: u32 = app
                    .children
                    .iter()
                    .chain(app.named_children.values())
                    .map(Node::cost)
                    .sum();
                app.function.descriptor().cost.saturating_add(children)
            }
        }
    }

    /// Decode a node from its JSON wire form
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Application {
    /// Named child keys in a stable order
    pub fn sorted_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.named_children.keys().collect();
        names.sort();
        names
    }
}

/// Wire/storage representation of a node.
///
/// Constants are `{"type": "Constant", "staticData": {"value": ...}}`. On a
/// function node, every `staticData` entry becomes a constant named child.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDto {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub static_data: Option<HashMap<String, Value>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDto>,

    #[serde(default, alias = "NamedChildren", skip_serializing_if = "HashMap::is_empty")]
    pub named_children: HashMap<String, NodeDto>,
}

impl TryFrom<NodeDto> for Node {
    type Error = CoreError;

    fn try_from(dto: NodeDto) -> Result<Self, Self::Error> {
        let kind = match dto.kind.as_deref() {
            None | Some(CONSTANT_TYPE) => {
                if !dto.children.is_empty() || !dto.named_children.is_empty() {
                    return Err(CoreError::InvalidNode(
                        "constant node cannot have children".to_string(),
                    ));
                }
                let mut data = dto.static_data.ok_or_else(|| {
                    CoreError::InvalidNode("node has neither a type nor staticData".to_string())
                })?;
                let value = data.remove("value").unwrap_or(Value::Null);
                if !data.is_empty() {
                    log::warn!("ignoring extra staticData keys on constant node: {:?}", data.keys());
                }
                return Ok(Node::Constant(value));
            }
            Some(kind) => kind.to_string(),
        };

        let children = dto
            .children
            .into_iter()
            .map(Node::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut named_children = HashMap::with_capacity(dto.named_children.len());
        for (name, child) in dto.named_children {
            named_children.insert(name, Node::try_from(child)?);
        }

        for (name, value) in dto.static_data.unwrap_or_default() {
            if named_children.contains_key(&name) {
                return Err(CoreError::InvalidNode(format!(
                    "staticData key '{}' clashes with a named child of {}",
                    name, kind
                )));
            }
            named_children.insert(name, Node::Constant(value));
        }

        Ok(Node::Apply(Application {
            function: Function::from_name(&kind),
            children,
            named_children,
        }))
    }
}

impl From<Node> for NodeDto {
    fn from(node: Node) -> Self {
        match node {
            Node::Constant(value) => NodeDto {
                kind: Some(CONSTANT_TYPE.to_string()),
                static_data: Some(HashMap::from([("value".to_string(), value)])),
                ..NodeDto::default()
            },
            Node::Apply(app) => NodeDto {
                kind: Some(app.function.name().to_string()),
                static_data: None,
                children: app.children.into_iter().map(NodeDto::from).collect(),
                named_children: app
                    .named_children
                    .into_iter()
                    .map(|(name, child)| (name, NodeDto::from(child)))
                    .collect(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_node() {
        let node = Node::constant(42);
        assert_eq!(node, Node::Constant(Value::Number(42.0)));
        assert_eq!(node.cost(), 0);
        assert!(node.function().is_none());
    }

    #[test]
    fn test_decode_function_node() {
        let json = r#"{
            "type": "=",
            "children": [
                {"type": "Payload", "children": [{"type": "Constant", "staticData": {"value": "name"}}]},
                {"staticData": {"value": "Reject test account"}}
            ]
        }"#;
        let node = Node::from_json(json).unwrap();
        assert_eq!(
            node,
            Node::apply(
                Function::Equal,
                vec![Node::payload("name"), Node::constant("Reject test account")]
            )
        );
    }

    #[test]
    fn test_decode_named_children_alias() {
        let json = r#"{
            "type": "CustomListAccess",
            "NamedChildren": {"customListId": {"type": "Constant", "staticData": {"value": "l1"}}}
        }"#;
        assert_eq!(Node::from_json(json).unwrap(), Node::custom_list("l1"));
    }

    #[test]
    fn test_static_data_becomes_named_children() {
        let json = r#"{"type": "CustomListAccess", "staticData": {"customListId": "l1"}}"#;
        assert_eq!(Node::from_json(json).unwrap(), Node::custom_list("l1"));

        let clash = r#"{
            "type": "CustomListAccess",
            "staticData": {"customListId": "l1"},
            "namedChildren": {"customListId": {"staticData": {"value": "l2"}}}
        }"#;
        assert!(Node::from_json(clash).is_err());
    }

    #[test]
    fn test_null_constant_and_invalid_nodes() {
        let node = Node::from_json(r#"{"type": "Constant", "staticData": {"value": null}}"#).unwrap();
        assert_eq!(node, Node::Constant(Value::Null));

        assert!(Node::from_json(r#"{"children": []}"#).is_err());
        assert!(Node::from_json(
            r#"{"type": "Constant", "staticData": {"value": 1}, "children": [{"staticData": {"value": 2}}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_wire_round_trip() {
        let node = Node::apply(
            Function::And,
            vec![
                Node::apply(
                    Function::Greater,
                    vec![Node::payload("amount"), Node::constant(100)],
                ),
                Node::database_access("transactions", &["account"], "name"),
            ],
        );
        let json = node.to_json().unwrap();
        assert_eq!(Node::from_json(&json).unwrap(), node);
    }

    #[test]
    fn test_unknown_function_decodes_as_external() {
        let node = Node::from_json(r#"{"type": "FuzzyMatch", "children": []}"#).unwrap();
        assert_eq!(
            node.function(),
            Some(&Function::External("FuzzyMatch".to_string()))
        );
    }

    #[test]
    fn test_cost_accumulates_children() {
        let db = Node::database_access("transactions", &["account"], "name");
        let cheap = Node::apply(Function::Not, vec![Node::constant(true)]);
        assert!(db.cost() > cheap.cost());
        assert_eq!(cheap.cost(), 1);
    }
}
