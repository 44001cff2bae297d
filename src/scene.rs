//! The live host state: a scene graph of named nodes with typed components.
//!
//! This is the mutation-sensitive structure the apply context exists to
//! protect. Every mutating command handler operates on exactly one `Scene`,
//! always from the single apply thread.

use indexmap::IndexMap;
use serde::Serialize;

use crate::convert::{PropertyValue, TargetType};
use crate::error::BridgeError;

/// Static description of a component type: its name and typed properties.
pub struct ComponentSpec {
    pub type_name: &'static str,
    pub properties: &'static [(&'static str, TargetType)],
}

const ALIGNMENTS: &[&str] = &["Left", "Center", "Right"];

/// The built-in component catalog. Property types drive wire-value
/// conversion when a patch targets them.
pub const COMPONENT_SPECS: &[ComponentSpec] = &[
    ComponentSpec {
        type_name: "Transform",
        properties: &[
            ("position", TargetType::Vec3),
            ("rotation", TargetType::Vec3),
            ("scale", TargetType::Vec3),
        ],
    },
    ComponentSpec {
        type_name: "Sprite",
        properties: &[
            ("color", TargetType::Color),
            ("size", TargetType::Vec2),
            ("flip", TargetType::Bool),
            ("texture", TargetType::Reference),
        ],
    },
    ComponentSpec {
        type_name: "Label",
        properties: &[
            ("text", TargetType::Str),
            ("fontSize", TargetType::Float),
            ("color", TargetType::Color),
            ("alignment", TargetType::Enum(ALIGNMENTS)),
        ],
    },
    ComponentSpec {
        type_name: "Slider",
        properties: &[
            ("minValue", TargetType::Float),
            ("maxValue", TargetType::Float),
            ("value", TargetType::Float),
            ("wholeNumbers", TargetType::Bool),
            ("steps", TargetType::Int),
        ],
    },
];

/// Look up a component spec by type name.
pub fn component_spec(type_name: &str) -> Option<&'static ComponentSpec> {
    COMPONENT_SPECS
        .iter()
        .find(|spec| spec.type_name == type_name)
}

/// Default stored value for a declared property type. References hold a
/// path string the host fills in; wire patches cannot set them.
fn default_value(target: TargetType) -> PropertyValue {
    match target {
        TargetType::Int => PropertyValue::Int(0),
        TargetType::Bool => PropertyValue::Bool(false),
        TargetType::Float => PropertyValue::Float(0.0),
        TargetType::Str | TargetType::Reference => PropertyValue::Str(String::new()),
        TargetType::Color => PropertyValue::Color([1.0, 1.0, 1.0, 1.0]),
        TargetType::Vec2 => PropertyValue::Vec2([0.0, 0.0]),
        TargetType::Vec3 => PropertyValue::Vec3([0.0, 0.0, 0.0]),
        TargetType::Vec4 => PropertyValue::Vec4([0.0, 0.0, 0.0, 1.0]),
        TargetType::Enum(allowed) => {
            PropertyValue::Enum(allowed.first().copied().unwrap_or_default().to_string())
        }
    }
}

/// A component instance attached to a node.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    #[serde(rename = "componentType")]
    pub type_name: String,
    pub properties: IndexMap<String, PropertyValue>,
}

impl Component {
    pub fn from_spec(spec: &ComponentSpec) -> Self {
        Self {
            type_name: spec.type_name.to_string(),
            properties: spec
                .properties
                .iter()
                .map(|(name, target)| ((*name).to_string(), default_value(*target)))
                .collect(),
        }
    }

    /// Declared target type of a property, from the component catalog.
    pub fn property_type(&self, property: &str) -> Option<TargetType> {
        component_spec(&self.type_name)?
            .properties
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, target)| *target)
    }
}

/// A named node in the scene hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub name: String,
    pub parent: Option<String>,
    pub active: bool,
    pub components: IndexMap<String, Component>,
}

/// The scene graph. Insertion order is preserved so hierarchy listings are
/// stable across runs.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: IndexMap<String, Node>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes.get_mut(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Create a node. Names are unique; the parent, when given, must exist.
    pub fn create_node(
        &mut self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<(), BridgeError> {
        if self.nodes.contains_key(name) {
            return Err(BridgeError::Validation {
                message: format!("Node '{name}' already exists"),
            });
        }
        if let Some(parent_name) = parent {
            if !self.nodes.contains_key(parent_name) {
                return Err(BridgeError::NotFound {
                    what: format!("Parent node '{parent_name}'"),
                });
            }
        }
        self.nodes.insert(
            name.to_string(),
            Node {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                active: true,
                components: IndexMap::new(),
            },
        );
        Ok(())
    }

    /// Delete a node and, transitively, its children.
    pub fn delete_node(&mut self, name: &str) -> Result<usize, BridgeError> {
        if self.nodes.shift_remove(name).is_none() {
            return Err(BridgeError::NotFound {
                what: format!("Node '{name}'"),
            });
        }
        let mut removed = 1;
        let children: Vec<String> = self
            .nodes
            .values()
            .filter(|n| n.parent.as_deref() == Some(name))
            .map(|n| n.name.clone())
            .collect();
        for child in children {
            removed += self.delete_node(&child)?;
        }
        Ok(removed)
    }

    /// Rename a node, rewriting child parent references.
    pub fn rename_node(&mut self, name: &str, new_name: &str) -> Result<(), BridgeError> {
        if self.nodes.contains_key(new_name) {
            return Err(BridgeError::Validation {
                message: format!("Node '{new_name}' already exists"),
            });
        }
        let Some(mut node) = self.nodes.shift_remove(name) else {
            return Err(BridgeError::NotFound {
                what: format!("Node '{name}'"),
            });
        };
        node.name = new_name.to_string();
        self.nodes.insert(new_name.to_string(), node);
        for other in self.nodes.values_mut() {
            if other.parent.as_deref() == Some(name) {
                other.parent = Some(new_name.to_string());
            }
        }
        Ok(())
    }

    /// Indented text rendering of the hierarchy, roots first.
    pub fn hierarchy_text(&self) -> String {
        let mut lines = Vec::new();
        let roots: Vec<&Node> = self.nodes.values().filter(|n| n.parent.is_none()).collect();
        for root in roots {
            self.render_subtree(root, 0, &mut lines);
        }
        lines.join("\n")
    }

    fn render_subtree(&self, node: &Node, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let state = if node.active { "" } else { " (inactive)" };
        let components: Vec<&str> = node.components.keys().map(String::as_str).collect();
        let suffix = if components.is_empty() {
            String::new()
        } else {
            format!(" [{}]", components.join(", "))
        };
        lines.push(format!("{indent}{}{state}{suffix}", node.name));
        let children: Vec<&Node> = self
            .nodes
            .values()
            .filter(|n| n.parent.as_deref() == Some(node.name.as_str()))
            .collect();
        for child in children {
            self.render_subtree(child, depth + 1, lines);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_duplicate_names() {
        let mut scene = Scene::new();
        scene.create_node("Panel", None).unwrap();
        assert!(scene.create_node("Panel", None).is_err());
    }

    #[test]
    fn create_rejects_missing_parent() {
        let mut scene = Scene::new();
        assert!(scene.create_node("Child", Some("Ghost")).is_err());
    }

    #[test]
    fn delete_removes_descendants() {
        let mut scene = Scene::new();
        scene.create_node("Root", None).unwrap();
        scene.create_node("Child", Some("Root")).unwrap();
        scene.create_node("Grandchild", Some("Child")).unwrap();
        let removed = scene.delete_node("Root").unwrap();
        assert_eq!(removed, 3);
        assert!(scene.is_empty());
    }

    #[test]
    fn rename_rewrites_child_parents() {
        let mut scene = Scene::new();
        scene.create_node("Root", None).unwrap();
        scene.create_node("Child", Some("Root")).unwrap();
        scene.rename_node("Root", "Base").unwrap();
        assert_eq!(scene.node("Child").unwrap().parent.as_deref(), Some("Base"));
    }

    #[test]
    fn components_default_from_their_spec() {
        let spec = component_spec("Label").unwrap();
        let component = Component::from_spec(spec);
        assert_eq!(
            component.properties.get("alignment"),
            Some(&PropertyValue::Enum("Left".to_string()))
        );
        assert_eq!(
            component.property_type("fontSize"),
            Some(TargetType::Float)
        );
        assert_eq!(component.property_type("missing"), None);
    }

    #[test]
    fn hierarchy_text_indents_children() {
        let mut scene = Scene::new();
        scene.create_node("Root", None).unwrap();
        scene.create_node("Child", Some("Root")).unwrap();
        let text = scene.hierarchy_text();
        assert_eq!(text, "Root\n  Child");
    }
}
