use std::collections::HashMap;

use roxmltree::Node;

use crate::error::{Diagnostic, ElementError};
use crate::gradient::{GradientDef, GradientKind, resolve_inheritance};

pub(crate) const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

// Same-document fragment reference from `href`, falling back to `xlink:href`.
pub(crate) fn href_id(node: Node<'_, '_>) -> Option<String> {
    href(node)?
        .trim()
        .strip_prefix('#')
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

pub(crate) fn href<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute("href")
        .or_else(|| node.attribute((XLINK_NS, "href")))
}

#[derive(Debug, Clone)]
pub enum Definition<'a, 'input> {
    Element(Node<'a, 'input>),
    Gradient(GradientDef),
}

impl Definition<'_, '_> {
    fn tag(&self) -> &str {
        match self {
            Definition::Element(node) => node.tag_name().name(),
            Definition::Gradient(g) => match g.kind {
                GradientKind::Linear => "linearGradient",
                GradientKind::Radial => "radialGradient",
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefinitionSummary {
    pub elements: usize,
    pub linear_gradients: usize,
    pub radial_gradients: usize,
    pub conflicts: usize,
}

impl DefinitionSummary {
    pub fn total(&self) -> usize {
        self.elements + self.linear_gradients + self.radial_gradients
    }
}

// Every identified element of one document, built once before rendering and then
// only read.
#[derive(Debug, Default)]
pub struct Registry<'a, 'input> {
    entries: HashMap<String, Definition<'a, 'input>>,
    conflicts: usize,
}

impl<'a, 'input> Registry<'a, 'input> {
    pub fn collect(root: Node<'a, 'input>, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut registry = Registry::default();
        let mut gradients = HashMap::new();

        for node in root.descendants().filter(|n| n.is_element()) {
            let Some(id) = node.attribute("id").map(str::trim).filter(|id| !id.is_empty())
            else {
                continue;
            };
            let tag = node.tag_name().name();
            let def = match tag {
                "linearGradient" | "radialGradient" => match GradientDef::parse(node, id) {
                    Ok(g) => {
                        gradients.insert(id.to_string(), g.clone());
                        Definition::Gradient(g)
                    }
                    Err(error) => {
                        diagnostics.push(Diagnostic::Element {
                            tag: tag.to_string(),
                            id: Some(id.to_string()),
                            error,
                        });
                        continue;
                    }
                },
                _ => Definition::Element(node),
            };
            registry.insert(id, def, diagnostics);
        }

        // Chains may point forward, so inheritance runs over the complete set.
        resolve_inheritance(&mut gradients);
        for (id, resolved) in gradients {
            if let Some(Definition::Gradient(g)) = registry.entries.get_mut(&id) {
                *g = resolved;
            }
        }
        registry
    }

    fn insert(&mut self, id: &str, def: Definition<'a, 'input>, diagnostics: &mut Vec<Diagnostic>) {
        let replacement = def.tag().to_string();
        if let Some(previous) = self.entries.insert(id.to_string(), def) {
            self.conflicts += 1;
            diagnostics.push(Diagnostic::DefinitionConflict {
                id: id.to_string(),
                previous: previous.tag().to_string(),
                replacement,
            });
        }
    }

    pub fn element(&self, id: &str) -> Result<Node<'a, 'input>, ElementError> {
        match self.entries.get(id) {
            Some(Definition::Element(node)) => Ok(*node),
            _ => Err(ElementError::UnresolvedReference(id.to_string())),
        }
    }

    pub fn gradient(&self, id: &str) -> Option<&GradientDef> {
        match self.entries.get(id) {
            Some(Definition::Gradient(g)) => Some(g),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> DefinitionSummary {
        let mut out = DefinitionSummary {
            conflicts: self.conflicts,
            ..Default::default()
        };
        for def in self.entries.values() {
            match def {
                Definition::Element(_) => out.elements += 1,
                Definition::Gradient(g) if g.kind == GradientKind::Linear => {
                    out.linear_gradients += 1
                }
                Definition::Gradient(_) => out.radial_gradients += 1,
            }
        }
        out
    }
}
