//! Typed view over the translatable values of a [`crate::Document`].

use serde::Serialize;
use std::fmt::{Display, Formatter};

use crate::document::{Element, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// A `<string>` resource.
    PlainString,
    /// An `<item>` of a `<string-array>`.
    ArrayItem,
    /// An `<item quantity="...">` of a `<plurals>`.
    PluralItem,
}

impl Display for UnitKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitKind::PlainString => write!(f, "string"),
            UnitKind::ArrayItem => write!(f, "array item"),
            UnitKind::PluralItem => write!(f, "plural item"),
        }
    }
}

/// One resource value, borrowed mutably from its document for the duration of a visit.
#[derive(Debug)]
pub struct TranslatableUnit<'a> {
    kind: UnitKind,
    name: String,
    index: Option<usize>,
    quantity: Option<String>,
    translatable: bool,
    element: &'a mut Element,
}

impl<'a> TranslatableUnit<'a> {
    pub(crate) fn new(
        kind: UnitKind,
        name: String,
        index: Option<usize>,
        quantity: Option<String>,
        translatable: bool,
        element: &'a mut Element,
    ) -> Self {
        TranslatableUnit {
            kind,
            name,
            index,
            quantity,
            translatable,
            element,
        }
    }

    pub fn kind(&self) -> UnitKind {
        self.kind
    }

    /// The `name` attribute of the string, or of the enclosing array/plurals.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn quantity(&self) -> Option<&str> {
        self.quantity.as_deref()
    }

    /// False when the unit or its container is marked `translatable="false"`.
    pub fn is_translatable(&self) -> bool {
        self.translatable
    }

    /// Human-readable identifier used in reports: `name`, `name[2]` or `name[few]`.
    pub fn label(&self) -> String {
        match (self.kind, &self.quantity, self.index) {
            (UnitKind::PlainString, _, _) => self.name.clone(),
            (UnitKind::PluralItem, Some(q), _) => format!("{}[{}]", self.name, q),
            (_, _, Some(i)) => format!("{}[{}]", self.name, i),
            (_, _, None) => self.name.clone(),
        }
    }

    pub fn element(&self) -> &Element {
        self.element
    }

    pub fn value(&self) -> &[Node] {
        &self.element.children
    }

    /// Swaps in a fully validated value.
    pub fn replace_value(&mut self, nodes: Vec<Node>) {
        self.element.children = nodes;
    }

    /// Mutable access to the value nodes, for in-place repairs that keep the structure.
    pub fn value_mut(&mut self) -> &mut Vec<Node> {
        &mut self.element.children
    }
}

/// Visitor driven by [`crate::Document::walk_units`].
pub trait UnitVisitor {
    fn visit_unit(&mut self, unit: TranslatableUnit<'_>);
}
