//! Builds the `ID -> element` index ("xmlElements" in the spec) that lets the
//! compiler resolve ODX `ID-REF` links in one lookup.

use std::collections::HashMap;

use roxmltree::{Document, Node, NodeId};

use super::error::{OdxError, OdxResult};

/// A parsed ODX document plus the `ID -> element` map built from it by one
/// traversal, used to resolve `ID-REF` attributes during compilation.
pub struct XmlIndex<'input> {
    document: Document<'input>,
    by_id: HashMap<String, NodeId>,
}

impl std::fmt::Debug for XmlIndex<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlIndex")
            .field("elements_indexed", &self.by_id.len())
            .finish()
    }
}

impl<'input> XmlIndex<'input> {
    /// Parses `xml` and indexes every element carrying an `ID` attribute.
    pub fn parse(xml: &'input str) -> OdxResult<Self> {
        let document = Document::parse(xml).map_err(|e| OdxError::MalformedXml {
            reason: e.to_string(),
        })?;

        let mut by_id = HashMap::new();
        for node in document.descendants() {
            if let Some(id) = node.attribute("ID") {
                by_id.insert(id.to_string(), node.id());
            }
        }

        Ok(Self { document, by_id })
    }

    /// The root `<ODX>` element's children, i.e. every top-level document
    /// section.
    pub fn root(&self) -> Node<'_, 'input> {
        self.document.root_element()
    }

    /// All elements anywhere in the document with the given tag name.
    pub fn elements_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
        self.document.descendants().filter(move |n| n.tag_name().name() == tag)
    }

    /// Resolves an `ID-REF` attribute value to the element it names.
    pub fn resolve(&self, id_ref: &str) -> OdxResult<Node<'_, 'input>> {
        let node_id = self.by_id.get(id_ref).copied().ok_or_else(|| OdxError::MissingElement {
            id_ref: id_ref.to_string(),
        })?;
        self.document.get_node(node_id).ok_or_else(|| OdxError::MissingElement {
            id_ref: id_ref.to_string(),
        })
    }
}
