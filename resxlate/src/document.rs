//! Android `strings.xml` resource documents.
//!
//! The document is kept as a lossless node tree: declaration, comments, whitespace,
//! CDATA, attribute order and mixed content inside `<string>` all survive a
//! parse/serialize round-trip, so translated files differ from their source only in
//! the text that was actually translated.

use quick_xml::{
    Reader, Writer,
    escape::partial_escape,
    events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event},
};
use std::{
    fs::File,
    io::{BufRead, Read, Write},
    path::Path,
};

use crate::{
    error::Error,
    traits::Parser,
    unit::{TranslatableUnit, UnitKind, UnitVisitor},
};

/// Top-level resource kinds that carry translatable text.
pub const LOCALIZABLE_TAGS: [&str; 3] = ["string", "string-array", "plurals"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Unescaped character data.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }

    fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `string` or `xliff:g`.
    pub name: String,
    /// Attributes in source order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
    /// Written as `<name/>` when it has no children.
    pub self_closing: bool,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `translatable="false"` or any namespaced `*:translatable="false"`.
    pub fn is_marked_untranslatable(&self) -> bool {
        self.attributes.iter().any(|(k, v)| {
            (k == "translatable" || k.ends_with(":translatable"))
                && v.trim().eq_ignore_ascii_case("false")
        })
    }

    /// True when the element holds anything besides plain text.
    pub fn has_markup(&self) -> bool {
        self.children.iter().any(|n| !matches!(n, Node::Text(_)))
    }

    /// Concatenation of the direct text children.
    pub fn free_text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All character data of the element, nested markup and CDATA included.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Serialized XML form of this element, exactly as it would be written to a file.
    pub fn to_xml_string(&self) -> Result<String, Error> {
        let mut out = Vec::new();
        {
            let mut writer = Writer::new(&mut out);
            write_element(&mut writer, self)?;
        }
        String::from_utf8(out).map_err(|e| Error::InvalidResource(e.to_string()))
    }
}

/// Serializes any value node (text, element, comment, ...) to its XML form.
pub fn node_to_xml_string(node: &Node) -> Result<String, Error> {
    let mut out = Vec::new();
    {
        let mut writer = Writer::new(&mut out);
        write_node(&mut writer, node)?;
    }
    String::from_utf8(out).map_err(|e| Error::InvalidResource(e.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    pub encoding: Option<String>,
    pub standalone: Option<String>,
}

impl Default for Declaration {
    fn default() -> Self {
        Declaration {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: None,
        }
    }
}

/// A parsed resource file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub declaration: Option<Declaration>,
    /// Top-level nodes in order; exactly one of them is the root element.
    pub nodes: Vec<Node>,
}

impl Parser for Document {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mut xml_reader = Reader::from_reader(reader);
        let mut buf = Vec::new();
        let mut declaration = None;
        let mut top = Vec::new();
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let node = match xml_reader.read_event_into(&mut buf)? {
                Event::Decl(d) => {
                    declaration = Some(parse_declaration(&d)?);
                    None
                }
                Event::Start(ref e) => {
                    stack.push(parse_start(e, false)?);
                    None
                }
                Event::Empty(ref e) => Some(Node::Element(parse_start(e, true)?)),
                Event::End(_) => {
                    let elem = stack.pop().ok_or_else(|| {
                        Error::InvalidResource("unexpected closing tag".to_string())
                    })?;
                    Some(Node::Element(elem))
                }
                Event::Text(e) => Some(Node::Text(e.unescape()?.into_owned())),
                Event::CData(e) => Some(Node::CData(utf8(e.into_inner().into_owned())?)),
                Event::Comment(e) => Some(Node::Comment(utf8(e.into_inner().into_owned())?)),
                Event::PI(e) => Some(Node::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                )),
                Event::DocType(e) => Some(Node::DocType(utf8(e.into_inner().into_owned())?)),
                Event::Eof => break,
            };
            if let Some(node) = node {
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => top.push(node),
                }
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(Error::InvalidResource(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let roots = top.iter().filter(|n| n.as_element().is_some()).count();
        if roots != 1 {
            return Err(Error::InvalidResource(format!(
                "expected one root element, found {}",
                roots
            )));
        }

        Ok(Document {
            declaration,
            nodes: top,
        })
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        let mut xml_writer = Writer::new(&mut writer);
        if let Some(decl) = &self.declaration {
            xml_writer.write_event(Event::Decl(BytesDecl::new(
                &decl.version,
                decl.encoding.as_deref(),
                decl.standalone.as_deref(),
            )))?;
            if !matches!(self.nodes.first(), Some(Node::Text(t)) if t.starts_with('\n')) {
                xml_writer.write_event(Event::Text(BytesText::new("\n")))?;
            }
        }
        for node in &self.nodes {
            write_node(&mut xml_writer, node)?;
        }
        Ok(())
    }

    /// BOM-aware file reading (UTF-8 with BOM and UTF-16 are decoded to UTF-8).
    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error>
    where
        Self: Sized,
    {
        let file = File::open(path).map_err(Error::Io)?;
        let mut decoder = encoding_rs_io::DecodeReaderBytesBuilder::new()
            .bom_override(true)
            .strip_bom(true)
            .build(file);

        let mut decoded = String::new();
        decoder.read_to_string(&mut decoded).map_err(Error::Io)?;

        Self::from_str(&decoded)
    }
}

impl Document {
    pub fn root(&self) -> Option<&Element> {
        self.nodes.iter().find_map(Node::as_element)
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.nodes.iter_mut().find_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Whether the root element is `<resources>`.
    pub fn is_resources(&self) -> bool {
        self.root().is_some_and(|r| r.name == "resources")
    }

    pub fn has_localizable(&self) -> bool {
        self.root().is_some_and(|root| {
            root.child_elements()
                .any(|e| LOCALIZABLE_TAGS.contains(&e.name.as_str()))
        })
    }

    /// Drops every top-level resource that is not a string, string-array or plurals,
    /// together with the blank text that indented it. Returns how many were removed.
    pub fn retain_localizable(&mut self) -> usize {
        let Some(root) = self.root_mut() else {
            return 0;
        };
        let mut kept: Vec<Node> = Vec::with_capacity(root.children.len());
        let mut removed = 0;
        for node in root.children.drain(..) {
            match &node {
                Node::Element(e) if !LOCALIZABLE_TAGS.contains(&e.name.as_str()) => {
                    if kept.last().is_some_and(Node::is_blank_text) {
                        kept.pop();
                    }
                    removed += 1;
                }
                _ => kept.push(node),
            }
        }
        root.children = kept;
        removed
    }

    pub fn ensure_declaration(&mut self) {
        if self.declaration.is_none() {
            self.declaration = Some(Declaration::default());
        }
    }

    /// Visits every translatable unit in document order.
    ///
    /// `<string>` elements are visited once; each `<item>` of a `<string-array>` or
    /// `<plurals>` is a unit of its own and inherits the container's name and
    /// `translatable` flag.
    pub fn walk_units<V: UnitVisitor + ?Sized>(&mut self, visitor: &mut V) {
        let Some(root) = self.root_mut() else {
            return;
        };
        for node in root.children.iter_mut() {
            let Node::Element(resource) = node else {
                continue;
            };
            let name = resource.attr("name").unwrap_or_default().to_string();
            let container_skip = resource.is_marked_untranslatable();
            let tag = resource.name.clone();
            match tag.as_str() {
                "string" => {
                    let translatable = !container_skip;
                    visitor.visit_unit(TranslatableUnit::new(
                        UnitKind::PlainString,
                        name,
                        None,
                        None,
                        translatable,
                        resource,
                    ));
                }
                "string-array" | "plurals" => {
                    let kind = if tag == "plurals" {
                        UnitKind::PluralItem
                    } else {
                        UnitKind::ArrayItem
                    };
                    let items = resource.children.iter_mut().filter_map(|n| match n {
                        Node::Element(e) if e.name == "item" => Some(e),
                        _ => None,
                    });
                    for (index, item) in items.enumerate() {
                        let translatable = !container_skip && !item.is_marked_untranslatable();
                        let quantity = item.attr("quantity").map(str::to_string);
                        visitor.visit_unit(TranslatableUnit::new(
                            kind,
                            name.clone(),
                            Some(index),
                            quantity,
                            translatable,
                            item,
                        ));
                    }
                }
                _ => {}
            }
        }
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) | Node::CData(t) => out.push_str(t),
            Node::Element(e) => collect_text(&e.children, out),
            _ => {}
        }
    }
}

fn utf8(bytes: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(bytes).map_err(|e| Error::InvalidResource(e.to_string()))
}

fn parse_declaration(decl: &BytesDecl) -> Result<Declaration, Error> {
    let version = String::from_utf8_lossy(&decl.version()?).into_owned();
    let encoding = decl
        .encoding()
        .transpose()?
        .map(|e| String::from_utf8_lossy(&e).into_owned());
    let standalone = decl
        .standalone()
        .transpose()?
        .map(|s| String::from_utf8_lossy(&s).into_owned());
    Ok(Declaration {
        version,
        encoding,
        standalone,
    })
}

fn parse_start(e: &BytesStart, self_closing: bool) -> Result<Element, Error> {
    let mut elem = Element::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    elem.self_closing = self_closing;
    for attr in e.attributes().with_checks(false) {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        elem.attributes.push((key, value));
    }
    Ok(elem)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<(), Error> {
    match node {
        Node::Element(e) => write_element(writer, e)?,
        Node::Text(t) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(t))))?
        }
        Node::CData(c) => writer.write_event(Event::CData(BytesCData::new(c.as_str())))?,
        Node::Comment(c) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?
        }
        Node::ProcessingInstruction(p) => {
            writer.write_event(Event::PI(BytesPI::new(p.as_str())))?
        }
        Node::DocType(d) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(d.as_str())))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, elem: &Element) -> Result<(), Error> {
    let mut start = BytesStart::new(elem.name.as_str());
    for (k, v) in &elem.attributes {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if elem.children.is_empty() && elem.self_closing {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &elem.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(elem.name.as_str())))?;
    Ok(())
}
