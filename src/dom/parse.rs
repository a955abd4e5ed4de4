//! XHTML reading and writing for [`Document`]

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{Document, NodeData, NodeId};
use crate::error::Result;

/// Parse an XHTML string into a document tree.
///
/// Comments, processing instructions and the doctype are dropped; text and
/// CDATA become text nodes. Unclosed elements are closed at end of input.
pub fn parse_xhtml(input: &str) -> Result<Document> {
    let mut reader = Reader::from_str(input);
    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.root()];

    loop {
        let parent = stack.last().copied().unwrap_or_else(|| doc.root());
        match reader.read_event()? {
            Event::Start(ref e) => {
                let element = element_from_start(&mut doc, e)?;
                doc.append_child(parent, element);
                stack.push(element);
            }
            Event::Empty(ref e) => {
                let element = element_from_start(&mut doc, e)?;
                doc.append_child(parent, element);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?;
                if !text.is_empty() {
                    let node = doc.create_text(&text);
                    doc.append_child(parent, node);
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned())?;
                let node = doc.create_text(&text);
                doc.append_child(parent, node);
            }
            Event::Eof => break,
            // Comments, declarations, PIs, doctype
            _ => {}
        }
    }

    Ok(doc)
}

fn element_from_start(doc: &mut Document, start: &BytesStart<'_>) -> Result<NodeId> {
    let tag = String::from_utf8(start.name().as_ref().to_vec())?;
    let element = doc.create_element(&tag);
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        let value = attr.unescape_value()?;
        doc.set_attribute(element, &key, &value);
    }
    Ok(element)
}

impl Document {
    /// Serialize the whole tree as XHTML
    pub fn to_xhtml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        for &child in self.children(self.root()) {
            self.write_node(&mut writer, child)?;
        }
        Ok(String::from_utf8(writer.into_inner())?)
    }

    fn write_node(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        match self.data(id) {
            NodeData::Document => {
                for &child in self.children(id) {
                    self.write_node(writer, child)?;
                }
            }
            NodeData::Text(text) => {
                writer.write_event(Event::Text(BytesText::new(text)))?;
            }
            NodeData::Element(el) => {
                let mut start = BytesStart::new(el.tag.as_str());
                for (key, value) in &el.attributes {
                    start.push_attribute((key.as_str(), value.as_str()));
                }
                writer.write_event(Event::Start(start))?;
                for &child in self.children(id) {
                    self.write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(el.tag.as_str())))?;
            }
        }
        Ok(())
    }
}
