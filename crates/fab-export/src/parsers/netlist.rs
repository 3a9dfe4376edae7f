use crate::error::ExportError;
use std::collections::HashMap;

/// One `<comp>` entry of a KiCad generic XML netlist.
#[derive(Debug, Clone, PartialEq)]
pub struct NetlistComponent {
    pub ref_: String,
    pub value: Option<String>,
    pub footprint: Option<String>,
    pub fields: HashMap<String, String>,
}

impl NetlistComponent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Parse the `<comp>` elements of a netlist export, in document order.
///
/// `value` and `footprint` are left `None` when absent or blank; whether
/// that is fatal is up to the consumer, which may skip the component.
pub fn parse(data: &[u8]) -> Result<Vec<NetlistComponent>, ExportError> {
    let text = std::str::from_utf8(data)
        .map_err(|e| ExportError::Parse(format!("Invalid UTF-8: {e}")))?;
    let parse_opts = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };
    let doc = roxmltree::Document::parse_with_options(text, parse_opts)
        .map_err(|e| ExportError::Parse(format!("XML parse error: {e}")))?;

    let mut components = Vec::new();
    for comp in doc.descendants().filter(|n| n.has_tag_name("comp")) {
        let ref_ = comp
            .attribute("ref")
            .ok_or_else(|| ExportError::Parse("<comp> element without a ref attribute".to_string()))?
            .to_string();

        let value = child_text(&comp, "value");
        let footprint = child_text(&comp, "footprint");

        let mut fields = HashMap::new();
        for group in comp.children().filter(|n| n.has_tag_name("fields")) {
            for field in group.children().filter(|n| n.has_tag_name("field")) {
                if let Some(name) = field.attribute("name") {
                    fields.insert(name.to_string(), field.text().unwrap_or("").to_string());
                }
            }
        }

        components.push(NetlistComponent {
            ref_,
            value,
            footprint,
            fields,
        });
    }

    Ok(components)
}

fn child_text(comp: &roxmltree::Node, tag: &str) -> Option<String> {
    comp.children()
        .find(|n| n.has_tag_name(tag))
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
