//! Declarative configuration records.
//!
//! Each record is flat, immutable once built, and renders to an
//! `(xpath, element)` pair submitted once through a configuration `set`
//! call. Records are never read back from the device, so there is no
//! deserialization side.

mod network;
mod policy;

pub use network::{EthernetInterface, Mode, StaticRoute, VirtualRouter, Zone};
pub use policy::{
    AddressObject, NatRule, Protocol, RuleAction, RuleEntry, Rulebase, SecurityRule, ServiceObject,
};

// Configuration roots for a single-vsys deployment.
const DEVICE_XPATH: &str = "/config/devices/entry[@name='localhost.localdomain']";
const VSYS_XPATH: &str =
    "/config/devices/entry[@name='localhost.localdomain']/vsys/entry[@name='vsys1']";

/// One configuration record, rendered for the XML API.
pub trait PanObject {
    /// Name of the configuration entry.
    fn name(&self) -> &str;

    /// Absolute xpath of the entry.
    fn xpath(&self) -> String;

    /// XML element submitted at the entry's xpath.
    fn element(&self) -> String;
}

/// Escape text for use in XML content or attribute values.
fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Render a `<member>` list.
fn members(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("<member>{}</member>", xml_escape(name)))
        .collect()
}

/// Collect builder arguments into owned names.
fn names(items: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    items.into_iter().map(Into::into).collect()
}
