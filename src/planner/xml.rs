//! Small helpers shared by the XML readers

use anyhow::{Context, Result};
use quick_xml::events::BytesStart;
use std::collections::HashMap;

/// Collects the attributes of an element into an owned map
pub fn attributes(element: &BytesStart) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.context("Malformed XML attribute")?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .with_context(|| format!("Malformed value for attribute '{}'", key))?
            .into_owned();
        map.insert(key, value);
    }
    Ok(map)
}

/// Parses an optional numeric attribute, failing only when it is present but invalid
pub fn parse_f64(attrs: &HashMap<String, String>, key: &str) -> Result<Option<f64>> {
    attrs
        .get(key)
        .map(|value| {
            value
                .trim()
                .parse::<f64>()
                .with_context(|| format!("Attribute '{}' is not a number: '{}'", key, value))
        })
        .transpose()
}
