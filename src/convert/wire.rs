//! Options-driven JSON shaping of content models.
//!
//! The wire shape depends on delivery options, so serialization is an
//! explicit builder rather than a derived `Serialize`: a property model
//! serializes verbosely as `{value, propertyDataType}` or, flattened, as
//! the bare value; a content identity serializes as
//! `{id, workId, guidValue, providerName, url, expanded}`, with numeric
//! ids replaced by a `language` field when identifier hiding is configured.

use serde_json::{Map, Value, json};

use crate::config::DeliveryOptions;
use crate::convert::model::{ContentModel, ExpandedValue, PropertyModel};
use crate::domain::{ContentReference, Language};

/// Serialize a full content model.
pub fn content_to_json(model: &ContentModel, options: &DeliveryOptions) -> Value {
    let mut out = Map::new();
    out.insert(
        "contentLink".to_string(),
        reference_to_json(&model.reference, model.url.as_deref(), Some(&model.language), options),
    );
    out.insert("name".to_string(), json!(model.name));
    out.insert("language".to_string(), json!(model.language.as_str()));
    out.insert(
        "existingLanguages".to_string(),
        json!(model
            .existing_languages
            .iter()
            .map(Language::as_str)
            .collect::<Vec<_>>()),
    );
    out.insert(
        "masterLanguage".to_string(),
        json!(model.master_language.as_str()),
    );
    out.insert("contentType".to_string(), json!(model.content_type));
    out.insert(
        "parentLink".to_string(),
        match &model.parent {
            Some(parent) => reference_to_json(parent, None, None, options),
            None => Value::Null,
        },
    );
    if let Some(url) = &model.url {
        out.insert("url".to_string(), json!(url));
    }
    for (name, property) in &model.properties {
        out.insert(camel_case(name), property_to_json(property, options));
    }
    Value::Object(out)
}

/// Serialize one property model according to the flattening option.
pub fn property_to_json(property: &PropertyModel, options: &DeliveryOptions) -> Value {
    let expanded = property
        .expanded
        .as_ref()
        .map(|e| expanded_to_json(e, options));

    if options.flatten_property_models {
        // Flattened: expanded models replace the bare value when present.
        return expanded.unwrap_or_else(|| property.value.clone());
    }

    let mut out = Map::new();
    out.insert("value".to_string(), property.value.clone());
    out.insert("propertyDataType".to_string(), json!(property.data_type));
    if let Some(expanded) = expanded {
        out.insert("expanded".to_string(), expanded);
    }
    Value::Object(out)
}

/// Serialize a content identity.
pub fn reference_to_json(
    reference: &ContentReference,
    url: Option<&str>,
    language: Option<&Language>,
    options: &DeliveryOptions,
) -> Value {
    let mut out = Map::new();
    if options.include_numeric_ids {
        out.insert("id".to_string(), json!(reference.id.0));
        out.insert("workId".to_string(), json!(reference.work_id));
    } else if let Some(language) = language {
        out.insert("language".to_string(), json!(language.as_str()));
    }
    out.insert("guidValue".to_string(), json!(reference.guid));
    out.insert("providerName".to_string(), json!(reference.provider));
    out.insert("url".to_string(), json!(url));
    out.insert("expanded".to_string(), Value::Null);
    Value::Object(out)
}

fn expanded_to_json(expanded: &ExpandedValue, options: &DeliveryOptions) -> Value {
    match expanded {
        ExpandedValue::Single(model) => content_to_json(model, options),
        ExpandedValue::Many(models) => json!(models
            .iter()
            .map(|m| content_to_json(m, options))
            .collect::<Vec<_>>()),
    }
}

fn camel_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
