//! Response-schema descriptions for structured output.
//!
//! A closed set of typed field descriptors replaces the untyped nested dict
//! the generation service accepts on the wire. [`ResponseSchema::to_wire`]
//! renders the descriptor set into the service's schema format.

use serde_json::{json, Value};

/// Scalar and container kinds the generation service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldKind {
    /// Wire name used in the service's schema format.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::String => "STRING",
            FieldKind::Integer => "INTEGER",
            FieldKind::Number => "NUMBER",
            FieldKind::Boolean => "BOOLEAN",
            FieldKind::Array => "ARRAY",
            FieldKind::Object => "OBJECT",
        }
    }
}

/// One field of a response schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    /// Element kind for `Array` fields; ignored otherwise.
    pub item_kind: Option<FieldKind>,
    pub description: Option<String>,
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            item_kind: None,
            description: None,
            required: false,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String).describe(description)
    }

    pub fn string_array(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut spec = Self::new(name, FieldKind::Array).describe(description);
        spec.item_kind = Some(FieldKind::String);
        spec
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn to_wire(&self) -> Value {
        let mut field = serde_json::Map::new();
        field.insert("type".into(), json!(self.kind.as_str()));
        if let Some(desc) = &self.description {
            field.insert("description".into(), json!(desc));
        }
        if self.kind == FieldKind::Array {
            let item = self.item_kind.unwrap_or(FieldKind::String);
            field.insert("items".into(), json!({ "type": item.as_str() }));
        }
        field.into()
    }
}

/// An object schema built from [`FieldSpec`] descriptors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseSchema {
    fields: Vec<FieldSpec>,
}

impl ResponseSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Render to the generation service's wire schema format.
    pub fn to_wire(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required: Vec<Value> = Vec::new();
        for spec in &self.fields {
            properties.insert(spec.name.clone(), spec.to_wire());
            if spec.required {
                required.push(json!(spec.name));
            }
        }

        let mut schema = serde_json::Map::new();
        schema.insert("type".into(), json!("OBJECT"));
        schema.insert("properties".into(), properties.into());
        if !required.is_empty() {
            schema.insert("required".into(), required.into());
        }
        schema.into()
    }
}

/// Flattened company-context schema for structured output.
///
/// Deeply nested objects are deliberately left out; the service's schema
/// constraint handles flat fields far more reliably, and the assembler fills
/// the nested structures from the unconstrained parts of the response.
pub fn company_context_schema() -> ResponseSchema {
    ResponseSchema::new()
        .field(FieldSpec::string("company_name", "Official company name").required())
        .field(FieldSpec::string("company_url", "Company website URL").required())
        .field(FieldSpec::string("industry", "Primary industry category").required())
        .field(FieldSpec::string("description", "2-3 sentence company description").required())
        .field(FieldSpec::string_array("products", "Products offered"))
        .field(FieldSpec::string_array("services", "Services offered"))
        .field(FieldSpec::string("target_audience", "Ideal customer profile"))
        .field(FieldSpec::string_array("target_audiences", "Target audience segments"))
        .field(FieldSpec::string_array("competitors", "Main competitors"))
        .field(FieldSpec::string_array("competitor_categories", "Competing solution categories"))
        .field(FieldSpec::string("primary_region", "Primary geographic market"))
        .field(FieldSpec::string("primary_country", "Primary country ISO code"))
        .field(FieldSpec::string("primary_language", "Primary language ISO code"))
        .field(FieldSpec::string("tone", "Brand voice tone"))
        .field(FieldSpec::string_array("pain_points", "Customer pain points"))
        .field(FieldSpec::string_array("value_propositions", "Key value propositions"))
        .field(FieldSpec::string_array("use_cases", "Common use cases"))
        .field(FieldSpec::string_array("content_themes", "Content themes/topics"))
        .field(FieldSpec::string("gtm_playbook", "Go-to-market strategy classification"))
        .field(FieldSpec::string("product_type", "Product type (SaaS, API, Platform, etc.)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_field_wire_shape() {
        let schema = ResponseSchema::new()
            .field(FieldSpec::string("name", "A name").required())
            .to_wire();

        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"]["name"]["type"], "STRING");
        assert_eq!(schema["properties"]["name"]["description"], "A name");
        assert_eq!(schema["required"][0], "name");
    }

    #[test]
    fn array_field_carries_item_kind() {
        let schema = ResponseSchema::new()
            .field(FieldSpec::string_array("tags", "Tags"))
            .to_wire();

        assert_eq!(schema["properties"]["tags"]["type"], "ARRAY");
        assert_eq!(schema["properties"]["tags"]["items"]["type"], "STRING");
    }

    #[test]
    fn required_omitted_when_empty() {
        let schema = ResponseSchema::new()
            .field(FieldSpec::string("optional", "Optional field"))
            .to_wire();

        assert!(schema.get("required").is_none());
    }

    #[test]
    fn company_schema_required_core_fields() {
        let schema = company_context_schema().to_wire();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();

        assert_eq!(
            required,
            vec!["company_name", "company_url", "industry", "description"]
        );
    }

    #[test]
    fn company_schema_covers_list_fields() {
        let schema = company_context_schema();
        let list_fields = ["products", "competitors", "pain_points", "content_themes"];
        for name in list_fields {
            let spec = schema
                .fields()
                .iter()
                .find(|f| f.name == name)
                .unwrap_or_else(|| panic!("missing field {name}"));
            assert_eq!(spec.kind, FieldKind::Array);
            assert_eq!(spec.item_kind, Some(FieldKind::String));
        }
    }
}
