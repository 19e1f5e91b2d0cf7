//! Declarative schema descriptions with a non-panicking validation path.
//!
//! The schema layer is the seam where all data entering the system (form
//! input) and all data read back from the remote store (untrusted: stale,
//! written by older clients, or hand-edited) is checked. `safe_validate`
//! reports issues as data; it never panics and never returns early on the
//! first problem.

mod adapter;

pub use adapter::{validate_partial_with_schema, validate_with_schema};

use crate::core::FieldIssue;
use chrono::DateTime;
use serde_json::Value as JsonValue;

/// Primitive shape of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    /// RFC3339 string after timestamp normalization.
    Timestamp,
    Array,
    Object,
}

impl FieldType {
    fn matches(&self, value: &JsonValue) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Timestamp => value
                .as_str()
                .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok()),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamp",
            FieldType::Array => "array",
            FieldType::Object => "object",
        }
    }
}

/// One declared field: its type, whether it is required, optional string
/// length bounds, nested object fields and array element spec.
///
/// Undeclared fields are allowed and ignored; domain items carry extra
/// fields the generic list schema does not know about.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    /// Nested specs for `Object` fields.
    pub fields: Vec<FieldSpec>,
    /// Element spec for `Array` fields.
    pub element: Option<Box<FieldSpec>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            min_length: None,
            max_length: None,
            fields: Vec::new(),
            element: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Timestamp)
    }

    pub fn object(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        let mut spec = Self::new(name, FieldType::Object);
        spec.fields = fields;
        spec
    }

    pub fn array_of(name: impl Into<String>, element: FieldSpec) -> Self {
        let mut spec = Self::new(name, FieldType::Array);
        spec.element = Some(Box::new(element));
        spec
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    fn check(&self, value: &JsonValue, path: &mut Vec<String>, issues: &mut Vec<FieldIssue>) {
        if !self.field_type.matches(value) {
            issues.push(FieldIssue::new(
                path.clone(),
                format!("expected {}", self.field_type.name()),
            ));
            return;
        }

        if let Some(text) = value.as_str() {
            let len = text.chars().count();
            if let Some(min) = self.min_length {
                if len < min {
                    issues.push(FieldIssue::new(
                        path.clone(),
                        format!("must be at least {} character(s)", min),
                    ));
                }
            }
            if let Some(max) = self.max_length {
                if len > max {
                    issues.push(FieldIssue::new(
                        path.clone(),
                        format!("must be at most {} character(s)", max),
                    ));
                }
            }
        }

        if let Some(map) = value.as_object() {
            check_fields(&self.fields, map, path, issues);
        }

        if let (Some(element), Some(items)) = (&self.element, value.as_array()) {
            for (index, item) in items.iter().enumerate() {
                path.push(index.to_string());
                element.check(item, path, issues);
                path.pop();
            }
        }
    }
}

fn check_fields(
    specs: &[FieldSpec],
    map: &serde_json::Map<String, JsonValue>,
    path: &mut Vec<String>,
    issues: &mut Vec<FieldIssue>,
) {
    for spec in specs {
        match map.get(&spec.name) {
            Some(JsonValue::Null) | None => {
                if spec.required {
                    path.push(spec.name.clone());
                    issues.push(FieldIssue::new(path.clone(), "required field is missing"));
                    path.pop();
                }
            }
            Some(value) => {
                path.push(spec.name.clone());
                spec.check(value, path, issues);
                path.pop();
            }
        }
    }
}

/// Outcome of a non-panicking validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaCheck {
    Valid,
    Invalid(Vec<FieldIssue>),
}

impl SchemaCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SchemaCheck::Valid)
    }

    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            SchemaCheck::Valid => &[],
            SchemaCheck::Invalid(issues) => issues,
        }
    }
}

/// Declarative schema for a whole document.
#[derive(Debug, Clone)]
pub struct ListSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl ListSchema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Validates a raw value, collecting every issue instead of stopping at
    /// the first. Non-object roots are a single root-level issue.
    pub fn safe_validate(&self, raw: &JsonValue) -> SchemaCheck {
        self.run(raw, false)
    }

    /// Partial-mode variant: every field is optional at every level, used
    /// for partial-update payloads. Present fields are still type-checked.
    pub fn safe_validate_partial(&self, raw: &JsonValue) -> SchemaCheck {
        self.run(raw, true)
    }

    fn run(&self, raw: &JsonValue, partial: bool) -> SchemaCheck {
        let Some(map) = raw.as_object() else {
            return SchemaCheck::Invalid(vec![FieldIssue::new(
                Vec::<String>::new(),
                "document root must be an object",
            )]);
        };

        let mut issues = Vec::new();
        let mut path = Vec::new();
        if partial {
            check_fields_partial(&self.fields, map, &mut path, &mut issues);
        } else {
            check_fields(&self.fields, map, &mut path, &mut issues);
        }

        if issues.is_empty() {
            SchemaCheck::Valid
        } else {
            SchemaCheck::Invalid(issues)
        }
    }
}

fn check_fields_partial(
    specs: &[FieldSpec],
    map: &serde_json::Map<String, JsonValue>,
    path: &mut Vec<String>,
    issues: &mut Vec<FieldIssue>,
) {
    for spec in specs {
        if let Some(value) = map.get(&spec.name) {
            if value.is_null() {
                continue;
            }
            path.push(spec.name.clone());
            // Nested objects inherit partial mode: only present fields are
            // checked, requiredness is suspended throughout.
            if let Some(nested) = value.as_object() {
                if spec.field_type == FieldType::Object {
                    check_fields_partial(&spec.fields, nested, path, issues);
                    path.pop();
                    continue;
                }
            }
            spec.check(value, path, issues);
            path.pop();
        }
    }
}

/// Standard schema shared by every list-backed domain collection: `config`
/// identity and attribution, `categories`, and `items` with the common
/// item base. Domain-specific item fields are intentionally undeclared.
pub fn standard_list_schema(name: impl Into<String>) -> ListSchema {
    let item_spec = FieldSpec::object(
        "items",
        vec![
            FieldSpec::text("id").required().with_min_length(1),
            FieldSpec::text("category_id"),
            FieldSpec::text("item_name").required().with_min_length(1),
            FieldSpec::text("item_description"),
            FieldSpec::boolean("is_custom").required(),
            FieldSpec::boolean("is_checked").required(),
            FieldSpec::boolean("is_disabled").required(),
        ],
    );

    let category_spec = FieldSpec::object(
        "categories",
        vec![
            FieldSpec::text("id").required().with_min_length(1),
            FieldSpec::text("name").required().with_min_length(1),
            FieldSpec::integer("sort_order"),
        ],
    );

    let config_spec = FieldSpec::object(
        "config",
        vec![
            FieldSpec::text("id").required().with_min_length(1),
            FieldSpec::text("name").required(),
            FieldSpec::text("list_type").required().with_min_length(1),
            FieldSpec::text("source").required(),
            FieldSpec::integer("version").required(),
            FieldSpec::text("created_by"),
            FieldSpec::text("updated_by"),
            FieldSpec::timestamp("created_at").required(),
            FieldSpec::timestamp("updated_at").required(),
            FieldSpec::integer("total_categories").required(),
            FieldSpec::integer("total_items").required(),
        ],
    )
    .required();

    ListSchema::new(
        name,
        vec![
            config_spec,
            FieldSpec::array_of("categories", category_spec).required(),
            FieldSpec::array_of("items", item_spec).required(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn person_schema() -> ListSchema {
        ListSchema::new(
            "person",
            vec![
                FieldSpec::text("name").required().with_min_length(1),
                FieldSpec::integer("age"),
                FieldSpec::object(
                    "address",
                    vec![FieldSpec::text("city").required()],
                ),
                FieldSpec::array_of("tags", FieldSpec::text("tag").with_max_length(8)),
            ],
        )
    }

    #[test]
    fn valid_document_passes() {
        let check = person_schema().safe_validate(&json!({
            "name": "Ana",
            "age": 34,
            "address": { "city": "Lisbon" },
            "tags": ["wedding"]
        }));
        assert!(check.is_valid());
    }

    #[test]
    fn unknown_fields_are_allowed() {
        let check = person_schema().safe_validate(&json!({
            "name": "Ana",
            "favorite_lens": "85mm"
        }));
        assert!(check.is_valid());
    }

    #[test]
    fn collects_every_issue_with_dotted_paths() {
        let check = person_schema().safe_validate(&json!({
            "age": "not a number",
            "address": {},
            "tags": ["short", "waaaay too long"]
        }));
        let issues = check.issues();
        let paths: Vec<String> = issues.iter().map(|i| i.dotted_path()).collect();
        assert!(paths.contains(&"name".to_string()));
        assert!(paths.contains(&"age".to_string()));
        assert!(paths.contains(&"address.city".to_string()));
        assert!(paths.contains(&"tags.1".to_string()));
    }

    #[test]
    fn non_object_root_is_one_issue() {
        let check = person_schema().safe_validate(&json!([1, 2, 3]));
        assert_eq!(check.issues().len(), 1);
    }

    #[test]
    fn partial_mode_skips_missing_but_checks_present() {
        let schema = person_schema();
        assert!(schema.safe_validate_partial(&json!({})).is_valid());
        assert!(schema.safe_validate_partial(&json!({ "age": 30 })).is_valid());

        let check = schema.safe_validate_partial(&json!({ "age": "x" }));
        assert!(!check.is_valid());

        // Nested required fields are also suspended in partial mode.
        assert!(schema
            .safe_validate_partial(&json!({ "address": {} }))
            .is_valid());
    }

    #[test]
    fn timestamp_fields_require_rfc3339() {
        let schema = ListSchema::new(
            "stamped",
            vec![FieldSpec::timestamp("created_at").required()],
        );
        assert!(schema
            .safe_validate(&json!({ "created_at": "2026-08-05T10:00:00Z" }))
            .is_valid());
        assert!(!schema
            .safe_validate(&json!({ "created_at": 1754388000 }))
            .is_valid());
    }

    #[test]
    fn standard_list_schema_accepts_minimal_list() {
        let schema = standard_list_schema("tasks");
        let check = schema.safe_validate(&json!({
            "config": {
                "id": "cfg-1",
                "name": "Tasks",
                "list_type": "tasks",
                "source": "master",
                "version": 1,
                "created_at": "2026-08-05T10:00:00Z",
                "updated_at": "2026-08-05T10:00:00Z",
                "total_categories": 0,
                "total_items": 0
            },
            "categories": [],
            "items": []
        }));
        assert!(check.is_valid(), "issues: {:?}", check.issues());
    }
}
