//! Field validation and translation of failures into client-facing errors.

use crate::models::api_response::ValidationError;

/// A single failed rule on a single input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    field: String,
    rule: String,
    param: Option<String>,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
            param: None,
        }
    }

    #[cfg(test)]
    pub fn with_param(mut self, param: impl Into<String>) -> Self {
        self.param = Some(param.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn param(&self) -> &str {
        self.param.as_deref().unwrap_or("")
    }
}

/// Types that can check their own fields.
pub trait Validate {
    /// Returns every violation found, in field declaration order.
    fn validate(&self) -> Vec<FieldViolation>;
}

/// Record a `required` violation for `field` when `value` is blank.
pub fn require(violations: &mut Vec<FieldViolation>, field: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(FieldViolation::new(field, "required"));
    }
}

enum Template {
    Fixed(&'static str),
    /// Prefix followed by the rule parameter.
    Param(&'static str),
}

const RULE_TEMPLATES: &[(&str, Template)] = &[
    ("required", Template::Fixed("Required")),
    ("numeric", Template::Fixed("accepted:format=number")),
    ("email", Template::Fixed("accepted:format=email")),
    ("gt", Template::Param("accepted:gt=")),
    ("gte", Template::Param("accepted:gte=")),
    ("lt", Template::Param("accepted:lt=")),
    ("lte", Template::Param("accepted:lte=")),
    ("min", Template::Param("accepted:min=")),
    ("max", Template::Param("accepted:max=")),
    ("len", Template::Param("accepted:len=")),
    ("eq", Template::Param("accepted:eq=")),
    ("dateformat", Template::Fixed("accepted:format=YYYY-MM-DD")),
    ("oneof", Template::Param("accepted:value=")),
];

fn rule_message(violation: &FieldViolation) -> String {
    let rule = violation.rule();
    match RULE_TEMPLATES.iter().find(|(name, _)| *name == rule) {
        Some((_, Template::Fixed(text))) => (*text).to_string(),
        Some((_, Template::Param(prefix))) => format!("{prefix}{}", violation.param()),
        None => rule.to_string(),
    }
}

/// Human-readable message for one violation.
pub fn format_message(violation: &FieldViolation) -> String {
    format!(
        "Parameter {} {} field",
        to_snake_case(violation.field()),
        rule_message(violation)
    )
}

/// Translate violations one-to-one, preserving order.
pub fn translate(violations: &[FieldViolation]) -> Vec<ValidationError> {
    violations
        .iter()
        .map(|violation| ValidationError {
            message: format_message(violation),
            parameter: to_snake_case(violation.field()),
        })
        .collect()
}

/// Convert a camelCase / PascalCase identifier to snake_case.
///
/// A run of capitals is kept together as one word, so `DocumentID` becomes
/// `document_id` and `HTTPServer` becomes `http_server`.
pub fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }

        out.extend(c.to_lowercase());
    }

    if out.ends_with('_') {
        out.pop();
    }
    out
}
