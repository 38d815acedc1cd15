use serde::{Deserialize, Serialize};
use serde_json::Value;
use sitekit_shared::Result;

use super::{BlockRenderer, decode_props};
use crate::html::{escape, escape_attr};

/// Input control for a form field.
///
/// Unrecognised kinds render as a plain text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Textarea,
    Select,
    Checkbox,
}

impl From<String> for FieldKind {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "email" => Self::Email,
            "textarea" => Self::Textarea,
            "select" => Self::Select,
            "checkbox" => Self::Checkbox,
            _ => Self::Text,
        }
    }
}

impl From<FieldKind> for String {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => "text",
            FieldKind::Email => "email",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Checkbox => "checkbox",
        }
        .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_submit_text() -> String {
    "Submit".to_string()
}

fn default_success_message() -> String {
    "Thank you!".to_string()
}

/// Props of a `form` block; shared with submission handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormProps {
    #[serde(default)]
    pub form_type: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default = "default_submit_text")]
    pub submit_text: String,
    #[serde(default = "default_success_message")]
    pub success_message: String,
}

impl FormProps {
    pub fn from_props(props: &Value) -> Result<Self> {
        decode_props(props)
    }
}

const INPUT_CLASS: &str = "form-input w-full px-4 py-2 mb-4 border border-uan-border rounded-lg";

fn label_html(field: &FormField) -> String {
    let marker = if field.required {
        r#" <span class="required">*</span>"#
    } else {
        ""
    };
    format!(
        r#"<label class="block text-sm font-medium" for="field-{}">{}{marker}</label>"#,
        escape_attr(&field.name),
        escape(&field.label)
    )
}

fn field_html(field: &FormField) -> String {
    let name = escape_attr(&field.name);
    let required = if field.required { " required" } else { "" };

    match field.kind {
        FieldKind::Textarea => format!(
            r#"<div>{}<textarea id="field-{name}" name="{name}" rows="4" class="{INPUT_CLASS}"{required}></textarea></div>"#,
            label_html(field)
        ),
        FieldKind::Select => {
            let mut options = String::from(r#"<option value="">Select...</option>"#);
            for opt in &field.options {
                options.push_str(&format!(
                    r#"<option value="{}">{}</option>"#,
                    escape_attr(opt),
                    escape(opt)
                ));
            }
            format!(
                r#"<div>{}<select id="field-{name}" name="{name}" class="{INPUT_CLASS}"{required}>{options}</select></div>"#,
                label_html(field)
            )
        }
        FieldKind::Checkbox => format!(
            r#"<label class="flex items-center gap-2 mb-4"><input type="checkbox" name="{name}"{required}><span class="text-sm">{}</span></label>"#,
            escape(&field.label)
        ),
        FieldKind::Text | FieldKind::Email => format!(
            r#"<div>{}<input type="{}" id="field-{name}" name="{name}" class="{INPUT_CLASS}"{required}></div>"#,
            label_html(field),
            String::from(field.kind)
        ),
    }
}

/// Contact or newsletter form.
pub struct FormRenderer;

impl BlockRenderer for FormRenderer {
    fn render(&self, props: &Value) -> Result<String> {
        let props = FormProps::from_props(props)?;

        let mut html = format!(
            r#"<form class="block-form max-w-md mx-auto p-6" method="post" data-form-type="{}">"#,
            escape_attr(&props.form_type)
        );
        for field in &props.fields {
            html.push_str(&field_html(field));
        }
        html.push_str(&format!(
            r#"<button type="submit" class="btn btn-accent w-full">{}</button></form>"#,
            escape(&props.submit_text)
        ));
        Ok(html)
    }

    fn name(&self) -> &str {
        "form"
    }
}
