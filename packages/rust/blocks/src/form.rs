//! Form submission handling.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sitekit_shared::{Result, SiteKitError};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::html::escape;
use crate::renderers::{FieldKind, FormProps};

/// Confirmation for an accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub id: Uuid,
    pub form_type: String,
    pub submitted_at: DateTime<Utc>,
    pub message: String,
    pub values: BTreeMap<String, String>,
}

impl SubmissionReceipt {
    /// Success panel shown in place of the form.
    pub fn to_html(&self) -> String {
        format!(
            r#"<div class="form-success max-w-md mx-auto text-center py-12"><div class="text-4xl">✓</div><p class="text-xl">{}</p></div>"#,
            escape(&self.message)
        )
    }
}

/// A form block ready to accept values.
#[derive(Debug, Clone)]
pub struct FormSubmission {
    props: FormProps,
    latency: Duration,
}

impl FormSubmission {
    pub fn new(props: FormProps, latency: Duration) -> Self {
        Self { props, latency }
    }

    /// Build from a `form` block's raw props.
    pub fn from_props(props: &Value, latency: Duration) -> Result<Self> {
        Ok(Self::new(FormProps::from_props(props)?, latency))
    }

    pub fn props(&self) -> &FormProps {
        &self.props
    }

    /// Check values against the form's fields.
    ///
    /// Values for names the form doesn't declare are dropped.
    pub fn validate(&self, values: &BTreeMap<String, String>) -> Result<BTreeMap<String, String>> {
        let mut accepted = BTreeMap::new();
        let mut missing = Vec::new();

        for field in &self.props.fields {
            let value = values.get(&field.name).map(|v| v.trim()).unwrap_or("");
            if value.is_empty() {
                if field.required {
                    missing.push(field.name.as_str());
                }
                continue;
            }

            match field.kind {
                FieldKind::Email if !looks_like_email(value) => {
                    return Err(SiteKitError::validation(format!(
                        "field '{}' is not an email address",
                        field.name
                    )));
                }
                FieldKind::Select if !field.options.is_empty() && !field.options.iter().any(|o| o == value) => {
                    return Err(SiteKitError::validation(format!(
                        "field '{}' must be one of: {}",
                        field.name,
                        field.options.join(", ")
                    )));
                }
                _ => {}
            }
            accepted.insert(field.name.clone(), value.to_string());
        }

        if !missing.is_empty() {
            return Err(SiteKitError::validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Ok(accepted)
    }

    /// Validate, wait the configured latency, and confirm.
    #[instrument(skip(self, values), fields(form_type = %self.props.form_type))]
    pub async fn submit(&self, values: &BTreeMap<String, String>) -> Result<SubmissionReceipt> {
        let accepted = self.validate(values)?;
        info!(fields = ?accepted.keys().collect::<Vec<_>>(), "form submitted");

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        Ok(SubmissionReceipt {
            id: Uuid::now_v7(),
            form_type: self.props.form_type.clone(),
            submitted_at: Utc::now(),
            message: self.props.success_message.clone(),
            values: accepted,
        })
    }
}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
