use std::collections::BTreeMap;

use serde::Deserialize;

use crate::workflows::offboarding::domain::SystemId;
use crate::workflows::offboarding::normalizer::StatusDomain;

/// Everything needed to talk to one downstream system. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemDescriptor {
    pub id: SystemId,
    /// Column header used in the report.
    pub label: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub status_domain: StatusDomain,
    pub request: RequestShape,
}

/// How requests are built and where the status sits in the response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestShape {
    /// One call for the whole roster; status at
    /// `employeeDetails[].systemResult.<result_key>.status`.
    Batched {
        result_key: String,
        /// Wraps the employee list under this key instead of sending a bare array.
        #[serde(default)]
        envelope: Option<String>,
    },
    /// One call per employee; status at
    /// `services.<service_key>.records[0].data[0].RESPONSE_MESSAGE`.
    PerEmployee { service_key: String },
}

impl SystemDescriptor {
    pub fn batched(id: &str, label: &str, url: &str, result_key: &str) -> Self {
        Self {
            id: SystemId::from(id),
            label: label.to_string(),
            url: url.to_string(),
            headers: default_headers(),
            status_domain: StatusDomain::Generic,
            request: RequestShape::Batched {
                result_key: result_key.to_string(),
                envelope: None,
            },
        }
    }

    pub fn per_employee(id: &str, label: &str, url: &str, service_key: &str) -> Self {
        Self {
            id: SystemId::from(id),
            label: label.to_string(),
            url: url.to_string(),
            headers: default_headers(),
            status_domain: StatusDomain::DeactivationMessage,
            request: RequestShape::PerEmployee {
                service_key: service_key.to_string(),
            },
        }
    }

    pub fn with_envelope(mut self, envelope: &str) -> Self {
        if let RequestShape::Batched { envelope: slot, .. } = &mut self.request {
            *slot = Some(envelope.to_string());
        }
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

fn default_headers() -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), "application/json".to_string());
    headers
}
