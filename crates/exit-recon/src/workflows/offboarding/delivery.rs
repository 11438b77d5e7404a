use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;

/// Message handed to the delivery collaborator once the artifact exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub recipients: BTreeSet<String>,
    pub subject: String,
    pub body: String,
    pub attachment_path: PathBuf,
}

/// Outbound hook (e-mail, file drop, ...) receiving the finished report.
#[async_trait]
pub trait ReportDelivery: Send + Sync {
    async fn send(&self, request: &DeliveryRequest) -> Result<(), DeliveryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no report recipients configured")]
    NoRecipients,
    #[error("delivery transport unavailable: {0}")]
    Transport(String),
}

/// Static delivery settings resolved from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverySettings {
    pub recipients: BTreeSet<String>,
    pub subject: String,
    pub body: String,
    /// Keep the artifact on disk after a successful delivery.
    pub keep_artifact: bool,
}

impl DeliverySettings {
    pub fn request_for(&self, attachment_path: PathBuf) -> DeliveryRequest {
        DeliveryRequest {
            recipients: self.recipients.clone(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachment_path,
        }
    }
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            recipients: BTreeSet::new(),
            subject: "Employee Exit Report".to_string(),
            body: "Please find the attached Employee Exit Report.".to_string(),
            keep_artifact: false,
        }
    }
}
