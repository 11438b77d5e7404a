use serde::{Deserialize, Serialize, Serializer};

/// Table a system's raw status tokens are interpreted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusDomain {
    /// Short tokens returned by the batched vendor portals.
    #[default]
    Generic,
    /// Free-text `RESPONSE_MESSAGE` values returned by the per-employee service.
    DeactivationMessage,
}

/// Human-readable status category shown in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalStatus {
    NotAvailable,
    Deactivated,
    Error,
    Unknown,
    UserNotPresent,
    UserDeactivated,
    UserDeactivatedSuccessfully,
    UnknownResponse,
}

impl CanonicalStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NotAvailable => "Not Available",
            Self::Deactivated => "Employee is deactivated",
            Self::Error => "Status is showing error",
            Self::Unknown => "Unknown",
            Self::UserNotPresent => "User is not present",
            Self::UserDeactivated => "User is deactivated",
            Self::UserDeactivatedSuccessfully => "User deactivated successfully",
            Self::UnknownResponse => "Unknown Response",
        }
    }
}

impl Serialize for CanonicalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Raw status recorded by the per-employee adapter when its call for one employee fails.
/// It is not one of the service's messages, so it reads as an unknown response.
pub const REQUEST_FAILED_MARKER: &str = "error";

/// Map a raw upstream token onto its canonical category. Never fails.
///
/// Tokens match exactly; only invisible BOM and zero-width characters are ignored.
pub fn normalize(domain: StatusDomain, raw: &str) -> CanonicalStatus {
    let token = strip_invisible(raw);

    match domain {
        StatusDomain::Generic => match token.as_str() {
            "NA" => CanonicalStatus::NotAvailable,
            "deactivated" => CanonicalStatus::Deactivated,
            "error" => CanonicalStatus::Error,
            _ => CanonicalStatus::Unknown,
        },
        StatusDomain::DeactivationMessage => match token.as_str() {
            "User ID is not present" => CanonicalStatus::UserNotPresent,
            "User ID already Deactivated" => CanonicalStatus::UserDeactivated,
            "Deactivation successful" => CanonicalStatus::UserDeactivatedSuccessfully,
            _ => CanonicalStatus::UnknownResponse,
        },
    }
}

fn strip_invisible(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "")
}
