//! The person a credential is issued to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::layout::{DocumentKind, SubjectField};

/// Default role printed on ID cards.
pub const DEFAULT_ROLE: &str = "VOLUNTEER";

/// Date format printed on every document, e.g. `07 Mar 2025`.
pub const ISSUE_DATE_FORMAT: &str = "%d %b %Y";

/// Everything the composer needs to fill a layout's subject-bound zones.
///
/// Subjects are caller-owned and read-only during composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialSubject {
    pub display_name: String,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub kind: DocumentKind,
    /// ID-card role line. Ignored by certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl CredentialSubject {
    pub fn new(
        kind: DocumentKind,
        display_name: impl Into<String>,
        identifier: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            identifier: identifier.into(),
            photo_url: None,
            issued_at,
            kind,
            role: None,
        }
    }

    pub fn with_photo_url(mut self, url: impl Into<String>) -> Self {
        self.photo_url = Some(url.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Text for a subject-bound zone. Blank values fall back to a
    /// placeholder so a document is never printed with a hole in it.
    pub fn field(&self, field: SubjectField) -> String {
        match field {
            SubjectField::DisplayName => non_blank(&self.display_name)
                .unwrap_or_else(|| placeholder_name(self.kind))
                .to_string(),
            SubjectField::Identifier => non_blank(&self.identifier).unwrap_or("N/A").to_string(),
            SubjectField::IssuedAt => self.issued_at.format(ISSUE_DATE_FORMAT).to_string(),
            SubjectField::Role => self
                .role
                .as_deref()
                .and_then(non_blank)
                .unwrap_or(DEFAULT_ROLE)
                .to_string(),
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn placeholder_name(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::IdCard => "Volunteer Name",
        DocumentKind::DonationCertificate => "Donor Name",
        DocumentKind::PatronCertificate => "Patron Name",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn issued() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 10, 30, 0).unwrap()
    }

    #[test]
    fn fields_render_subject_values() {
        let subject = CredentialSubject::new(DocumentKind::IdCard, "Asha Rao", "VVV-0042", issued())
            .with_role("Coordinator");

        assert_eq!(subject.field(SubjectField::DisplayName), "Asha Rao");
        assert_eq!(subject.field(SubjectField::Identifier), "VVV-0042");
        assert_eq!(subject.field(SubjectField::IssuedAt), "07 Mar 2025");
        assert_eq!(subject.field(SubjectField::Role), "Coordinator");
    }

    #[test]
    fn role_defaults_to_volunteer() {
        let subject = CredentialSubject::new(DocumentKind::IdCard, "Asha", "1", issued());
        assert_eq!(subject.field(SubjectField::Role), DEFAULT_ROLE);
        assert_eq!(
            subject.with_role("   ").field(SubjectField::Role),
            DEFAULT_ROLE
        );
    }

    #[test]
    fn blank_name_uses_kind_placeholder() {
        for (kind, expected) in [
            (DocumentKind::IdCard, "Volunteer Name"),
            (DocumentKind::DonationCertificate, "Donor Name"),
            (DocumentKind::PatronCertificate, "Patron Name"),
        ] {
            let subject = CredentialSubject::new(kind, "  ", "", issued());
            assert_eq!(subject.field(SubjectField::DisplayName), expected);
            assert_eq!(subject.field(SubjectField::Identifier), "N/A");
        }
    }

    #[test]
    fn values_are_trimmed() {
        let subject = CredentialSubject::new(DocumentKind::IdCard, "  A. Kumar ", " 7 ", issued());
        assert_eq!(subject.field(SubjectField::DisplayName), "A. Kumar");
        assert_eq!(subject.field(SubjectField::Identifier), "7");
    }

    #[test]
    fn deserializes_from_json_without_optional_fields() {
        let json = r#"{
            "display_name": "A. Kumar",
            "identifier": "DN-2025-001",
            "issued_at": "2025-03-07T00:00:00Z",
            "kind": "donation-certificate"
        }"#;
        let subject: CredentialSubject = serde_json::from_str(json).unwrap();
        assert_eq!(subject.kind, DocumentKind::DonationCertificate);
        assert_eq!(subject.photo_url, None);
        assert_eq!(subject.role, None);
    }
}
