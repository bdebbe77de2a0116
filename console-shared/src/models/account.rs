use serde::{Deserialize, Serialize};

/// The authenticated account as returned by `GET /api/account`.
///
/// Every field is optional on the wire; servers routinely return trimmed records and the
/// store keeps exactly what it was given.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Account {
    /// Numeric account identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,

    /// Login name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,

    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    /// Email address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Whether the account has been activated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<bool>,

    /// Avatar location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Preferred language key (e.g. `en`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang_key: Option<String>,

    /// Granted authorities such as `ROLE_ADMIN`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorities: Vec<String>,

    /// Who created the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    /// Creation timestamp as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,

    /// Who last modified the account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_by: Option<String>,

    /// Last modification timestamp as sent by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified_date: Option<String>,
}

impl Account {
    /// Best human-readable label: full name, then login, then email.
    #[must_use]
    pub fn display_name(&self) -> Option<String> {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !full_name.is_empty() {
            return Some(full_name);
        }

        self.login.clone().or_else(|| self.email.clone())
    }

    /// Returns `true` when the account carries the named authority.
    #[must_use]
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|granted| granted == authority)
    }
}
