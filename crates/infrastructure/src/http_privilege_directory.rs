use async_trait::async_trait;
use labmesh_application::PrivilegeDirectory;
use labmesh_core::{AppError, AppResult};
use labmesh_domain::RoleCode;
use serde_json::Value;
use url::Url;

/// Placeholder substituted with the percent-encoded role code.
pub const ROLE_PLACEHOLDER: &str = "{role}";

/// HTTP implementation of the authoritative role-to-privileges directory.
///
/// Requests `GET <template with {role} substituted>` and reads the privilege
/// list from `data.privileges`, falling back to a top-level `privileges`.
/// Timeouts come from the configured client.
#[derive(Clone)]
pub struct HttpPrivilegeDirectory {
    http_client: reqwest::Client,
    url_template: String,
}

impl HttpPrivilegeDirectory {
    /// Creates a directory client for the given URL template.
    pub fn new(http_client: reqwest::Client, url_template: impl Into<String>) -> AppResult<Self> {
        let url_template = url_template.into();
        if !url_template.contains(ROLE_PLACEHOLDER) {
            return Err(AppError::Validation(format!(
                "privilege directory url template must contain '{ROLE_PLACEHOLDER}'"
            )));
        }

        let directory = Self {
            http_client,
            url_template,
        };
        directory.url_for("ROLE")?;

        Ok(directory)
    }

    fn url_for(&self, role: &str) -> AppResult<Url> {
        // byte_serialize renders spaces as '+'; a literal '+' is already %2B.
        let encoded = url::form_urlencoded::byte_serialize(role.as_bytes())
            .collect::<String>()
            .replace('+', "%20");
        let rendered = self.url_template.replace(ROLE_PLACEHOLDER, &encoded);

        Url::parse(&rendered).map_err(|error| {
            AppError::Validation(format!("invalid privilege directory url '{rendered}': {error}"))
        })
    }
}

#[async_trait]
impl PrivilegeDirectory for HttpPrivilegeDirectory {
    async fn fetch_privileges(&self, role: &RoleCode) -> AppResult<Vec<String>> {
        let url = self.url_for(role.as_str())?;
        let response = self.http_client.get(url).send().await.map_err(|error| {
            AppError::Unavailable(format!(
                "privilege directory request for role '{role}' failed: {error}"
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Unavailable(format!(
                "privilege directory returned status {status} for role '{role}'"
            )));
        }

        let body = response.json::<Value>().await.map_err(|error| {
            AppError::Internal(format!(
                "privilege directory returned a malformed body for role '{role}': {error}"
            ))
        })?;

        privileges_from_body(&body).map_err(|message| {
            AppError::Internal(format!(
                "privilege directory response for role '{role}' {message}"
            ))
        })
    }
}

fn privileges_from_body(body: &Value) -> Result<Vec<String>, String> {
    let privileges = body
        .pointer("/data/privileges")
        .filter(|value| value.is_array())
        .or_else(|| body.get("privileges"))
        .and_then(Value::as_array)
        .ok_or_else(|| "has no privileges array".to_owned())?;

    privileges
        .iter()
        .map(|value| {
            value
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| format!("has a non-string privilege {value}"))
        })
        .collect()
}
