//! CRM tools against a generic contacts REST API.
//!
//! The mutating tools do no idempotency tracking: a create retried after a
//! timeout can duplicate the contact upstream. The tool descriptions say so,
//! because the caller is the only party who can decide to retry.

use crate::http::fetch_json;
use fathom_core::config::{Credentials, CrmCredentials};
use fathom_core::{
    Handler, HandlerError, ParamSpec, ParamType, RegistryError, ToolDefinition, ToolRegistry,
    ToolSpec, ValidatedArgs,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use url::Url;

pub fn register(
    registry: &mut ToolRegistry,
    http: &reqwest::Client,
    creds: &Arc<Credentials>,
) -> Result<(), RegistryError> {
    registry.register(ToolDefinition::new(
        ToolSpec::new("list_contacts", "List CRM contacts, paged")
            .with_param(ParamSpec::optional(
                "limit",
                ParamType::Number,
                "Page size",
                Some(json!(25)),
            ))
            .with_param(ParamSpec::optional(
                "offset",
                ParamType::Number,
                "Rows to skip",
                Some(json!(0)),
            )),
        Arc::new(ListContacts {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new("get_contact", "Fetch one CRM contact by id")
            .with_param(ParamSpec::required("id", ParamType::String, "Contact id")),
        Arc::new(GetContact {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "create_contact",
            "Create a CRM contact. Not idempotent: retrying after a timeout may duplicate the contact",
        )
        .with_param(ParamSpec::required("name", ParamType::String, "Full name"))
        .with_param(ParamSpec::required("email", ParamType::String, "Email address"))
        .with_param(ParamSpec::optional("phone", ParamType::String, "Phone number", None))
        .with_param(ParamSpec::optional("company", ParamType::String, "Company name", None)),
        Arc::new(CreateContact {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "update_contact",
            "Update fields on an existing CRM contact. Not idempotent across retries",
        )
        .with_param(ParamSpec::required("id", ParamType::String, "Contact id"))
        .with_param(ParamSpec::required(
            "fields",
            ParamType::Mapping,
            "Field name to new value",
        )),
        Arc::new(UpdateContact {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    Ok(())
}

fn crm_creds(creds: &Credentials) -> Result<&CrmCredentials, HandlerError> {
    creds.crm.as_ref().ok_or_else(|| {
        HandlerError::Unavailable(
            "CRM credentials not configured; set FATHOM_CRM_BASE_URL and FATHOM_CRM_API_TOKEN"
                .to_string(),
        )
    })
}

fn contacts_url(base: &str, id: Option<&str>) -> Result<Url, HandlerError> {
    let joined = match id {
        Some(id) => format!("{}/contacts/{id}", base.trim_end_matches('/')),
        None => format!("{}/contacts", base.trim_end_matches('/')),
    };
    Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad CRM base URL: {e}")))
}

/// Contact ids travel in the URL path; keep them to one path segment.
fn validate_id(raw: &str) -> Result<&str, HandlerError> {
    let id = raw.trim();
    if id.is_empty() || id.contains('/') || id.contains('?') || id.contains('#') {
        return Err(HandlerError::Rejected(format!("not a valid contact id: {raw:?}")));
    }
    Ok(id)
}

struct ListContacts {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for ListContacts {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let crm = crm_creds(&self.creds)?;
        let mut url = contacts_url(&crm.base_url, None)?;
        url.query_pairs_mut()
            .append_pair("limit", &(args.f64("limit").unwrap_or(25.0).max(1.0) as u64).to_string())
            .append_pair("offset", &(args.f64("offset").unwrap_or(0.0).max(0.0) as u64).to_string());

        fetch_json(self.http.get(url).bearer_auth(&crm.api_token)).await
    }
}

struct GetContact {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for GetContact {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let crm = crm_creds(&self.creds)?;
        let id = validate_id(args.str("id").unwrap_or_default())?;
        let url = contacts_url(&crm.base_url, Some(id))?;

        fetch_json(self.http.get(url).bearer_auth(&crm.api_token)).await
    }
}

struct CreateContact {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for CreateContact {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let crm = crm_creds(&self.creds)?;
        let payload = contact_payload(&args)?;
        let url = contacts_url(&crm.base_url, None)?;

        fetch_json(self.http.post(url).bearer_auth(&crm.api_token).json(&payload)).await
    }
}

fn contact_payload(args: &ValidatedArgs) -> Result<Value, HandlerError> {
    let email = args.str("email").unwrap_or_default();
    if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
        return Err(HandlerError::Rejected(format!(
            "email does not look like an address: {email:?}"
        )));
    }

    let mut payload = Map::new();
    payload.insert("name".to_string(), json!(args.str("name").unwrap_or_default()));
    payload.insert("email".to_string(), json!(email));
    if let Some(phone) = args.str("phone") {
        payload.insert("phone".to_string(), json!(phone));
    }
    if let Some(company) = args.str("company") {
        payload.insert("company".to_string(), json!(company));
    }
    Ok(Value::Object(payload))
}

struct UpdateContact {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for UpdateContact {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let crm = crm_creds(&self.creds)?;
        let id = validate_id(args.str("id").unwrap_or_default())?;
        let fields = args
            .mapping("fields")
            .filter(|m| !m.is_empty())
            .ok_or_else(|| HandlerError::Rejected("fields must be a non-empty object".to_string()))?
            .clone();
        let url = contacts_url(&crm.base_url, Some(id))?;

        fetch_json(
            self.http
                .patch(url)
                .bearer_auth(&crm.api_token)
                .json(&Value::Object(fields)),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_core::validate;

    #[test]
    fn test_contacts_url_shapes() {
        assert_eq!(
            contacts_url("https://crm.test/api/", None).unwrap().as_str(),
            "https://crm.test/api/contacts"
        );
        assert_eq!(
            contacts_url("https://crm.test/api", Some("c-42")).unwrap().as_str(),
            "https://crm.test/api/contacts/c-42"
        );
    }

    #[test]
    fn test_validate_id_rejects_path_breakouts() {
        assert!(validate_id("c-42").is_ok());
        assert!(validate_id("").is_err());
        assert!(validate_id("c-42/archive").is_err());
        assert!(validate_id("c-42?admin=1").is_err());
    }

    #[test]
    fn test_contact_payload_shape() {
        let spec = ToolSpec::new("create_contact", "test")
            .with_param(ParamSpec::required("name", ParamType::String, "name"))
            .with_param(ParamSpec::required("email", ParamType::String, "email"))
            .with_param(ParamSpec::optional("phone", ParamType::String, "phone", None))
            .with_param(ParamSpec::optional("company", ParamType::String, "company", None));

        let args = validate(
            &spec,
            &json!({"name": "Ada Lovelace", "email": "ada@example.com", "company": "Analytical"}),
        )
        .unwrap();
        let payload = contact_payload(&args).unwrap();

        assert_eq!(
            payload,
            json!({"name": "Ada Lovelace", "email": "ada@example.com", "company": "Analytical"})
        );

        let args = validate(&spec, &json!({"name": "Ada", "email": "not-an-email"})).unwrap();
        assert!(matches!(contact_payload(&args), Err(HandlerError::Rejected(_))));
    }
}
