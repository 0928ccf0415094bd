//! SEC EDGAR tools: full-text search and per-company filing history.
//!
//! EDGAR needs no API key, but the SEC rejects requests without a
//! descriptive User-Agent, so every request carries the configured one.

use crate::http::fetch_json;
use fathom_core::config::Credentials;
use fathom_core::{
    Handler, HandlerError, ParamSpec, ParamType, RegistryError, ToolDefinition, ToolRegistry,
    ToolSpec, ValidatedArgs,
};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

pub fn register(
    registry: &mut ToolRegistry,
    http: &reqwest::Client,
    creds: &Arc<Credentials>,
) -> Result<(), RegistryError> {
    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "search_filings",
            "Full-text search across SEC EDGAR filings",
        )
        .with_param(ParamSpec::required("query", ParamType::String, "Search phrase"))
        .with_param(ParamSpec::optional(
            "form_type",
            ParamType::String,
            "Restrict to a form type, e.g. 10-K or 8-K",
            None,
        ))
        .with_param(ParamSpec::optional(
            "limit",
            ParamType::Number,
            "Maximum hits to return",
            Some(json!(10)),
        )),
        Arc::new(SearchFilings {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "get_company_filings",
            "Recent filings for one company from the EDGAR submissions API",
        )
        .with_param(ParamSpec::required("cik", ParamType::String, "Company CIK number"))
        .with_param(ParamSpec::optional(
            "form_type",
            ParamType::String,
            "Restrict to a form type",
            None,
        ))
        .with_param(ParamSpec::optional(
            "limit",
            ParamType::Number,
            "Maximum filings to return",
            Some(json!(10)),
        )),
        Arc::new(GetCompanyFilings {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    Ok(())
}

struct SearchFilings {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for SearchFilings {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let filings = &self.creds.filings;
        let url = search_url(
            &filings.search_base_url,
            args.str("query").unwrap_or_default(),
            args.str("form_type"),
        )?;

        let body = fetch_json(
            self.http
                .get(url)
                .header(reqwest::header::USER_AGENT, &filings.user_agent),
        )
        .await?;

        let limit = args.f64("limit").unwrap_or(10.0).max(0.0) as usize;
        Ok(trim_hits(body, limit))
    }
}

fn search_url(base: &str, query: &str, form_type: Option<&str>) -> Result<Url, HandlerError> {
    let joined = format!("{}/search-index", base.trim_end_matches('/'));
    let mut url = Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad EDGAR search URL: {e}")))?;
    url.query_pairs_mut().append_pair("q", query);
    if let Some(form) = form_type {
        url.query_pairs_mut().append_pair("forms", form);
    }
    Ok(url)
}

/// The full-text search API has its own paging; cut the hit list down to the
/// caller's limit without touching the rest of the payload.
fn trim_hits(mut body: Value, limit: usize) -> Value {
    if let Some(hits) = body
        .get_mut("hits")
        .and_then(|h| h.get_mut("hits"))
        .and_then(Value::as_array_mut)
    {
        hits.truncate(limit);
    }
    body
}

struct GetCompanyFilings {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for GetCompanyFilings {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let filings = &self.creds.filings;
        let cik = normalize_cik(args.str("cik").unwrap_or_default())?;
        let url = submissions_url(&filings.submissions_base_url, &cik)?;

        let body = fetch_json(
            self.http
                .get(url)
                .header(reqwest::header::USER_AGENT, &filings.user_agent),
        )
        .await?;

        let limit = args.f64("limit").unwrap_or(10.0).max(0.0) as usize;
        Ok(recent_filings(&body, args.str("form_type"), limit))
    }
}

/// CIKs are zero-padded to ten digits in the submissions API.
fn normalize_cik(raw: &str) -> Result<String, HandlerError> {
    let digits = raw.trim().trim_start_matches("CIK");
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) || digits.len() > 10 {
        return Err(HandlerError::Rejected(format!(
            "cik must be a number of at most ten digits, got {raw:?}"
        )));
    }
    Ok(format!("{digits:0>10}"))
}

fn submissions_url(base: &str, cik: &str) -> Result<Url, HandlerError> {
    let joined = format!("{}/submissions/CIK{cik}.json", base.trim_end_matches('/'));
    Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad EDGAR submissions URL: {e}")))
}

/// The submissions payload is column-oriented; pivot the recent-filings
/// block into one object per filing and apply the form filter and limit.
fn recent_filings(body: &Value, form_type: Option<&str>, limit: usize) -> Value {
    let recent = &body["filings"]["recent"];
    let column = |name: &str| recent[name].as_array().cloned().unwrap_or_default();

    let forms = column("form");
    let dates = column("filingDate");
    let accessions = column("accessionNumber");
    let documents = column("primaryDocument");

    let mut out = Vec::new();
    for i in 0..forms.len() {
        if out.len() >= limit {
            break;
        }
        let form = forms[i].as_str().unwrap_or_default();
        if let Some(wanted) = form_type {
            if !form.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        out.push(json!({
            "form": form,
            "filing_date": dates.get(i).cloned().unwrap_or(Value::Null),
            "accession_number": accessions.get(i).cloned().unwrap_or(Value::Null),
            "primary_document": documents.get(i).cloned().unwrap_or(Value::Null),
        }));
    }

    json!({
        "name": body.get("name").cloned().unwrap_or(Value::Null),
        "cik": body.get("cik").cloned().unwrap_or(Value::Null),
        "filings": out,
    })
}
