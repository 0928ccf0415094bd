//! Reddit tools over the public JSON listings. Keyless, but Reddit throttles
//! anonymous default user agents hard, so the configured one is always sent.

use crate::http::fetch_json;
use fathom_core::config::Credentials;
use fathom_core::{
    Handler, HandlerError, ParamSpec, ParamType, RegistryError, ToolDefinition, ToolRegistry,
    ToolSpec, ValidatedArgs,
};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

const LISTINGS: &[&str] = &["hot", "new", "top", "rising"];
const SORTS: &[&str] = &["relevance", "hot", "new", "top", "comments"];
const MAX_LIMIT: u64 = 100;

pub fn register(
    registry: &mut ToolRegistry,
    http: &reqwest::Client,
    creds: &Arc<Credentials>,
) -> Result<(), RegistryError> {
    registry.register(ToolDefinition::new(
        ToolSpec::new("get_subreddit_posts", "Fetch a subreddit listing")
            .with_param(ParamSpec::required("subreddit", ParamType::String, "Subreddit name, without r/"))
            .with_param(ParamSpec::optional(
                "listing",
                ParamType::String,
                "One of hot, new, top, rising",
                Some(json!("hot")),
            ))
            .with_param(ParamSpec::optional(
                "limit",
                ParamType::Number,
                "Number of posts, at most 100",
                Some(json!(10)),
            )),
        Arc::new(GetSubredditPosts {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new("search_posts", "Search Reddit posts")
            .with_param(ParamSpec::required("query", ParamType::String, "Search phrase"))
            .with_param(ParamSpec::optional(
                "subreddit",
                ParamType::String,
                "Restrict the search to one subreddit",
                None,
            ))
            .with_param(ParamSpec::optional(
                "sort",
                ParamType::String,
                "One of relevance, hot, new, top, comments",
                Some(json!("relevance")),
            ))
            .with_param(ParamSpec::optional(
                "limit",
                ParamType::Number,
                "Number of posts, at most 100",
                Some(json!(10)),
            )),
        Arc::new(SearchPosts {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    Ok(())
}

struct GetSubredditPosts {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for GetSubredditPosts {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let social = &self.creds.social;
        let subreddit = validate_subreddit(args.str("subreddit").unwrap_or_default())?;
        let listing = args.str("listing").unwrap_or("hot");
        if !LISTINGS.contains(&listing) {
            return Err(HandlerError::Rejected(format!(
                "listing must be one of {LISTINGS:?}, got {listing:?}"
            )));
        }

        let url = listing_url(&social.base_url, &subreddit, listing, clamp_limit(&args))?;
        let body = fetch_json(
            self.http
                .get(url)
                .header(reqwest::header::USER_AGENT, &social.user_agent),
        )
        .await?;
        Ok(flatten_listing(&body))
    }
}

struct SearchPosts {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for SearchPosts {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let social = &self.creds.social;
        let sort = args.str("sort").unwrap_or("relevance");
        if !SORTS.contains(&sort) {
            return Err(HandlerError::Rejected(format!(
                "sort must be one of {SORTS:?}, got {sort:?}"
            )));
        }
        let subreddit = match args.str("subreddit") {
            Some(name) => Some(validate_subreddit(name)?),
            None => None,
        };

        let url = search_url(
            &social.base_url,
            args.str("query").unwrap_or_default(),
            subreddit.as_deref(),
            sort,
            clamp_limit(&args),
        )?;
        let body = fetch_json(
            self.http
                .get(url)
                .header(reqwest::header::USER_AGENT, &social.user_agent),
        )
        .await?;
        Ok(flatten_listing(&body))
    }
}

fn clamp_limit(args: &ValidatedArgs) -> u64 {
    (args.f64("limit").unwrap_or(10.0).max(1.0) as u64).min(MAX_LIMIT)
}

fn validate_subreddit(raw: &str) -> Result<String, HandlerError> {
    let name = raw.trim().trim_start_matches("r/");
    let valid = !name.is_empty()
        && name.len() <= 21
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(HandlerError::Rejected(format!(
            "not a valid subreddit name: {raw:?}"
        )));
    }
    Ok(name.to_string())
}

fn listing_url(base: &str, subreddit: &str, listing: &str, limit: u64) -> Result<Url, HandlerError> {
    let joined = format!("{}/r/{subreddit}/{listing}.json", base.trim_end_matches('/'));
    let mut url = Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad reddit base URL: {e}")))?;
    url.query_pairs_mut().append_pair("limit", &limit.to_string());
    Ok(url)
}

fn search_url(
    base: &str,
    query: &str,
    subreddit: Option<&str>,
    sort: &str,
    limit: u64,
) -> Result<Url, HandlerError> {
    let joined = match subreddit {
        Some(name) => format!("{}/r/{name}/search.json", base.trim_end_matches('/')),
        None => format!("{}/search.json", base.trim_end_matches('/')),
    };
    let mut url = Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad reddit base URL: {e}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("q", query);
        pairs.append_pair("sort", sort);
        pairs.append_pair("limit", &limit.to_string());
        if subreddit.is_some() {
            pairs.append_pair("restrict_sr", "1");
        }
    }
    Ok(url)
}

/// Strip the listing payload down to the fields agents actually use.
fn flatten_listing(body: &Value) -> Value {
    let posts: Vec<Value> = body["data"]["children"]
        .as_array()
        .map(|children| {
            children
                .iter()
                .map(|child| {
                    let d = &child["data"];
                    json!({
                        "id": d["id"],
                        "subreddit": d["subreddit"],
                        "title": d["title"],
                        "author": d["author"],
                        "score": d["score"],
                        "num_comments": d["num_comments"],
                        "created_utc": d["created_utc"],
                        "url": d["url"],
                        "selftext": d["selftext"],
                        "permalink": d["permalink"],
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({ "posts": posts })
}
