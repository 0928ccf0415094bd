//! Market-data tools: quotes, historical prices, and the standard
//! moving-average / RSI computations over caller-supplied series.

use crate::http::fetch_json;
use chrono::NaiveDate;
use fathom_core::config::{Credentials, MarketCredentials};
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
        ToolSpec::new("get_quote", "Fetch the latest quote for a ticker symbol")
            .with_param(ParamSpec::required("symbol", ParamType::String, "Ticker symbol, e.g. AAPL")),
        Arc::new(GetQuote {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "get_historical_prices",
            "Fetch daily closing prices for a symbol over a date range",
        )
        .with_param(ParamSpec::required("symbol", ParamType::String, "Ticker symbol"))
        .with_param(ParamSpec::required("from", ParamType::String, "Range start, YYYY-MM-DD"))
        .with_param(ParamSpec::required("to", ParamType::String, "Range end, YYYY-MM-DD")),
        Arc::new(GetHistoricalPrices {
            http: http.clone(),
            creds: creds.clone(),
        }),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "calculate_sma",
            "Simple moving average over a numeric series; returns one value per full window",
        )
        .with_param(ParamSpec::required("values", ParamType::List, "Numeric series, oldest first"))
        .with_param(ParamSpec::optional(
            "period",
            ParamType::Number,
            "Window length",
            Some(json!(20)),
        )),
        Arc::new(CalculateSma),
    ))?;

    registry.register(ToolDefinition::new(
        ToolSpec::new(
            "calculate_rsi",
            "Relative strength index (Wilder smoothing) over a numeric series",
        )
        .with_param(ParamSpec::required("values", ParamType::List, "Numeric series, oldest first"))
        .with_param(ParamSpec::optional(
            "period",
            ParamType::Number,
            "Lookback length",
            Some(json!(14)),
        )),
        Arc::new(CalculateRsi),
    ))?;

    Ok(())
}

fn market_creds(creds: &Credentials) -> Result<&MarketCredentials, HandlerError> {
    creds.market.as_ref().ok_or_else(|| {
        HandlerError::Unavailable(
            "market data credentials not configured; set FATHOM_MARKET_API_KEY and FATHOM_MARKET_BASE_URL"
                .to_string(),
        )
    })
}

fn endpoint(base: &str, path: &str) -> Result<Url, HandlerError> {
    let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined)
        .map_err(|e| HandlerError::Internal(anyhow::anyhow!("bad market base URL: {e}")))
}

struct GetQuote {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for GetQuote {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let market = market_creds(&self.creds)?;
        let symbol = args.str("symbol").unwrap_or_default().to_uppercase();

        let mut url = endpoint(&market.base_url, "v1/quote")?;
        url.query_pairs_mut().append_pair("symbol", &symbol);

        fetch_json(self.http.get(url).bearer_auth(&market.api_key)).await
    }
}

struct GetHistoricalPrices {
    http: reqwest::Client,
    creds: Arc<Credentials>,
}

#[async_trait::async_trait]
impl Handler for GetHistoricalPrices {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let market = market_creds(&self.creds)?;
        let symbol = args.str("symbol").unwrap_or_default().to_uppercase();
        let from = parse_date(args.str("from").unwrap_or_default(), "from")?;
        let to = parse_date(args.str("to").unwrap_or_default(), "to")?;
        if from > to {
            return Err(HandlerError::Rejected(format!(
                "date range is inverted: {from} is after {to}"
            )));
        }

        let mut url = endpoint(&market.base_url, "v1/historical")?;
        url.query_pairs_mut()
            .append_pair("symbol", &symbol)
            .append_pair("from", &from.to_string())
            .append_pair("to", &to.to_string());

        fetch_json(self.http.get(url).bearer_auth(&market.api_key)).await
    }
}

fn parse_date(raw: &str, name: &str) -> Result<NaiveDate, HandlerError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        HandlerError::Rejected(format!("{name} must be a YYYY-MM-DD date, got {raw:?}"))
    })
}

struct CalculateSma;

#[async_trait::async_trait]
impl Handler for CalculateSma {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let values = numeric_series(&args)?;
        let period = window(&args, values.len())?;
        Ok(json!({
            "period": period,
            "sma": sma(&values, period),
        }))
    }
}

struct CalculateRsi;

#[async_trait::async_trait]
impl Handler for CalculateRsi {
    async fn call(&self, args: ValidatedArgs) -> Result<Value, HandlerError> {
        let values = numeric_series(&args)?;
        let period = window(&args, values.len().saturating_sub(1))?;
        Ok(json!({
            "period": period,
            "rsi": rsi(&values, period),
        }))
    }
}

fn numeric_series(args: &ValidatedArgs) -> Result<Vec<f64>, HandlerError> {
    let list = args
        .list("values")
        .ok_or_else(|| HandlerError::Rejected("values must be a list of numbers".to_string()))?;
    list.iter()
        .map(|v| {
            v.as_f64().ok_or_else(|| {
                HandlerError::Rejected(format!("values must contain only numbers, got {v}"))
            })
        })
        .collect()
}

/// Resolve the `period` argument and check it against the available data.
fn window(args: &ValidatedArgs, available: usize) -> Result<usize, HandlerError> {
    let raw = args.f64("period").unwrap_or(0.0);
    if raw < 1.0 || raw.fract() != 0.0 {
        return Err(HandlerError::Rejected(format!(
            "period must be a positive integer, got {raw}"
        )));
    }
    let period = raw as usize;
    if period > available {
        return Err(HandlerError::Rejected(format!(
            "period {period} exceeds the {available} usable data points supplied"
        )));
    }
    Ok(period)
}

/// One mean per full window: output length is `len - period + 1`.
fn sma(values: &[f64], period: usize) -> Vec<f64> {
    values
        .windows(period)
        .map(|w| w.iter().sum::<f64>() / period as f64)
        .collect()
}

/// Wilder-smoothed RSI; needs `period + 1` points for the first reading.
fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let deltas: Vec<f64> = values.windows(2).map(|w| w[1] - w[0]).collect();

    let mut avg_gain = deltas[..period].iter().filter(|d| **d > 0.0).sum::<f64>() / period as f64;
    let mut avg_loss = -deltas[..period].iter().filter(|d| **d < 0.0).sum::<f64>() / period as f64;

    let mut out = Vec::with_capacity(deltas.len() - period + 1);
    out.push(rsi_point(avg_gain, avg_loss));

    for delta in &deltas[period..] {
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out.push(rsi_point(avg_gain, avg_loss));
    }
    out
}

fn rsi_point(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_core::validate;

    fn sma_spec() -> ToolSpec {
        ToolSpec::new("calculate_sma", "test")
            .with_param(ParamSpec::required("values", ParamType::List, "series"))
            .with_param(ParamSpec::optional("period", ParamType::Number, "window", Some(json!(20))))
    }

    fn args(raw: Value) -> ValidatedArgs {
        validate(&sma_spec(), &raw).unwrap()
    }

    #[tokio::test]
    async fn test_sma_output_length() {
        let values: Vec<f64> = (1..=25).map(|v| v as f64).collect();
        let result = CalculateSma
            .call(args(json!({"values": values, "period": 20})))
            .await
            .unwrap();

        // 25 points with a 20-wide window leaves 25 - 20 + 1 readings.
        assert_eq!(result["sma"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_sma_exact_window() {
        let values: Vec<f64> = vec![2.0; 20];
        let result = CalculateSma
            .call(args(json!({"values": values, "period": 20})))
            .await
            .unwrap();

        let series = result["sma"].as_array().unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].as_f64().unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_sma_insufficient_data_is_domain_error() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let err = CalculateSma
            .call(args(json!({"values": values, "period": 20})))
            .await
            .unwrap_err();

        assert!(matches!(err, HandlerError::Rejected(_)));
        assert!(err.to_string().contains("period 20"));
    }

    #[tokio::test]
    async fn test_sma_rejects_non_numeric_values() {
        let err = CalculateSma
            .call(args(json!({"values": [1.0, "two", 3.0], "period": 2})))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_sma_rejects_fractional_period() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let err = CalculateSma
            .call(args(json!({"values": values, "period": 2.5})))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));
    }

    #[test]
    fn test_rsi_bounds_and_length() {
        let values: Vec<f64> = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let series = rsi(&values, 14);

        // 19 deltas, 14-period smoothing: 19 - 14 + 1 readings.
        assert_eq!(series.len(), 6);
        for point in &series {
            assert!((0.0..=100.0).contains(point));
        }
    }

    #[test]
    fn test_rsi_all_gains_pegs_at_100() {
        let values: Vec<f64> = (1..=10).map(|v| v as f64).collect();
        let series = rsi(&values, 5);
        assert!(series.iter().all(|p| *p == 100.0));
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        assert!(parse_date("2024-01-15", "from").is_ok());
        assert!(parse_date("15/01/2024", "from").is_err());
        assert!(parse_date("yesterday", "to").is_err());
    }

    #[test]
    fn test_endpoint_joins_cleanly() {
        let url = endpoint("https://api.market.test/", "v1/quote").unwrap();
        assert_eq!(url.as_str(), "https://api.market.test/v1/quote");
    }
}
