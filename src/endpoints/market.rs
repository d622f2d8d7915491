//! Market data endpoints: quotes, snapshots, search, bars, crypto prices.
//!
//! Alpaca and Twelve Data quotes both normalize to [`QuoteSnapshot`] so the
//! frontend can switch providers without changing its parsing.

use axum::http::Method;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::proxy::normalize::{loose_number, parse_number_or_null, percent_change};
use crate::proxy::{
    provider_url, CacheHint, Context, Endpoint, EndpointRequest, Provider, ProxyError, Step,
    UpstreamFailure, UpstreamRequest,
};

/// Longest symbol accepted by Alpaca and Yahoo lookups.
const SYMBOL_MAX_LEN: usize = 10;
/// Twelve Data symbols may carry an exchange or pair suffix.
const TWELVE_SYMBOL_MAX_LEN: usize = 20;
/// Browser-like agent; Yahoo rejects generic clients.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Common quote shape shared by every quote provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteSnapshot {
    pub symbol: String,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub last: Option<f64>,
    pub volume: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub open: Option<f64>,
}

// ---------------------------------------------------------------------------
// GET /quote (Alpaca snapshot)
// ---------------------------------------------------------------------------

pub struct Quote {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlpacaSnapshot {
    symbol: Option<String>,
    latest_quote: Option<AlpacaQuote>,
    latest_trade: Option<AlpacaTrade>,
    daily_bar: Option<AlpacaBar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlpacaQuote {
    bp: Option<f64>,
    ap: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlpacaTrade {
    p: Option<f64>,
    t: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlpacaBar {
    t: Option<String>,
    o: Option<f64>,
    h: Option<f64>,
    l: Option<f64>,
    c: Option<f64>,
    v: Option<f64>,
    vw: Option<f64>,
}

impl Endpoint for Quote {
    const NAME: &'static str = "quote";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = AlpacaSnapshot;
    type Output = QuoteSnapshot;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            symbol: request.symbol("symbol", SYMBOL_MAX_LEN)?,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(
            &ctx.config.upstreams.alpaca_data,
            &["v2", "stocks", &self.symbol, "snapshot"],
        )?;
        Ok(UpstreamRequest::get(Provider::Alpaca, url).alpaca_keys(keys))
    }

    fn normalize(self, snapshot: AlpacaSnapshot) -> Result<QuoteSnapshot, ProxyError> {
        let quote = snapshot.latest_quote.unwrap_or_default();
        let trade = snapshot.latest_trade.unwrap_or_default();
        let bar = snapshot.daily_bar.unwrap_or_default();
        Ok(QuoteSnapshot {
            symbol: snapshot.symbol.unwrap_or(self.symbol),
            bid: quote.bp,
            ask: quote.ap,
            last: trade.p,
            volume: bar.v,
            high: bar.h,
            low: bar.l,
            open: bar.o,
        })
    }
}

// ---------------------------------------------------------------------------
// GET /quote-twelve (Twelve Data, mapped to the Alpaca shape)
// ---------------------------------------------------------------------------

pub struct QuoteTwelve {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TwelveQuote {
    code: Option<i64>,
    message: Option<String>,
    symbol: Option<String>,
    #[serde(deserialize_with = "loose_number")]
    close: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    volume: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    high: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    low: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    open: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    change: Option<f64>,
    #[serde(deserialize_with = "loose_number")]
    percent_change: Option<f64>,
    timestamp: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct TwelveQuoteOutput {
    #[serde(flatten)]
    pub quote: QuoteSnapshot,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
    pub timestamp: Option<Value>,
}

/// Twelve Data reports errors in-band with HTTP 200.
fn twelve_data_error(code: Option<i64>, message: Option<String>) -> Result<(), ProxyError> {
    match code {
        Some(code) if code != 200 => Err(ProxyError::invalid(
            message.unwrap_or_else(|| "Invalid symbol".to_string()),
        )),
        _ => Ok(()),
    }
}

impl Endpoint for QuoteTwelve {
    const NAME: &'static str = "quote_twelve";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = TwelveQuote;
    type Output = TwelveQuoteOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            symbol: request.symbol("symbol", TWELVE_SYMBOL_MAX_LEN)?,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let key = ctx.credentials.twelve_data()?;
        let url = provider_url(&ctx.config.upstreams.twelve_data, &["quote"])?;
        Ok(UpstreamRequest::get(Provider::TwelveData, url)
            .query("symbol", &self.symbol)
            .query("apikey", key))
    }

    fn normalize(self, data: TwelveQuote) -> Result<TwelveQuoteOutput, ProxyError> {
        twelve_data_error(data.code, data.message)?;
        // No real-time bid/ask from Twelve Data; close stands in for both.
        Ok(TwelveQuoteOutput {
            quote: QuoteSnapshot {
                symbol: data.symbol.unwrap_or(self.symbol),
                bid: data.close,
                ask: data.close,
                last: data.close,
                volume: data.volume,
                high: data.high,
                low: data.low,
                open: data.open,
            },
            change: data.change,
            percent_change: data.percent_change,
            timestamp: data.timestamp.filter(|t| !t.is_null()),
        })
    }
}

// ---------------------------------------------------------------------------
// GET /stock/{symbol} (Yahoo chart meta)
// ---------------------------------------------------------------------------

pub struct StockSnapshot {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YahooChartResult {
    meta: Option<YahooMeta>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct YahooMeta {
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_volume: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct StockEnvelope {
    pub stock: Stock,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: Option<f64>,
    pub market_cap: Option<f64>,
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0 && v.is_finite())
}

impl StockSnapshot {
    fn not_found(&self) -> ProxyError {
        ProxyError::not_found(format!("Symbol \"{}\" not found", self.symbol))
    }
}

impl Endpoint for StockSnapshot {
    const NAME: &'static str = "stock";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(60, None));

    type Payload = YahooChartResponse;
    type Output = StockEnvelope;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            symbol: request.symbol("symbol", SYMBOL_MAX_LEN)?,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let url = provider_url(
            &ctx.config.upstreams.yahoo,
            &["v8", "finance", "chart", &self.symbol],
        )?;
        Ok(UpstreamRequest::get(Provider::Yahoo, url)
            .query("interval", "1d")
            .query("range", "1d")
            .header("user-agent", BROWSER_USER_AGENT))
    }

    fn normalize(self, data: YahooChartResponse) -> Result<StockEnvelope, ProxyError> {
        let meta = data
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.meta)
            .ok_or_else(|| self.not_found())?;

        let price = nonzero(meta.regular_market_price).unwrap_or(0.0);
        let previous_close = nonzero(meta.chart_previous_close)
            .or(nonzero(meta.previous_close))
            .unwrap_or(price);
        let change = price - previous_close;

        let name = [meta.short_name, meta.long_name]
            .into_iter()
            .flatten()
            .find(|n| !n.is_empty())
            .unwrap_or_else(|| self.symbol.clone());

        Ok(StockEnvelope {
            stock: Stock {
                symbol: self.symbol,
                name,
                price,
                change,
                change_percent: percent_change(price, previous_close),
                volume: meta.regular_market_volume,
                market_cap: meta.market_cap,
            },
        })
    }

    fn upstream_failure(&self, _step: Step, _failure: UpstreamFailure) -> ProxyError {
        self.not_found()
    }
}

// ---------------------------------------------------------------------------
// GET /stock/search (Yahoo search, equities and ETFs only)
// ---------------------------------------------------------------------------

pub struct StockSearch {
    query: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct YahooSearchResponse {
    quotes: Vec<YahooSearchQuote>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct YahooSearchQuote {
    symbol: Option<String>,
    #[serde(rename = "shortname")]
    short_name: Option<String>,
    #[serde(rename = "longname")]
    long_name: Option<String>,
    exch_disp: Option<String>,
    exchange: Option<String>,
    quote_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

const MAX_SEARCH_RESULTS: usize = 6;

impl Endpoint for StockSearch {
    const NAME: &'static str = "stock_search";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(300, None));

    type Payload = YahooSearchResponse;
    type Output = SearchResults;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            query: request.require_param("q", "Query required")?.to_string(),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let url = provider_url(&ctx.config.upstreams.yahoo, &["v1", "finance", "search"])?;
        Ok(UpstreamRequest::get(Provider::Yahoo, url)
            .query("q", &self.query)
            .query("quotesCount", "8")
            .query("newsCount", "0")
            .query("enableFuzzyQuery", "false")
            .header("user-agent", BROWSER_USER_AGENT))
    }

    fn normalize(self, data: YahooSearchResponse) -> Result<SearchResults, ProxyError> {
        let results = data
            .quotes
            .into_iter()
            .filter(|q| matches!(q.quote_type.as_deref(), Some("EQUITY") | Some("ETF")))
            .take(MAX_SEARCH_RESULTS)
            .map(|q| SearchResult {
                symbol: q.symbol,
                name: q.short_name.or(q.long_name),
                exchange: q.exch_disp.or(q.exchange),
                kind: q.quote_type,
            })
            .collect();
        Ok(SearchResults { results })
    }
}

// ---------------------------------------------------------------------------
// GET /bars (Alpaca historical bars, frontend field names)
// ---------------------------------------------------------------------------

pub struct Bars {
    symbol: String,
    timeframe: String,
    limit: String,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlpacaBars {
    bars: Option<Vec<AlpacaBar>>,
    symbol: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BarsOutput {
    pub bars: Vec<FrontendBar>,
    pub symbol: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrontendBar {
    pub timestamp: Option<String>,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub close_price: Option<f64>,
    pub volume: Option<f64>,
}

impl Endpoint for Bars {
    const NAME: &'static str = "bars";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = AlpacaBars;
    type Output = BarsOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let limit = request.param("limit").unwrap_or("1000");
        if limit.parse::<u32>().map_or(true, |l| l == 0) {
            return Err(ProxyError::invalid("limit must be a positive integer"));
        }
        Ok(Self {
            symbol: request.symbol("symbol", SYMBOL_MAX_LEN)?,
            timeframe: request.param("timeframe").unwrap_or("1Day").to_string(),
            limit: limit.to_string(),
            start: request.param("start").map(str::to_string),
            end: request.param("end").map(str::to_string),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(
            &ctx.config.upstreams.alpaca_data,
            &["v2", "stocks", &self.symbol, "bars"],
        )?;
        let mut request = UpstreamRequest::get(Provider::Alpaca, url)
            .alpaca_keys(keys)
            .query("timeframe", &self.timeframe)
            .query("limit", &self.limit)
            .query("adjustment", "split")
            .query("feed", "sip")
            .query("sort", "asc");
        if let Some(start) = &self.start {
            request = request.query("start", start);
        }
        if let Some(end) = &self.end {
            request = request.query("end", end);
        }
        Ok(request)
    }

    fn normalize(self, data: AlpacaBars) -> Result<BarsOutput, ProxyError> {
        let bars = data
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(|b| FrontendBar {
                timestamp: b.t,
                open_price: b.o,
                high_price: b.h,
                low_price: b.l,
                close_price: b.c,
                volume: b.v,
            })
            .collect();
        Ok(BarsOutput {
            bars,
            symbol: data.symbol.or(Some(self.symbol)),
        })
    }
}

// ---------------------------------------------------------------------------
// GET /history (Alpaca bars over a named period, for backtesting)
// ---------------------------------------------------------------------------

pub struct History {
    symbol: String,
    timeframe: &'static str,
    period: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

/// Frontend timeframe → Alpaca timeframe. Unknown values fall back to daily.
fn alpaca_timeframe(timeframe: &str) -> &'static str {
    match timeframe {
        "5m" => "5Min",
        "15m" => "15Min",
        "1H" => "1Hour",
        "4H" => "4Hour",
        _ => "1Day",
    }
}

/// Period label → days of history. Unknown values fall back to six months.
fn period_days(period: &str) -> i64 {
    match period {
        "1W" => 7,
        "1M" => 30,
        "3M" => 90,
        "1Y" => 365,
        "2Y" => 730,
        _ => 180,
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    pub symbol: String,
    pub timeframe: &'static str,
    pub period: String,
    pub bars: Vec<HistoryBar>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HistoryBar {
    pub date: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
    pub vwap: Option<f64>,
}

impl Endpoint for History {
    const NAME: &'static str = "history";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(300, Some(600)));

    type Payload = AlpacaBars;
    type Output = HistoryOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let symbol = request
            .require_param("symbol", "Symbol required")?
            .to_uppercase();
        if symbol.chars().count() > SYMBOL_MAX_LEN {
            return Err(ProxyError::invalid("Invalid symbol"));
        }
        let period = request.param("period").unwrap_or("6M").to_string();
        let end = Utc::now();
        let start = end - Duration::days(period_days(&period));
        Ok(Self {
            symbol,
            timeframe: alpaca_timeframe(request.param("timeframe").unwrap_or("1Day")),
            period,
            start,
            end,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(
            &ctx.config.upstreams.alpaca_data,
            &["v2", "stocks", &self.symbol, "bars"],
        )?;
        Ok(UpstreamRequest::get(Provider::Alpaca, url)
            .alpaca_keys(keys)
            .query("timeframe", self.timeframe)
            .query("start", &self.start.to_rfc3339_opts(SecondsFormat::Millis, true))
            .query("end", &self.end.to_rfc3339_opts(SecondsFormat::Millis, true))
            .query("limit", "10000")
            .query("feed", "sip"))
    }

    fn normalize(self, data: AlpacaBars) -> Result<HistoryOutput, ProxyError> {
        let bars: Vec<HistoryBar> = data
            .bars
            .unwrap_or_default()
            .into_iter()
            .map(|b| HistoryBar {
                timestamp: b
                    .t
                    .as_deref()
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.timestamp_millis()),
                date: b.t,
                open: b.o,
                high: b.h,
                low: b.l,
                close: b.c,
                volume: b.v,
                vwap: b.vw,
            })
            .collect();
        Ok(HistoryOutput {
            symbol: self.symbol,
            timeframe: self.timeframe,
            period: self.period,
            count: bars.len(),
            bars,
        })
    }
}

// ---------------------------------------------------------------------------
// GET /crypto/latest-price (Alpaca crypto trades)
// ---------------------------------------------------------------------------

pub struct CryptoLatestPrice {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AlpacaCryptoTrades {
    trades: std::collections::HashMap<String, AlpacaTrade>,
}

#[derive(Debug, Serialize)]
pub struct PriceOutput {
    pub symbol: String,
    pub price: f64,
    pub timestamp: Option<String>,
}

impl Endpoint for CryptoLatestPrice {
    const NAME: &'static str = "crypto_latest_price";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = AlpacaCryptoTrades;
    type Output = PriceOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            symbol: request
                .require_param("symbol", "symbol query parameter required")?
                .to_string(),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(
            &ctx.config.upstreams.alpaca_data,
            &["v1beta3", "crypto", "us", "latest", "trades"],
        )?;
        Ok(UpstreamRequest::get(Provider::Alpaca, url)
            .alpaca_keys(keys)
            .query("symbols", &self.symbol))
    }

    fn normalize(self, mut data: AlpacaCryptoTrades) -> Result<PriceOutput, ProxyError> {
        let trade = data.trades.remove(&self.symbol).unwrap_or_default();
        match nonzero(trade.p) {
            Some(price) => Ok(PriceOutput {
                symbol: self.symbol,
                price,
                timestamp: trade.t,
            }),
            None => Err(ProxyError::not_found("Price not found")),
        }
    }
}

// ---------------------------------------------------------------------------
// GET /crypto/twelve-data-price (Twelve Data /price)
// ---------------------------------------------------------------------------

pub struct TwelvePrice {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TwelvePricePayload {
    code: Option<i64>,
    message: Option<String>,
    price: Option<Value>,
}

impl Endpoint for TwelvePrice {
    const NAME: &'static str = "crypto_twelve_data_price";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = TwelvePricePayload;
    type Output = PriceOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            symbol: request
                .require_param("symbol", "symbol query parameter required")?
                .to_string(),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let key = ctx.credentials.twelve_data()?;
        let url = provider_url(&ctx.config.upstreams.twelve_data, &["price"])?;
        Ok(UpstreamRequest::get(Provider::TwelveData, url)
            .query("symbol", &self.symbol)
            .query("apikey", key))
    }

    fn normalize(self, data: TwelvePricePayload) -> Result<PriceOutput, ProxyError> {
        twelve_data_error(data.code, data.message)?;
        match parse_number_or_null(data.price.as_ref()).filter(|p| *p > 0.0) {
            Some(price) => Ok(PriceOutput {
                symbol: self.symbol,
                price,
                timestamp: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
            }),
            None => Err(ProxyError::not_found("Price not found or invalid")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(query: &str) -> EndpointRequest {
        EndpointRequest::new(Method::GET).with_query_string(Some(query))
    }

    #[test]
    fn test_alpaca_snapshot_mapping() {
        let quote = Quote::validate(&request("symbol=aapl")).unwrap();
        let snapshot: AlpacaSnapshot = serde_json::from_value(json!({
            "symbol": "AAPL",
            "latestQuote": { "bp": 189.5, "ap": 189.6, "bs": 3 },
            "latestTrade": { "p": 189.55 },
            "dailyBar": { "o": 187.0, "h": 190.1, "l": 186.2, "c": 189.4, "v": 51234567 }
        }))
        .unwrap();

        let out = serde_json::to_value(quote.normalize(snapshot).unwrap()).unwrap();
        assert_eq!(
            out,
            json!({
                "symbol": "AAPL", "bid": 189.5, "ask": 189.6, "last": 189.55,
                "volume": 51234567.0, "high": 190.1, "low": 186.2, "open": 187.0
            })
        );
    }

    #[test]
    fn test_alpaca_snapshot_missing_sections_are_null() {
        let quote = Quote::validate(&request("symbol=spy")).unwrap();
        let snapshot: AlpacaSnapshot = serde_json::from_value(json!({ "latestTrade": null })).unwrap();
        let out = quote.normalize(snapshot).unwrap();
        assert_eq!(out.symbol, "SPY");
        assert_eq!(out.bid, None);
        assert_eq!(out.last, None);
        assert_eq!(out.volume, None);
    }

    #[test]
    fn test_twelve_quote_maps_to_common_shape() {
        let endpoint = QuoteTwelve::validate(&request("symbol=eur/usd")).unwrap();
        let payload: TwelveQuote = serde_json::from_value(json!({
            "symbol": "EUR/USD", "close": "1.0842", "open": "1.0810", "high": "1.0850",
            "low": "1.0800", "volume": "0", "change": "0.0032", "percent_change": "0.29604",
            "timestamp": 1718000000
        }))
        .unwrap();
        let out = serde_json::to_value(endpoint.normalize(payload).unwrap()).unwrap();
        assert_eq!(out["symbol"], "EUR/USD");
        assert_eq!(out["bid"], json!(1.0842));
        assert_eq!(out["ask"], out["last"]);
        assert_eq!(out["volume"], Value::Null);
        assert_eq!(out["percent_change"], json!(0.29604));
        assert_eq!(out["timestamp"], json!(1718000000));
    }

    #[test]
    fn test_twelve_in_band_error() {
        let endpoint = QuoteTwelve::validate(&request("symbol=zzzz")).unwrap();
        let payload: TwelveQuote = serde_json::from_value(json!({
            "code": 404, "message": "symbol not found", "status": "error"
        }))
        .unwrap();
        let err = endpoint.normalize(payload).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidInput(m) if m == "symbol not found"));
    }

    #[test]
    fn test_stock_zero_previous_close_gives_zero_percent() {
        let endpoint = StockSnapshot::validate(&request("symbol=abc")).unwrap();
        let payload: YahooChartResponse = serde_json::from_value(json!({
            "chart": { "result": [{ "meta": {
                "regularMarketPrice": 0, "chartPreviousClose": 0, "previousClose": 0,
                "shortName": "ABC Corp"
            }}]}
        }))
        .unwrap();
        let out = endpoint.normalize(payload).unwrap();
        assert_eq!(out.stock.change_percent, 0.0);
        assert!(out.stock.change_percent.is_finite());
        assert_eq!(out.stock.change, 0.0);
        assert_eq!(out.stock.name, "ABC Corp");
    }

    #[test]
    fn test_stock_change_uses_chart_previous_close() {
        let endpoint = StockSnapshot::validate(&request("symbol=msft")).unwrap();
        let payload: YahooChartResponse = serde_json::from_value(json!({
            "chart": { "result": [{ "meta": {
                "regularMarketPrice": 110.0, "chartPreviousClose": 100.0, "previousClose": 50.0,
                "longName": "Microsoft Corporation", "regularMarketVolume": 1000
            }}]}
        }))
        .unwrap();
        let out = serde_json::to_value(endpoint.normalize(payload).unwrap()).unwrap();
        let stock = &out["stock"];
        assert_eq!(stock["symbol"], "MSFT");
        assert_eq!(stock["name"], "Microsoft Corporation");
        assert_eq!(stock["change"], json!(10.0));
        assert!((stock["changePercent"].as_f64().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(stock["marketCap"], Value::Null);
    }

    #[test]
    fn test_stock_without_meta_is_not_found() {
        let endpoint = StockSnapshot::validate(&request("symbol=nope")).unwrap();
        let payload: YahooChartResponse =
            serde_json::from_value(json!({ "chart": { "result": null, "error": {} } })).unwrap();
        let err = endpoint.normalize(payload).unwrap_err();
        assert!(matches!(err, ProxyError::NotFound(m) if m == "Symbol \"NOPE\" not found"));
    }

    #[test]
    fn test_search_filters_and_limits() {
        let endpoint = StockSearch::validate(&request("q=tes")).unwrap();
        let mut quotes = vec![json!({ "symbol": "TSLA.MX", "quoteType": "FUTURE" })];
        for i in 0..8 {
            quotes.push(json!({ "symbol": format!("T{i}"), "longname": "Long", "exchange": "NMS", "quoteType": "EQUITY" }));
        }
        let payload: YahooSearchResponse = serde_json::from_value(json!({ "quotes": quotes })).unwrap();
        let out = endpoint.normalize(payload).unwrap();
        assert_eq!(out.results.len(), 6);
        assert_eq!(out.results[0].symbol.as_deref(), Some("T0"));
        assert_eq!(out.results[0].name.as_deref(), Some("Long"));
        assert_eq!(out.results[0].exchange.as_deref(), Some("NMS"));
    }

    #[test]
    fn test_history_timeframe_and_period_mapping() {
        assert_eq!(alpaca_timeframe("15m"), "15Min");
        assert_eq!(alpaca_timeframe("weird"), "1Day");
        assert_eq!(period_days("1Y"), 365);
        assert_eq!(period_days(""), 180);

        let history = History::validate(&request("symbol=qqq&timeframe=1H&period=1W")).unwrap();
        assert_eq!(history.timeframe, "1Hour");
        assert_eq!((history.end - history.start).num_days(), 7);
        assert!(matches!(
            History::validate(&request("timeframe=1H")),
            Err(ProxyError::InvalidInput(m)) if m == "Symbol required"
        ));
    }

    #[test]
    fn test_history_bar_timestamps() {
        let history = History::validate(&request("symbol=qqq")).unwrap();
        let payload: AlpacaBars = serde_json::from_value(json!({
            "bars": [{ "t": "2024-01-02T05:00:00Z", "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10, "vw": 1.2 }]
        }))
        .unwrap();
        let out = history.normalize(payload).unwrap();
        assert_eq!(out.count, 1);
        assert_eq!(out.bars[0].timestamp, Some(1_704_171_600_000));
        assert_eq!(out.bars[0].date.as_deref(), Some("2024-01-02T05:00:00Z"));
    }

    #[test]
    fn test_crypto_price_missing_trade_is_not_found() {
        let endpoint = CryptoLatestPrice::validate(&request("symbol=BTC/USD")).unwrap();
        let payload: AlpacaCryptoTrades = serde_json::from_value(json!({ "trades": {} })).unwrap();
        assert!(matches!(endpoint.normalize(payload), Err(ProxyError::NotFound(_))));
    }

    #[test]
    fn test_twelve_price_rejects_non_positive() {
        let endpoint = TwelvePrice::validate(&request("symbol=BTC/USD")).unwrap();
        let payload: TwelvePricePayload = serde_json::from_value(json!({ "price": "-3" })).unwrap();
        assert!(matches!(endpoint.normalize(payload), Err(ProxyError::NotFound(_))));
    }
}
