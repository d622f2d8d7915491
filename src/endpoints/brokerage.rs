//! Alpaca trading account endpoints: positions, orders, order placement.

use axum::http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::proxy::{
    provider_url, Context, Endpoint, EndpointRequest, Provider, ProxyError, Step, UpstreamFailure,
    UpstreamRequest,
};

const ORDER_SIDES: &[&str] = &["buy", "sell"];
const ORDER_TYPES: &[&str] = &["market", "limit", "stop", "stop_limit"];

const DEFAULT_ORDER_LIMIT: u32 = 100;
const MAX_ORDER_LIMIT: u32 = 500;

/// GET /positions, passed through unchanged.
pub struct Positions;

impl Endpoint for Positions {
    const NAME: &'static str = "positions";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = Value;
    type Output = Value;

    fn validate(_request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self)
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(&ctx.config.upstreams.alpaca_trading, &["v2", "positions"])?;
        Ok(UpstreamRequest::get(Provider::Alpaca, url).alpaca_keys(keys))
    }

    fn normalize(self, positions: Value) -> Result<Value, ProxyError> {
        Ok(positions)
    }
}

/// GET /orders with status, direction and a clamped limit.
pub struct Orders {
    status: String,
    direction: String,
    limit: u32,
}

#[derive(Debug, Serialize)]
pub struct OrdersOutput {
    pub orders: Vec<Value>,
    pub count: usize,
}

impl Endpoint for Orders {
    const NAME: &'static str = "orders";
    const METHODS: &'static [Method] = &[Method::GET];

    type Payload = Value;
    type Output = OrdersOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            status: request.param("status").unwrap_or("all").to_string(),
            direction: request.param("direction").unwrap_or("desc").to_string(),
            limit: request.limit_param("limit", DEFAULT_ORDER_LIMIT, MAX_ORDER_LIMIT),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(&ctx.config.upstreams.alpaca_trading, &["v2", "orders"])?;
        Ok(UpstreamRequest::get(Provider::Alpaca, url)
            .alpaca_keys(keys)
            .query("status", &self.status)
            .query("direction", &self.direction)
            .query("limit", &self.limit.to_string()))
    }

    fn normalize(self, payload: Value) -> Result<OrdersOutput, ProxyError> {
        let Value::Array(orders) = payload else {
            return Err(ProxyError::unexpected(
                "Unexpected upstream payload: orders is not an array",
            ));
        };
        Ok(OrdersOutput {
            count: orders.len(),
            orders,
        })
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough_with_message()
    }
}

/// POST /trade: submit one order.
#[derive(Debug)]
pub struct Trade {
    order: Map<String, Value>,
}

/// Order summary returned to the caller; Alpaca reports numbers as strings.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OrderSummary {
    pub id: Value,
    pub status: Value,
    pub symbol: Value,
    pub qty: Value,
    pub filled_qty: Value,
    pub side: Value,
    #[serde(rename = "type")]
    pub order_type: Value,
    pub time_in_force: Value,
    pub limit_price: Value,
    pub stop_price: Value,
    pub created_at: Value,
}

impl Endpoint for Trade {
    const NAME: &'static str = "trade";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = OrderSummary;
    type Output = OrderSummary;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let [symbol, qty, side, order_type, time_in_force] = request.require_body_strs(
            ["symbol", "qty", "side", "type", "time_in_force"],
            "Missing required fields: symbol, qty, side, type, time_in_force",
        )?;

        if !ORDER_SIDES.contains(&side.as_str()) {
            return Err(ProxyError::invalid("side must be buy or sell"));
        }
        if !ORDER_TYPES.contains(&order_type.as_str()) {
            return Err(ProxyError::invalid(
                "type must be market, limit, stop, or stop_limit",
            ));
        }

        let mut order = Map::new();
        order.insert("symbol".into(), json!(symbol.to_uppercase()));
        order.insert("qty".into(), json!(qty));
        order.insert("side".into(), json!(side));
        order.insert("type".into(), json!(order_type));
        order.insert("time_in_force".into(), json!(time_in_force));
        for field in ["limit_price", "stop_price"] {
            if let Some(price) = request.body_str(field) {
                order.insert(field.into(), json!(price));
            }
        }
        Ok(Self { order })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let keys = ctx.credentials.alpaca()?;
        let url = provider_url(&ctx.config.upstreams.alpaca_trading, &["v2", "orders"])?;
        Ok(UpstreamRequest::post(Provider::Alpaca, url)
            .alpaca_keys(keys)
            .json(Value::Object(self.order.clone())))
    }

    fn normalize(self, order: OrderSummary) -> Result<OrderSummary, ProxyError> {
        Ok(order)
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough_with_message()
    }
}
