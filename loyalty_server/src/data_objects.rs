use chrono::{DateTime, Utc};
use loyalty_engine::{
    db_types::{Order, OrderStatusType, Withdrawal},
    traits::BalanceSummary,
};
use lpg_common::{Cents, CURRENCY_MINOR_UNITS};
use serde::{Deserialize, Serialize};

/// Renders minor units as a decimal number, e.g. 4205 as `42.05`.
pub fn as_decimal(value: Cents) -> f64 {
    value.value() as f64 / CURRENCY_MINOR_UNITS as f64
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub number: String,
    pub status: OrderStatusType,
    /// Only present once the order has been processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accrual: Option<f64>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let accrual = (order.status == OrderStatusType::Processed).then(|| as_decimal(order.accrual));
        Self { number: order.order_number.to_string(), status: order.status, accrual, uploaded_at: order.uploaded_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub current: f64,
    pub withdrawn: f64,
}

impl From<BalanceSummary> for BalanceResponse {
    fn from(summary: BalanceSummary) -> Self {
        Self { current: as_decimal(summary.current), withdrawn: as_decimal(summary.withdrawn) }
    }
}

/// The body of a withdrawal request. `sum` is kept as a raw JSON number so that it can be parsed exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    pub sum: serde_json::Number,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawalResponse {
    pub order: String,
    pub sum: f64,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalResponse {
    fn from(w: Withdrawal) -> Self {
        Self { order: w.order_number.to_string(), sum: as_decimal(w.sum), processed_at: w.processed_at }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: std::fmt::Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn minor_units_render_as_decimals() {
        assert_eq!(as_decimal(Cents::from(4205)), 42.05);
        assert_eq!(as_decimal(Cents::from(500)), 5.0);
        assert_eq!(as_decimal(Cents::from(0)), 0.0);
    }

    #[test]
    fn accrual_is_hidden_until_processed() {
        let now = Utc::now();
        let mut order = Order {
            id: 1,
            order_number: loyalty_engine::db_types::OrderNumber::new("12345678903"),
            user_id: 1,
            status: OrderStatusType::Processing,
            accrual: Cents::from(0),
            uploaded_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(OrderResponse::from(order.clone())).unwrap();
        assert!(json.get("accrual").is_none());
        assert_eq!(json["status"], "PROCESSING");
        order.status = OrderStatusType::Processed;
        order.accrual = Cents::from(72950);
        let json = serde_json::to_value(OrderResponse::from(order)).unwrap();
        assert_eq!(json["accrual"], 729.5);
        assert_eq!(json["number"], "12345678903");
    }
}
