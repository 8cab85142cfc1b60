//! Barcode to order resolution with an explicit degraded path.
//!
//! A scan either confirms an order against the backend or, when the backend
//! cannot answer and the operator has opted in, synthesizes a deterministic
//! placeholder that is clearly labelled as such. The caller always sees which
//! of the two it got.

use std::sync::OnceLock;

use regex::Regex;
use reqwest::StatusCode;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::api::{ApiClient, ApiError};
use crate::orders::order::{CustomerInfo, Order, OrderItem, OrderPriority, OrderStatus};

/// Accepted barcode shape: alphanumeric head, then 3..=64 chars total
const BARCODE_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._-]{2,63}$";

static BARCODE_RE: OnceLock<Regex> = OnceLock::new();

fn barcode_regex() -> &'static Regex {
    BARCODE_RE.get_or_init(|| Regex::new(BARCODE_PATTERN).expect("barcode pattern is valid"))
}

/// Check a scanned payload against the accepted barcode shape
pub fn is_valid_barcode(code: &str) -> bool {
    barcode_regex().is_match(code)
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("'{0}' is not a valid order barcode")]
    InvalidBarcode(String),
    #[error("no order matches barcode '{0}'")]
    NotFound(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Outcome of a barcode resolution
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The backend confirmed this order
    Confirmed(Order),
    /// The backend could not answer; `order` is a local placeholder
    Degraded { order: Order, reason: String },
}

impl Resolution {
    pub fn order(&self) -> &Order {
        match self {
            Resolution::Confirmed(order) => order,
            Resolution::Degraded { order, .. } => order,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Resolution::Degraded { .. })
    }
}

pub struct OrderLookup {
    client: ApiClient,
    allow_degraded: bool,
}

impl OrderLookup {
    pub fn new(client: ApiClient, allow_degraded: bool) -> Self {
        Self {
            client,
            allow_degraded,
        }
    }

    /// Resolve a scanned barcode to an order.
    ///
    /// The code is validated locally before any network call. A 404 from the
    /// backend is authoritative and never degrades; only transport failures
    /// and server errors fall back to the placeholder, and only when
    /// `allow_degraded` is set.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, LookupError> {
        let code = code.trim();
        if !is_valid_barcode(code) {
            return Err(LookupError::InvalidBarcode(code.to_string()));
        }

        match self.client.order_by_barcode(code).await {
            Ok(order) => Ok(Resolution::Confirmed(order)),
            Err(ApiError::Http { status }) if status == StatusCode::NOT_FOUND => {
                Err(LookupError::NotFound(code.to_string()))
            }
            Err(err) if self.allow_degraded && is_degradable(&err) => {
                warn!(barcode = %code, error = %err, "order lookup degraded to local placeholder");
                Ok(Resolution::Degraded {
                    order: placeholder_order(code),
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(LookupError::Api(err)),
        }
    }
}

/// Failures where the backend could not answer, as opposed to answering "no"
fn is_degradable(err: &ApiError) -> bool {
    match err {
        ApiError::Unavailable(_) => true,
        ApiError::Http { status } => status.is_server_error(),
        ApiError::AuthRejected | ApiError::Decode(_) => false,
    }
}

/// Deterministic placeholder for a barcode the backend could not confirm.
///
/// The id is derived from the first eight hex digits of the code's SHA-256 so
/// repeated scans of the same barcode resume the same packout session.
pub fn placeholder_order(code: &str) -> Order {
    let digest = Sha256::digest(code.as_bytes());
    let id = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as i64;
    Order {
        id,
        order_number: code.to_string(),
        customer: CustomerInfo {
            name: "Unknown (offline lookup)".to_string(),
            email: None,
        },
        items: vec![OrderItem {
            sku: "UNVERIFIED".to_string(),
            name: "Scanned package contents".to_string(),
            quantity: 1,
        }],
        status: OrderStatus::Pending,
        priority: OrderPriority::Normal,
    }
}
