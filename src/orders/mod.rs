mod lookup;
mod order;

pub use lookup::{is_valid_barcode, placeholder_order, LookupError, OrderLookup, Resolution};
pub use order::{CustomerInfo, Order, OrderItem, OrderPriority, OrderStatus};
