//! Revenue values and their event property mapping.

use analytics_types::Properties;
use serde_json::Value;

pub const REVENUE_PRODUCT_ID: &str = "$productId";
pub const REVENUE_QUANTITY: &str = "$quantity";
pub const REVENUE_PRICE: &str = "$price";
pub const REVENUE_TYPE: &str = "$revenueType";
pub const REVENUE_RECEIPT: &str = "$receipt";
pub const REVENUE_RECEIPT_SIG: &str = "$receiptSig";
pub const REVENUE_AMOUNT: &str = "$revenue";

/// A purchase to be reported as a revenue event.
///
/// Only a price is required; quantity defaults to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Revenue {
    product_id: Option<String>,
    quantity: u32,
    price: Option<f64>,
    revenue_type: Option<String>,
    receipt: Option<String>,
    receipt_sig: Option<String>,
    revenue: Option<f64>,
    properties: Option<Properties>,
}

impl Default for Revenue {
    fn default() -> Self {
        Self {
            product_id: None,
            quantity: 1,
            price: None,
            revenue_type: None,
            receipt: None,
            receipt_sig: None,
            revenue: None,
            properties: None,
        }
    }
}

impl Revenue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_product_id(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    /// Zero quantities are ignored.
    pub fn set_quantity(mut self, quantity: u32) -> Self {
        if quantity > 0 {
            self.quantity = quantity;
        }
        self
    }

    pub fn set_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    pub fn set_revenue_type(mut self, revenue_type: impl Into<String>) -> Self {
        self.revenue_type = Some(revenue_type.into());
        self
    }

    pub fn set_receipt(mut self, receipt: impl Into<String>, receipt_sig: impl Into<String>) -> Self {
        self.receipt = Some(receipt.into());
        self.receipt_sig = Some(receipt_sig.into());
        self
    }

    pub fn set_revenue(mut self, revenue: f64) -> Self {
        self.revenue = Some(revenue);
        self
    }

    pub fn set_event_properties(mut self, properties: Properties) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn is_valid(&self) -> bool {
        self.price.is_some()
    }

    /// Custom properties merged with the reserved revenue fields.
    /// Reserved fields win over custom properties of the same name.
    pub fn event_properties(&self) -> Properties {
        let mut properties = self.properties.clone().unwrap_or_default();

        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                properties.insert(key.to_string(), value);
            }
        };
        put(REVENUE_PRODUCT_ID, self.product_id.clone().map(Value::from));
        put(REVENUE_QUANTITY, Some(Value::from(self.quantity)));
        put(REVENUE_PRICE, self.price.map(Value::from));
        put(REVENUE_TYPE, self.revenue_type.clone().map(Value::from));
        put(REVENUE_RECEIPT, self.receipt.clone().map(Value::from));
        put(REVENUE_RECEIPT_SIG, self.receipt_sig.clone().map(Value::from));
        put(REVENUE_AMOUNT, self.revenue.map(Value::from));

        properties
    }
}
