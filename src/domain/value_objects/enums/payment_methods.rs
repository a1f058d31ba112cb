use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bitcoin,
    Paypal,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Bitcoin => "bitcoin",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Stripe => "stripe",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "bitcoin" => Some(PaymentMethod::Bitcoin),
            "paypal" => Some(PaymentMethod::Paypal),
            "stripe" => Some(PaymentMethod::Stripe),
            _ => None,
        }
    }

    /// Stable numeric code used by stored orders.
    pub fn code(&self) -> i16 {
        match self {
            PaymentMethod::Bitcoin => 0,
            PaymentMethod::Paypal => 1,
            PaymentMethod::Stripe => 2,
        }
    }

    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(PaymentMethod::Bitcoin),
            1 => Some(PaymentMethod::Paypal),
            2 => Some(PaymentMethod::Stripe),
            _ => None,
        }
    }

    pub fn currency(&self) -> &'static str {
        match self {
            PaymentMethod::Bitcoin => "BTC",
            PaymentMethod::Paypal | PaymentMethod::Stripe => "€",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
