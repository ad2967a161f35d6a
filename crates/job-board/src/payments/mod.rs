//! Job activation by card charge or pre-purchased token.

pub mod gateway;
pub mod service;

pub use gateway::{
    ChargeReceipt, ChargeRequest, PaymentError, PaymentGateway, StripeCredentials, StripeGateway,
};
pub use service::{ChargeError, Payments, CURRENCY};
