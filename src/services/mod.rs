pub mod finnhub;
pub mod price_feed;
pub mod push;
pub mod registration;
pub mod store;

pub mod notices;
pub mod validator;
pub mod reconciliation;
pub mod lifecycle;
