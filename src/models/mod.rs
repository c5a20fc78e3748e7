pub mod alert;
pub mod subscription;
pub mod trigger;

pub use alert::{Alert, AlertUpdate};
pub use subscription::{PushSubscription, SubscriptionKeys};
pub use trigger::{DeliveredNotification, TriggerEvent};
