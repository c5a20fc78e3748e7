use serde::Serialize;
use serde_json::json;

use crate::events::{EventBus, NOTICE_TOPIC};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub title: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<NoticeKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Notice {
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            kind: Some(NoticeKind::Error),
            id: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// User-visible toasts. Delivered to whatever UI listens on the `notice` topic.
#[derive(Clone)]
pub struct Notices {
    bus: EventBus,
}

impl Notices {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn show_notice(&self, notice: Notice) {
        tracing::info!(title = %notice.title, kind = ?notice.kind, "notice");
        self.bus.emit(NOTICE_TOPIC, json!(notice));
    }
}
