//! # Domain Events
//!
//! Typed notifications fired after a state-changing action completes.
//!
//! Every event carries a payload; server-derived payloads may include a
//! `livelog` message for the accessibility log. Events are dispatched
//! synchronously by the [`EventBus`](crate::EventBus) and never queued.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Event discriminant, used as the subscription key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    PostCreated,
    PostUpdated,
    DiscussionCreated,
    DiscussionDeleted,
    PostDeleted,
    FormCanceled,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::PostCreated,
        EventKind::PostUpdated,
        EventKind::DiscussionCreated,
        EventKind::DiscussionDeleted,
        EventKind::PostDeleted,
        EventKind::FormCanceled,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::PostCreated => "post-created",
            EventKind::PostUpdated => "post-updated",
            EventKind::DiscussionCreated => "discussion-created",
            EventKind::DiscussionDeleted => "discussion-deleted",
            EventKind::PostDeleted => "post-deleted",
            EventKind::FormCanceled => "form-canceled",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Server response for a created or updated post or discussion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostPayload {
    #[serde(rename = "discussionid", deserialize_with = "lenient::id")]
    pub discussion_id: u64,

    #[serde(rename = "postid", deserialize_with = "lenient::id")]
    pub post_id: u64,

    /// Re-rendered discussion markup
    #[serde(default)]
    pub html: String,

    #[serde(
        rename = "notificationhtml",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_html: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub livelog: Option<String>,
}

/// Server response for a deleted post or discussion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeletedPayload {
    #[serde(
        rename = "discussionid",
        default,
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub discussion_id: Option<u64>,

    #[serde(
        rename = "postid",
        default,
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_id: Option<u64>,

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub html: Option<String>,

    /// Where to go when the current discussion no longer exists
    #[serde(
        rename = "redirecturl",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub redirect_url: Option<String>,

    #[serde(
        rename = "notificationhtml",
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_html: Option<String>,

    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub livelog: Option<String>,
}

/// Which discussion/post a canceled form belonged to
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanceledPayload {
    #[serde(
        rename = "discussionid",
        default,
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub discussion_id: Option<u64>,

    #[serde(
        rename = "postid",
        default,
        deserialize_with = "lenient::optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub post_id: Option<u64>,
}

/// A domain event with its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ForumEvent {
    PostCreated(PostPayload),
    PostUpdated(PostPayload),
    DiscussionCreated(PostPayload),
    DiscussionDeleted(DeletedPayload),
    PostDeleted(DeletedPayload),
    FormCanceled(CanceledPayload),
}

impl ForumEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ForumEvent::PostCreated(_) => EventKind::PostCreated,
            ForumEvent::PostUpdated(_) => EventKind::PostUpdated,
            ForumEvent::DiscussionCreated(_) => EventKind::DiscussionCreated,
            ForumEvent::DiscussionDeleted(_) => EventKind::DiscussionDeleted,
            ForumEvent::PostDeleted(_) => EventKind::PostDeleted,
            ForumEvent::FormCanceled(_) => EventKind::FormCanceled,
        }
    }

    /// Message for the accessibility log, if any
    pub fn livelog(&self) -> Option<&str> {
        match self {
            ForumEvent::PostCreated(p)
            | ForumEvent::PostUpdated(p)
            | ForumEvent::DiscussionCreated(p) => p.livelog.as_deref(),
            ForumEvent::DiscussionDeleted(p) | ForumEvent::PostDeleted(p) => p.livelog.as_deref(),
            ForumEvent::FormCanceled(_) => None,
        }
    }

    pub fn discussion_id(&self) -> Option<u64> {
        match self {
            ForumEvent::PostCreated(p)
            | ForumEvent::PostUpdated(p)
            | ForumEvent::DiscussionCreated(p) => Some(p.discussion_id),
            ForumEvent::DiscussionDeleted(p) | ForumEvent::PostDeleted(p) => p.discussion_id,
            ForumEvent::FormCanceled(p) => p.discussion_id,
        }
    }

    pub fn post_id(&self) -> Option<u64> {
        match self {
            ForumEvent::PostCreated(p)
            | ForumEvent::PostUpdated(p)
            | ForumEvent::DiscussionCreated(p) => Some(p.post_id),
            ForumEvent::DiscussionDeleted(p) | ForumEvent::PostDeleted(p) => p.post_id,
            ForumEvent::FormCanceled(p) => p.post_id,
        }
    }

    /// Markup for the notification area, if any
    pub fn notification_html(&self) -> Option<&str> {
        match self {
            ForumEvent::PostCreated(p)
            | ForumEvent::PostUpdated(p)
            | ForumEvent::DiscussionCreated(p) => p.notification_html.as_deref(),
            ForumEvent::DiscussionDeleted(p) | ForumEvent::PostDeleted(p) => {
                p.notification_html.as_deref()
            }
            ForumEvent::FormCanceled(_) => None,
        }
    }
}

/// Server responses send ids as numbers or numeric strings, and optional
/// text fields as `false` or `null` when absent.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn parse_id(value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        parse_id(&value).ok_or_else(|| D::Error::custom(format!("invalid id {value}")))
    }

    pub fn optional_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
        Ok(parse_id(&Value::deserialize(deserializer)?))
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Some(s)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(EventKind::name).collect();
        assert_eq!(
            names,
            vec![
                "post-created",
                "post-updated",
                "discussion-created",
                "discussion-deleted",
                "post-deleted",
                "form-canceled"
            ]
        );
    }

    #[test]
    fn test_deleted_payload_from_server_json() {
        let json = r#"{"discussionid": 4, "livelog": "Post deleted", "html": "<div></div>"}"#;
        let payload: DeletedPayload = serde_json::from_str(json).unwrap();

        let event = ForumEvent::PostDeleted(payload);
        assert_eq!(event.kind(), EventKind::PostDeleted);
        assert_eq!(event.livelog(), Some("Post deleted"));
        assert_eq!(event.discussion_id(), Some(4));
        assert_eq!(event.post_id(), None);
    }

    #[test]
    fn test_ids_given_as_strings() {
        let json = r#"{"discussionid": "1", "postid": " 11 ", "livelog": "Post deleted"}"#;
        let payload: DeletedPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.discussion_id, Some(1));
        assert_eq!(payload.post_id, Some(11));

        let json = r#"{"discussionid": "4", "postid": 9, "html": ""}"#;
        let payload: PostPayload = serde_json::from_str(json).unwrap();
        assert_eq!((payload.discussion_id, payload.post_id), (4, 9));
    }

    #[test]
    fn test_non_string_text_is_absent() {
        let json = r#"{"discussionid": 1, "livelog": false, "notificationhtml": null, "postid": "x"}"#;
        let payload: DeletedPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.livelog, None);
        assert_eq!(payload.notification_html, None);
        assert_eq!(payload.post_id, None);
        assert_eq!(payload.discussion_id, Some(1));
    }

    #[test]
    fn test_created_payload_needs_numeric_ids() {
        let json = r#"{"discussionid": "abc", "postid": 2}"#;
        assert!(serde_json::from_str::<PostPayload>(json).is_err());
    }

    #[test]
    fn test_tagged_event_json() {
        let event = ForumEvent::FormCanceled(CanceledPayload {
            discussion_id: Some(3),
            post_id: None,
        });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "form-canceled");
        assert_eq!(json["payload"]["discussionid"], 3);
    }
}
