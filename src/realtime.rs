//! Change-feed frames for the hosted realtime service (Phoenix channels).

use serde_json::{json, Value};

use crate::gateway::Subscription;
use crate::model::{Post, PostId, UserId};

pub const POSTS_TOPIC: &str = "realtime:public:poems";

/// Opens the realtime socket. The implementation sends `join_frame` once
/// connected, keeps the channel alive with [`heartbeat_frame`]s and hands
/// every text frame to `on_message` until the subscription is dropped.
pub trait RealtimeConnector {
    fn open(&self, url: &str, join_frame: String, on_message: Box<dyn Fn(&str)>) -> Subscription;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub post_id: Option<PostId>,
    /// The row after the change; absent for deletes.
    pub post: Option<Post>,
    pub owner: Option<UserId>,
}

impl ChangeEvent {
    /// Whether the event concerns `owner`. Events whose owner is unknown
    /// (deletes without the full old row) are let through.
    pub fn concerns(&self, owner: Option<&UserId>) -> bool {
        match (owner, &self.owner) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

pub fn join_frame(owner: Option<&UserId>, access_token: &str, reference: u64) -> String {
    let mut changes = json!({
        "event": "*",
        "schema": "public",
        "table": "poems",
    });
    if let Some(owner) = owner {
        changes["filter"] = Value::String(format!("user_id=eq.{}", owner));
    }

    json!({
        "topic": POSTS_TOPIC,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [changes],
            },
            "access_token": access_token,
        },
        "ref": reference.to_string(),
        "join_ref": reference.to_string(),
    })
    .to_string()
}

pub fn heartbeat_frame(reference: u64) -> String {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string(),
    })
    .to_string()
}

pub fn leave_frame(reference: u64) -> String {
    json!({
        "topic": POSTS_TOPIC,
        "event": "phx_leave",
        "payload": {},
        "ref": reference.to_string(),
    })
    .to_string()
}

/// Decodes a text frame into a post change. Replies, heartbeats and other
/// channel traffic yield `None`.
pub fn decode_frame(text: &str) -> Option<ChangeEvent> {
    let frame: Value = serde_json::from_str(text).ok()?;
    if frame.get("event")?.as_str()? != "postgres_changes" {
        return None;
    }

    let data = frame.get("payload")?.get("data")?;
    let kind = match data.get("type")?.as_str()? {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        _ => return None,
    };

    let record = data.get("record").filter(|record| !is_empty_object(record));
    let old_record = data.get("old_record").filter(|record| !is_empty_object(record));
    let post = match kind {
        ChangeKind::Delete => None,
        _ => record.and_then(|record| serde_json::from_value::<Post>(record.clone()).ok()),
    };

    let row = record.or(old_record);
    let post_id = row
        .and_then(|row| row.get("id"))
        .and_then(scalar_string)
        .map(PostId);
    let owner = row
        .and_then(|row| row.get("user_id"))
        .and_then(scalar_string)
        .map(UserId);

    Some(ChangeEvent {
        kind,
        post_id,
        post,
        owner,
    })
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().map_or(true, |object| object.is_empty())
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_frame_carries_the_owner_filter() {
        let frame: Value =
            serde_json::from_str(&join_frame(Some(&UserId::new("u1")), "tok", 3)).unwrap();
        assert_eq!(frame["event"], "phx_join");
        assert_eq!(frame["topic"], POSTS_TOPIC);
        assert_eq!(frame["ref"], "3");
        assert_eq!(
            frame["payload"]["config"]["postgres_changes"][0]["filter"],
            "user_id=eq.u1"
        );

        let open: Value = serde_json::from_str(&join_frame(None, "tok", 1)).unwrap();
        assert!(open["payload"]["config"]["postgres_changes"][0]
            .get("filter")
            .is_none());
    }

    #[test]
    fn decodes_inserts_with_the_new_row() {
        let text = r#"{"topic":"realtime:public:poems","event":"postgres_changes","ref":null,
            "payload":{"data":{"type":"INSERT","table":"poems","old_record":{},
            "record":{"id":5,"title":"Dawn","content":"light","tags":"a, b","user_id":"u1",
            "created_at":"2024-01-01T00:00:00Z","views_count":0}}}}"#;

        let event = decode_frame(text).unwrap();
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.post_id, Some(PostId::new("5")));
        assert_eq!(event.owner, Some(UserId::new("u1")));
        assert_eq!(event.post.unwrap().tags, vec!["a", "b"]);
    }

    #[test]
    fn decodes_deletes_from_the_old_row() {
        let text = r#"{"event":"postgres_changes","payload":{"data":{"type":"DELETE",
            "record":{},"old_record":{"id":"p9"}}}}"#;

        let event = decode_frame(text).unwrap();
        assert_eq!(event.kind, ChangeKind::Delete);
        assert_eq!(event.post_id, Some(PostId::new("p9")));
        assert!(event.post.is_none());
        assert!(event.concerns(Some(&UserId::new("anyone"))));
    }

    #[test]
    fn ignores_channel_traffic() {
        assert_eq!(decode_frame(&heartbeat_frame(1)), None);
        assert_eq!(
            decode_frame(r#"{"event":"phx_reply","payload":{"status":"ok"}}"#),
            None
        );
        assert_eq!(decode_frame("not json"), None);
    }
}
