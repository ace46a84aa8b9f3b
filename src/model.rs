//! Rows as the hosted backend stores them, normalised at the boundary.
//!
//! Identifiers arrive either as JSON strings or numbers depending on how the
//! tables were created, and `tags` has been written both as a list and as a
//! comma separated string. Everything past this module only ever sees
//! `String` ids and a `Vec<String>` of tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::format::parse_tags;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(#[serde(deserialize_with = "id_from_any")] pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(PostId);
string_id!(CommentId);
string_id!(UserId);

impl UserId {
    /// The abbreviated form shown next to posts and comments.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(8) {
            Some((end, _)) => &self.0[..end],
            None => &self.0,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn id_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    List(Vec<Option<String>>),
    Delimited(String),
}

fn tags_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let tags = match Option::<RawTags>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawTags::Delimited(text)) => parse_tags(&text),
        Some(RawTags::List(items)) => items
            .into_iter()
            .flatten()
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect(),
    };
    Ok(tags)
}

fn string_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn count_or_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    #[serde(default, deserialize_with = "string_or_null")]
    pub title: String,
    #[serde(default, deserialize_with = "string_or_null")]
    pub content: String,
    #[serde(default, deserialize_with = "tags_from_any")]
    pub tags: Vec<String>,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "count_or_null")]
    pub views_count: u64,
}

impl Post {
    pub fn is_owned_by(&self, identity: Option<&Identity>) -> bool {
        identity.map_or(false, |identity| identity.id == self.owner)
    }
}

/// The user-editable part of a post.
#[derive(Clone, Debug, Serialize, PartialEq, Eq, Default)]
pub struct PostFields {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewPost {
    #[serde(flatten)]
    pub fields: PostFields,
    #[serde(rename = "user_id")]
    pub owner: UserId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    #[serde(rename = "poem_id")]
    pub post_id: PostId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    #[serde(rename = "comment_text", default, deserialize_with = "string_or_null")]
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_owned_by(&self, identity: Option<&Identity>) -> bool {
        identity.map_or(false, |identity| identity.id == self.owner)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct NewComment {
    #[serde(rename = "poem_id")]
    pub post_id: PostId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
    #[serde(rename = "comment_text")]
    pub text: String,
}

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Like {
    #[serde(rename = "poem_id")]
    pub post_id: PostId,
    #[serde(rename = "user_id")]
    pub owner: UserId,
}

/// The authenticated user, as reported by the auth service.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Which posts a listing should return.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub owner: Option<UserId>,
    pub search: Option<String>,
}

impl PostFilter {
    pub fn owned_by(owner: UserId) -> Self {
        PostFilter {
            owner: Some(owner),
            search: None,
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        PostFilter {
            owner: None,
            search: Some(text.into()),
        }
    }

    /// The trimmed, lowercased search needle, if there is one.
    pub fn needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
    }

    /// Client-side search over title, content and tags.
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(owner) = &self.owner {
            if &post.owner != owner {
                return false;
            }
        }

        let needle = match self.needle() {
            Some(needle) => needle,
            None => return true,
        };

        post.title.to_lowercase().contains(&needle)
            || post.content.to_lowercase().contains(&needle)
            || post
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_json(tags: &str) -> String {
        format!(
            r#"{{"id": 7, "title": "Rain", "content": "soft", "tags": {}, "user_id": "3f1c9a2e-77aa-4bb0-9d55-5c1e2f0a9b10", "created_at": "2024-05-01T10:00:00+00:00", "views_count": null}}"#,
            tags
        )
    }

    #[test]
    fn tags_are_normalised_from_any_shape() {
        let listed: Post = serde_json::from_str(&post_json(r#"[" sea ", "", "sky"]"#)).unwrap();
        assert_eq!(listed.tags, vec!["sea", "sky"]);

        let delimited: Post = serde_json::from_str(&post_json(r#""sea, sky,,""#)).unwrap();
        assert_eq!(delimited.tags, vec!["sea", "sky"]);

        let missing: Post = serde_json::from_str(&post_json("null")).unwrap();
        assert!(missing.tags.is_empty());
    }

    #[test]
    fn numeric_ids_and_null_counters_are_accepted() {
        let post: Post = serde_json::from_str(&post_json("[]")).unwrap();
        assert_eq!(post.id, PostId::new("7"));
        assert_eq!(post.views_count, 0);
        assert_eq!(post.owner.short(), "3f1c9a2e");
    }

    #[test]
    fn new_rows_use_the_table_column_names() {
        let row = NewComment {
            post_id: PostId::new("1"),
            owner: UserId::new("u"),
            text: "hello".into(),
        };
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            serde_json::json!({"poem_id": "1", "user_id": "u", "comment_text": "hello"})
        );

        let post = NewPost {
            fields: PostFields {
                title: "t".into(),
                content: "c".into(),
                tags: vec!["a".into()],
            },
            owner: UserId::new("u"),
        };
        assert_eq!(
            serde_json::to_value(&post).unwrap(),
            serde_json::json!({"title": "t", "content": "c", "tags": ["a"], "user_id": "u"})
        );
    }

    #[test]
    fn search_filter_looks_at_title_content_and_tags() {
        let post: Post = serde_json::from_str(&post_json(r#"["Autumn"]"#)).unwrap();
        assert!(PostFilter::search("rain").matches(&post));
        assert!(PostFilter::search("  SOFT ").matches(&post));
        assert!(PostFilter::search("autumn").matches(&post));
        assert!(!PostFilter::search("winter").matches(&post));
        assert!(PostFilter::search("   ").matches(&post));
        assert!(!PostFilter::owned_by(UserId::new("someone-else")).matches(&post));
    }
}
