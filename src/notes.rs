use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StorageError, ValidationError};
use crate::store::Store;

pub const NOTES_KEY: &str = "glassmemo_notes";
pub const MAX_CONTENT_CHARS: usize = 1000;

const DAY_MS: i64 = 1000 * 60 * 60 * 24;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub is_pinned: bool,
}

impl Note {
    pub fn new(content: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            created_at,
            is_pinned: false,
        }
    }
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Pinned notes first, then newest first. The sort is stable, so notes with
/// equal timestamps keep their stored order.
pub fn sort_for_display(notes: &[Note]) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    sorted
}

pub fn toggle_pin(notes: &[Note], id: &str) -> Vec<Note> {
    notes
        .iter()
        .map(|n| {
            if n.id == id {
                Note {
                    is_pinned: !n.is_pinned,
                    ..n.clone()
                }
            } else {
                n.clone()
            }
        })
        .collect()
}

pub fn delete_note(notes: &[Note], id: &str) -> Vec<Note> {
    notes.iter().filter(|n| n.id != id).cloned().collect()
}

/// Prepends a new note holding the trimmed `content`.
pub fn add_note(notes: &[Note], content: &str, now: i64) -> Result<Vec<Note>, ValidationError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }

    let mut updated = Vec::with_capacity(notes.len() + 1);
    updated.push(Note::new(clamp_content(content), now));
    updated.extend_from_slice(notes);
    Ok(updated)
}

/// Cuts `content` down to `MAX_CONTENT_CHARS` characters.
pub fn clamp_content(content: &str) -> String {
    content.chars().take(MAX_CONTENT_CHARS).collect()
}

/// Whole-day buckets from the ceiling of the absolute difference:
/// 1 day is "Today", 2 is "Yesterday", up to 7 is "N days ago" (N = days - 1),
/// anything further is a plain local date.
pub fn format_relative_date(timestamp: i64, now: i64) -> String {
    let diff = (now - timestamp).abs();
    let diff_days = (diff + DAY_MS - 1) / DAY_MS;

    match diff_days {
        0 | 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        3..=7 => format!("{} days ago", diff_days - 1),
        _ => format_local_date(timestamp),
    }
}

fn format_local_date(timestamp: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|| "Unknown date".to_string())
}

/// One-line title for list rows.
pub fn preview_title(content: &str) -> String {
    let sanitized: String = content
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let result = sanitized.split_whitespace().collect::<Vec<_>>().join(" ");
    if result.is_empty() {
        "No Content".to_string()
    } else {
        result
    }
}

pub fn decode_notes(raw: Option<&str>) -> Result<Vec<Note>, StorageError> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|source| StorageError::Corrupted {
            key: NOTES_KEY.to_string(),
            source,
        }),
    }
}

pub async fn load_notes(store: &Store) -> Result<Vec<Note>, StorageError> {
    let raw = store.get(NOTES_KEY).await?;
    decode_notes(raw.as_deref())
}

/// Replaces the whole stored collection.
pub async fn save_notes(store: &Store, notes: &[Note]) -> Result<(), StorageError> {
    let json = serde_json::to_string(notes)?;
    store.set(NOTES_KEY, &json).await
}

pub async fn clear_notes(store: &Store) -> Result<(), StorageError> {
    store.remove(NOTES_KEY).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(id: &str, created_at: i64, is_pinned: bool) -> Note {
        Note {
            id: id.to_string(),
            content: format!("note {}", id),
            created_at,
            is_pinned,
        }
    }

    fn ids(notes: &[Note]) -> Vec<&str> {
        notes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_sort_puts_pinned_first_then_newest() {
        let notes = vec![
            note("old", 100, false),
            note("pinned-old", 50, true),
            note("new", 300, false),
            note("pinned-new", 200, true),
        ];
        let sorted = sort_for_display(&notes);
        assert_eq!(ids(&sorted), vec!["pinned-new", "pinned-old", "new", "old"]);
    }

    #[test]
    fn test_sort_is_idempotent_and_stable_on_ties() {
        let notes = vec![
            note("a", 100, false),
            note("b", 100, false),
            note("c", 100, true),
            note("d", 100, false),
        ];
        let once = sort_for_display(&notes);
        assert_eq!(ids(&once), vec!["c", "a", "b", "d"]);
        assert_eq!(sort_for_display(&once), once);
    }

    #[test]
    fn test_sort_empty() {
        assert!(sort_for_display(&[]).is_empty());
    }

    #[test]
    fn test_toggle_pin_twice_is_identity() {
        let notes = vec![note("a", 1, false), note("b", 2, true)];
        let toggled = toggle_pin(&notes, "a");
        assert!(toggled[0].is_pinned);
        assert!(toggled[1].is_pinned);
        assert_eq!(toggle_pin(&toggled, "a"), notes);
    }

    #[test]
    fn test_toggle_pin_unknown_id_is_noop() {
        let notes = vec![note("a", 1, false)];
        assert_eq!(toggle_pin(&notes, "missing"), notes);
    }

    #[test]
    fn test_delete_twice_second_is_noop() {
        let notes = vec![note("a", 1, false), note("b", 2, false)];
        let once = delete_note(&notes, "a");
        assert_eq!(ids(&once), vec!["b"]);
        assert_eq!(delete_note(&once, "a"), once);
    }

    #[test]
    fn test_add_note_rejects_blank_content() {
        let notes = vec![note("a", 1, false)];
        assert_eq!(add_note(&notes, "", 10), Err(ValidationError::EmptyContent));
        assert_eq!(
            add_note(&notes, "   ", 10),
            Err(ValidationError::EmptyContent)
        );
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn test_add_note_prepends_trimmed_note() {
        let notes = vec![note("a", 1, false)];
        let updated = add_note(&notes, "  Buy milk \n", 42).unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0].content, "Buy milk");
        assert_eq!(updated[0].created_at, 42);
        assert!(!updated[0].is_pinned);
        assert_eq!(updated[1], notes[0]);
    }

    #[test]
    fn test_add_note_assigns_unique_ids() {
        let first = add_note(&[], "one", 5).unwrap();
        let second = add_note(&first, "two", 5).unwrap();
        assert_ne!(second[0].id, second[1].id);
    }

    #[test]
    fn test_clamp_content_counts_chars() {
        let long = "é".repeat(MAX_CONTENT_CHARS + 20);
        let clamped = clamp_content(&long);
        assert_eq!(clamped.chars().count(), MAX_CONTENT_CHARS);
    }

    #[test]
    fn test_relative_date_buckets() {
        let now = 1_700_000_000_000;
        assert_eq!(format_relative_date(now - DAY_MS, now), "Today");
        assert_eq!(format_relative_date(now - 1, now), "Today");
        assert_eq!(format_relative_date(now, now), "Today");
        assert_eq!(format_relative_date(now - DAY_MS - 1, now), "Yesterday");
        assert_eq!(format_relative_date(now - 2 * DAY_MS, now), "Yesterday");
        assert_eq!(format_relative_date(now - 5 * DAY_MS, now), "4 days ago");
        assert_eq!(format_relative_date(now - 7 * DAY_MS, now), "6 days ago");
    }

    #[test]
    fn test_relative_date_falls_back_to_calendar_date() {
        let now = 1_700_000_000_000;
        let formatted = format_relative_date(now - 10 * DAY_MS, now);
        assert!(!formatted.contains("ago"));
        assert_ne!(formatted, "Today");
        assert_ne!(formatted, "Yesterday");
        assert_eq!(formatted.matches('/').count(), 2);
    }

    #[test]
    fn test_preview_title_collapses_whitespace() {
        assert_eq!(preview_title("Buy\tmilk\n\nand  eggs"), "Buy milk and eggs");
        assert_eq!(preview_title(" \n "), "No Content");
    }

    #[test]
    fn test_persisted_field_names() {
        let json = serde_json::to_value(note("a", 7, true)).unwrap();
        assert_eq!(json["createdAt"], 7);
        assert_eq!(json["isPinned"], true);
    }

    #[test]
    fn test_decode_missing_pin_flag_defaults_false() {
        let notes =
            decode_notes(Some(r#"[{"id":"1","content":"x","createdAt":3}]"#)).unwrap();
        assert!(!notes[0].is_pinned);
    }

    #[test]
    fn test_decode_corrupted_is_storage_error() {
        let err = decode_notes(Some("[{\"id\":")).unwrap_err();
        assert!(matches!(err, StorageError::Corrupted { .. }));
        assert!(decode_notes(None).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_load_clear_round_trip() {
        let store = Store::open_in_memory().unwrap();
        let notes = add_note(&[], "Buy milk", 1).unwrap();
        save_notes(&store, &notes).await.unwrap();
        assert_eq!(load_notes(&store).await.unwrap(), notes);

        clear_notes(&store).await.unwrap();
        assert!(load_notes(&store).await.unwrap().is_empty());
        assert_eq!(store.get(NOTES_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_concurrent_read_modify_write_loses_first_update() {
        let store = Store::open_in_memory().unwrap();

        // Two holders read the same snapshot before either writes.
        let snapshot_a = load_notes(&store).await.unwrap();
        let snapshot_b = load_notes(&store).await.unwrap();

        let from_a = add_note(&snapshot_a, "from a", 1).unwrap();
        let from_b = add_note(&snapshot_b, "from b", 2).unwrap();
        save_notes(&store, &from_a).await.unwrap();
        save_notes(&store, &from_b).await.unwrap();

        let stored = load_notes(&store).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].content, "from b");
    }
}
