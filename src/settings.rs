use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;
use crate::store::Store;

pub const SETTINGS_KEY: &str = "glassmemo_settings";
pub const BLUR_PRESETS: [u8; 3] = [60, 80, 100];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

impl TextSize {
    pub const ALL: [TextSize; 3] = [TextSize::Small, TextSize::Medium, TextSize::Large];

    pub fn label(&self) -> &'static str {
        match self {
            TextSize::Small => "Small",
            TextSize::Medium => "Medium",
            TextSize::Large => "Large",
        }
    }

    /// How many content lines a note card shows.
    pub fn preview_lines(&self) -> usize {
        match self {
            TextSize::Small => 2,
            TextSize::Medium => 4,
            TextSize::Large => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub blur_intensity: u8,
    pub text_size: TextSize,
    pub haptic_feedback: bool,
    /// Persisted for compatibility; nothing reads it yet.
    pub auto_save: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blur_intensity: 80,
            text_size: TextSize::Medium,
            haptic_feedback: true,
            auto_save: true,
        }
    }
}

impl Settings {
    /// Blur intensity as the 0..1 fraction the glass surface expects.
    pub fn glass_intensity(&self) -> f32 {
        f32::from(self.blur_intensity) / 100.0
    }

    /// Overlays every structurally valid field of `stored` on the defaults.
    /// Unknown fields and values of the wrong shape are ignored.
    pub fn merge_over_defaults(stored: &serde_json::Map<String, Value>) -> Self {
        let mut settings = Settings::default();

        if let Some(blur) = stored
            .get("blurIntensity")
            .and_then(Value::as_u64)
            .and_then(|v| u8::try_from(v).ok())
            .filter(|v| BLUR_PRESETS.contains(v))
        {
            settings.blur_intensity = blur;
        }
        if let Some(size) = stored
            .get("textSize")
            .and_then(|v| serde_json::from_value::<TextSize>(v.clone()).ok())
        {
            settings.text_size = size;
        }
        if let Some(haptic) = stored.get("hapticFeedback").and_then(Value::as_bool) {
            settings.haptic_feedback = haptic;
        }
        if let Some(auto_save) = stored.get("autoSave").and_then(Value::as_bool) {
            settings.auto_save = auto_save;
        }

        settings
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingUpdate {
    BlurIntensity(u8),
    TextSize(TextSize),
    HapticFeedback(bool),
    // No screen row edits this flag; it is stored and merged only.
    #[allow(dead_code)]
    AutoSave(bool),
}

/// Returns a copy of `current` with one field replaced. Persisting it is the
/// caller's job.
pub fn update_setting(current: &Settings, update: SettingUpdate) -> Settings {
    let mut next = current.clone();
    match update {
        SettingUpdate::BlurIntensity(v) => next.blur_intensity = v,
        SettingUpdate::TextSize(v) => next.text_size = v,
        SettingUpdate::HapticFeedback(v) => next.haptic_feedback = v,
        SettingUpdate::AutoSave(v) => next.auto_save = v,
    }
    next
}

/// Absent records load as defaults. Malformed JSON, or JSON that is not an
/// object, is reported as corrupted so the caller can fall back explicitly.
pub fn load_settings(stored: Option<&str>) -> Result<Settings, StorageError> {
    let Some(text) = stored else {
        return Ok(Settings::default());
    };

    let corrupted = |source| StorageError::Corrupted {
        key: SETTINGS_KEY.to_string(),
        source,
    };
    let value: Value = serde_json::from_str(text).map_err(corrupted)?;
    match value {
        Value::Object(map) => Ok(Settings::merge_over_defaults(&map)),
        _ => Err(corrupted(<serde_json::Error as serde::de::Error>::custom(
            "settings record is not a JSON object",
        ))),
    }
}

pub async fn fetch_settings(store: &Store) -> Result<Settings, StorageError> {
    let raw = store.get(SETTINGS_KEY).await?;
    load_settings(raw.as_deref())
}

pub async fn save_settings(store: &Store, settings: &Settings) -> Result<(), StorageError> {
    let json = serde_json::to_string(settings)?;
    store.set(SETTINGS_KEY, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.blur_intensity, 80);
        assert_eq!(s.text_size, TextSize::Medium);
        assert!(s.haptic_feedback);
        assert!(s.auto_save);
    }

    #[test]
    fn test_load_empty_object_is_defaults() {
        assert_eq!(load_settings(Some("{}")).unwrap(), Settings::default());
        assert_eq!(load_settings(None).unwrap(), Settings::default());
    }

    #[test]
    fn test_load_partial_overrides_only_present_field() {
        let loaded = load_settings(Some(r#"{"textSize":"large"}"#)).unwrap();
        assert_eq!(
            loaded,
            Settings {
                text_size: TextSize::Large,
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_load_ignores_invalid_fields() {
        let loaded = load_settings(Some(
            r#"{"blurIntensity":55,"textSize":"huge","hapticFeedback":"no","autoSave":false,"theme":"x"}"#,
        ))
        .unwrap();
        assert_eq!(loaded.blur_intensity, 80);
        assert_eq!(loaded.text_size, TextSize::Medium);
        assert!(loaded.haptic_feedback);
        assert!(!loaded.auto_save);
    }

    #[test]
    fn test_load_corrupted_record() {
        assert!(matches!(
            load_settings(Some("{not json")),
            Err(StorageError::Corrupted { .. })
        ));
        assert!(matches!(
            load_settings(Some("[1, 2]")),
            Err(StorageError::Corrupted { .. })
        ));
    }

    #[test]
    fn test_update_setting_replaces_one_field() {
        let base = Settings::default();
        let next = update_setting(&base, SettingUpdate::BlurIntensity(100));
        assert_eq!(next.blur_intensity, 100);
        assert_eq!(next.text_size, base.text_size);
        assert_eq!(base.blur_intensity, 80);

        let next = update_setting(&next, SettingUpdate::HapticFeedback(false));
        assert!(!next.haptic_feedback);
        assert_eq!(next.blur_intensity, 100);
    }

    #[test]
    fn test_auto_save_update_survives_reload() {
        let base = Settings::default();
        assert!(base.auto_save);

        let next = update_setting(&base, SettingUpdate::AutoSave(false));
        assert!(!next.auto_save);
        assert_eq!(next.haptic_feedback, base.haptic_feedback);
        assert_eq!(next.blur_intensity, base.blur_intensity);

        let json = serde_json::to_string(&next).unwrap();
        let reloaded = load_settings(Some(&json)).unwrap();
        assert_eq!(reloaded, next);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert_eq!(
            json,
            r#"{"blurIntensity":80,"textSize":"medium","hapticFeedback":true,"autoSave":true}"#
        );
    }

    #[test]
    fn test_glass_intensity_fraction() {
        let s = update_setting(&Settings::default(), SettingUpdate::BlurIntensity(60));
        assert!((s.glass_intensity() - 0.6).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(fetch_settings(&store).await.unwrap(), Settings::default());

        let updated = update_setting(&Settings::default(), SettingUpdate::TextSize(TextSize::Small));
        save_settings(&store, &updated).await.unwrap();
        assert_eq!(fetch_settings(&store).await.unwrap(), updated);
    }
}
