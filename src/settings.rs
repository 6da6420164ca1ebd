//! Player and display preferences
//!
//! Persisted in LocalStorage, separate from anything the simulation owns.

use serde::{Deserialize, Serialize};

use crate::consts::HUD_RATE_HZ;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Next preset, wrapping from High back to Low
    pub fn next(self) -> Self {
        match self {
            QualityPreset::Low => QualityPreset::Medium,
            QualityPreset::Medium => QualityPreset::High,
            QualityPreset::High => QualityPreset::Low,
        }
    }

    /// Track samples skipped per drawn terrain column
    pub fn terrain_stride(&self) -> usize {
        match self {
            QualityPreset::Low => 4,
            QualityPreset::Medium => 2,
            QualityPreset::High => 1,
        }
    }

    /// Parallax hill layers behind the track
    pub fn parallax_layers(&self) -> usize {
        match self {
            QualityPreset::Low => 0,
            QualityPreset::Medium => 2,
            QualityPreset::High => 3,
        }
    }

    /// Segments per wheel / pickup circle
    pub fn circle_segments(&self) -> u32 {
        match self {
            QualityPreset::Low => 12,
            QualityPreset::Medium => 20,
            QualityPreset::High => 32,
        }
    }
}

/// Display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Embedded/small screen: tighter framing, less look-ahead
    pub compact_display: bool,
    /// HUD updates per second when nothing urgent happened
    pub hud_rate_hz: f32,
    /// Snap the camera instead of easing it
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            compact_display: false,
            hud_rate_hz: HUD_RATE_HZ,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// HUD emission interval in seconds, with out-of-range rates reset
    pub fn hud_interval(&self) -> f32 {
        if self.hud_rate_hz.is_finite() && self.hud_rate_hz >= 1.0 {
            1.0 / self.hud_rate_hz.min(120.0)
        } else {
            1.0 / HUD_RATE_HZ
        }
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "hillclimb_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parse() {
        assert_eq!(QualityPreset::parse("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
    }

    #[test]
    fn test_preset_cycle_visits_all() {
        let mut q = QualityPreset::Low;
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(q);
            q = q.next();
        }
        assert_eq!(q, QualityPreset::Low);
        assert_eq!(
            seen,
            [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High]
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"compact_display":true}"#).unwrap();
        assert!(s.compact_display);
        assert_eq!(s.quality, QualityPreset::Medium);
        assert_eq!(s.hud_rate_hz, HUD_RATE_HZ);
    }

    #[test]
    fn test_hud_interval_guarded() {
        let mut s = Settings::default();
        assert!((s.hud_interval() - 1.0 / 30.0).abs() < 1e-6);
        s.hud_rate_hz = 0.0;
        assert!((s.hud_interval() - 1.0 / 30.0).abs() < 1e-6);
        s.hud_rate_hz = f32::NAN;
        assert!(s.hud_interval().is_finite());
    }

    #[test]
    fn test_quality_scales_detail() {
        assert!(QualityPreset::High.terrain_stride() < QualityPreset::Low.terrain_stride());
        assert_eq!(QualityPreset::Low.parallax_layers(), 0);
    }
}
