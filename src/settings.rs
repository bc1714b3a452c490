//! Quality tiers and user preferences
//!
//! Persisted in LocalStorage on the web build, defaults elsewhere.

use serde::{Deserialize, Serialize};

/// Quality tier levels, ordered Low → Max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityTier {
    Low,
    Medium,
    #[default]
    High,
    Max,
}

/// Derived simulation/render parameters for a quality tier.
///
/// Immutable per tier. Swapping tiers must reallocate the water grids,
/// not just rescale parameters, since the grid resolution changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityConfig {
    /// Water grid resolution N (grid is N×N cells)
    pub water_grid_size: u32,
    /// Distance from the player beyond which cells are forced to zero
    pub water_ripple_radius: f32,
    /// Samples for the god-ray march in the floor shader
    pub god_ray_samples: u32,
    /// Decorative particle count (consumed by the visual layer)
    pub particle_count: u32,
    /// Player sphere geometry segments (consumed by the visual layer)
    pub player_segments: u32,
    /// Device pixel ratio cap for the canvas backbuffer
    pub max_pixel_ratio: f32,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "Low",
            QualityTier::Medium => "Medium",
            QualityTier::High => "High",
            QualityTier::Max => "Max",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityTier::Low),
            "medium" | "med" => Some(QualityTier::Medium),
            "high" => Some(QualityTier::High),
            "max" => Some(QualityTier::Max),
            _ => None,
        }
    }

    /// Fixed parameter record for this tier
    pub fn config(&self) -> QualityConfig {
        match self {
            QualityTier::Max => QualityConfig {
                water_grid_size: 1024,
                water_ripple_radius: 6.0,
                god_ray_samples: 5,
                particle_count: 1024,
                player_segments: 64,
                max_pixel_ratio: 3.0,
            },
            QualityTier::High => QualityConfig {
                water_grid_size: 512,
                water_ripple_radius: 5.0,
                god_ray_samples: 3,
                particle_count: 1024,
                player_segments: 48,
                max_pixel_ratio: 2.0,
            },
            QualityTier::Medium => QualityConfig {
                water_grid_size: 256,
                water_ripple_radius: 3.0,
                god_ray_samples: 2,
                particle_count: 512,
                player_segments: 24,
                max_pixel_ratio: 1.5,
            },
            QualityTier::Low => QualityConfig {
                water_grid_size: 128,
                water_ripple_radius: 2.0,
                god_ray_samples: 1,
                particle_count: 512,
                player_segments: 16,
                max_pixel_ratio: 1.0,
            },
        }
    }

    /// One tier up or down along Low → Medium → High → Max, clamped
    pub fn stepped(&self, up: bool) -> Self {
        const ORDER: [QualityTier; 4] = [
            QualityTier::Low,
            QualityTier::Medium,
            QualityTier::High,
            QualityTier::Max,
        ];
        let idx = ORDER.iter().position(|t| t == self).unwrap_or(2);
        let next = if up {
            (idx + 1).min(ORDER.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        ORDER[next]
    }
}

/// User preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Graphics quality tier
    pub quality: QualityTier,
    /// Audio muted (audio playback lives in the page layer)
    pub muted: bool,
    /// Show FPS counter in the HUD
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityTier::default(),
            muted: true,
            show_fps: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "magic_floor_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
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
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tier_is_high() {
        assert_eq!(QualityTier::default(), QualityTier::High);
    }

    #[test]
    fn test_tier_table() {
        let max = QualityTier::Max.config();
        assert_eq!(max.water_grid_size, 1024);
        assert_eq!(max.god_ray_samples, 5);
        assert_eq!(max.max_pixel_ratio, 3.0);

        let low = QualityTier::Low.config();
        assert_eq!(low.water_grid_size, 128);
        assert_eq!(low.water_ripple_radius, 2.0);
        assert_eq!(low.particle_count, 512);

        // Grid sizes halve tier to tier
        assert_eq!(QualityTier::High.config().water_grid_size, 512);
        assert_eq!(QualityTier::Medium.config().water_grid_size, 256);
    }

    #[test]
    fn test_step_clamps_at_ends() {
        assert_eq!(QualityTier::Max.stepped(true), QualityTier::Max);
        assert_eq!(QualityTier::Low.stepped(false), QualityTier::Low);
        assert_eq!(QualityTier::Medium.stepped(true), QualityTier::High);
        assert_eq!(QualityTier::High.stepped(false), QualityTier::Medium);
    }

    #[test]
    fn test_tier_round_trip_str() {
        for tier in [
            QualityTier::Low,
            QualityTier::Medium,
            QualityTier::High,
            QualityTier::Max,
        ] {
            assert_eq!(QualityTier::from_str(tier.as_str()), Some(tier));
        }
        assert_eq!(QualityTier::from_str("ultra"), None);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = Settings {
            quality: QualityTier::Low,
            muted: false,
            show_fps: true,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.quality, QualityTier::Low);
        assert!(!back.muted);
        assert!(back.show_fps);
    }
}
