use serde::{Serialize, Deserialize};

use crate::scene::SurfaceRole;

/// All user-configurable settings, persisted to JSON.
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct Settings {
    pub textures: TextureSettings,
    pub assets: Vec<AssetEntry>,
    pub camera: CameraSettings,
    pub interaction: InteractionSettings,
    pub display: DisplaySettings,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct TextureSettings {
    pub floor: String,
    pub wall1: String,
    pub wall2: String,
    /// Substituted whenever a requested image fails to load.
    pub fallback: String,
    /// Directory searched for `<id>.png` when an asset has no explicit source.
    pub asset_dir: String,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            floor: "images/CORE_DECOR_COLD_60X60.jpg".to_string(),
            wall1: "images/ANIKSA_PULIDO_120x120.jpg".to_string(),
            wall2: "images/DUC_BLANC_BURGUINI_S.T_89.8x269.8.jpg".to_string(),
            fallback: "images/IMG-20240212-WA0041.jpg".to_string(),
            asset_dir: "images".to_string(),
        }
    }
}

impl TextureSettings {
    pub fn default_for(&self, role: SurfaceRole) -> &str {
        match role {
            SurfaceRole::Floor => &self.floor,
            SurfaceRole::Wall1 => &self.wall1,
            SurfaceRole::Wall2 => &self.wall2,
        }
    }
}

/// One draggable entry in the asset list.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssetEntry {
    pub id: String,
    /// Path or `data:` URL. None means `<asset_dir>/<id>.png`.
    #[serde(default)]
    pub src: Option<String>,
}

impl AssetEntry {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string(), src: None }
    }
}

fn default_assets() -> Vec<AssetEntry> {
    ["painting1", "painting2", "painting3", "plant", "mirror"]
        .into_iter()
        .map(AssetEntry::new)
        .collect()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near_plane: 0.1,
            far_plane: 1000.0,
            position: [0.0, 3.0, 7.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct InteractionSettings {
    /// Scale change per pixel of vertical pointer travel in resize mode.
    pub resize_sensitivity: f32,
    /// Scale change per unit of wheel delta.
    pub wheel_sensitivity: f32,
    /// Pixel delta reported for one wheel notch on line-based devices.
    pub wheel_line_pixels: f32,
    pub min_scale: f32,
    /// UV repeat applied to textures swapped in at runtime.
    pub swap_texture_repeat: f32,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            resize_sensitivity: 0.01,
            wheel_sensitivity: 0.001,
            wheel_line_pixels: 100.0,
            min_scale: 0.05,
            swap_texture_repeat: 2.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct DisplaySettings {
    pub bg_color: [f32; 3],
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub light_color: [f32; 3],
    pub light_intensity: f32,
    pub light_position: [f32; 3],
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            bg_color: [0.0, 0.0, 0.0],
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 1.0,
            light_color: [1.0, 1.0, 1.0],
            light_intensity: 1.0,
            light_position: [5.0, 5.0, 5.0],
        }
    }
}

impl Settings {
    /// Load settings from config file. Falls back to defaults on error.
    pub fn load() -> Self {
        let path = config_path();
        if path.exists()
            && let Ok(data) = std::fs::read_to_string(&path)
        {
            match Self::from_json(&data) {
                Ok(settings) => return settings,
                Err(e) => log::warn!("Ignoring malformed settings at {}: {e}", path.display()),
            }
        }
        Self::with_default_assets()
    }

    /// Save settings to config file.
    pub fn save(&self) {
        let path = config_path();
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(data) => {
                if let Err(e) = std::fs::write(&path, data) {
                    log::error!("Failed to save settings to {}: {e}", path.display());
                }
            }
            Err(e) => log::error!("Failed to serialize settings: {e}"),
        }
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        let mut settings: Settings = serde_json::from_str(data)?;
        if settings.assets.is_empty() {
            settings.assets = default_assets();
        }
        Ok(settings)
    }

    pub fn with_default_assets() -> Self {
        Self {
            assets: default_assets(),
            ..Self::default()
        }
    }
}

fn config_path() -> std::path::PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    std::path::PathBuf::from(home).join(".config/roomviz/settings.json")
}
