//! Settings management for Immersive Pages
//!
//! Handles loading/saving of the `pages.xml` configuration. Every value has a
//! default, so a partial file (or none at all) still produces a runnable set
//! of pages.

use quick_xml::de::from_str;
use quick_xml::se::to_string;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::interaction::OpacityOscillator;
use crate::pages::PageKind;

/// Default link opened by the landing page's second button
pub const DEFAULT_LINK_URL: &str = "https://www.google.com/search?sca_esv=6ed7b9508758552f&rlz=1C5OZZY_enGB1136GB1138&sxsrf=ADLYWIIFjECjlt7MHkYMsah1iso2L8Obiw:1734549488590&q=palestine+flag&udm=2&fbs=AEQNm0APE89G33kFGzImMw4YMLSxCv-qT2Xiwl6UZIx3nI268mTq33R0yC9xiegFTTwI_26kUAfYmNUFNFIW7CgL6QpS3w7EnI0oIq8iYLzInOm_LILGTNphCOAbkxoAkJHkvacJpJtTr4Ns4lrgiyV3-Gm8t-sVBotUYopr4pKtDYWpiJuZbICxB2wk-A50SG_d4T4CiQY9dxv7o_82wQ08sD2EJMvLjEZLQuko1qLnHq8d5isrzzA&sa=X&ved=2ahUKEwiCivOwhLKKAxXaUUEAHfWTPckQtKgLegQIFBAB&biw=1512&bih=823&dpr=2";

/// 3D vector stored as `x`/`y`/`z` attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec3Setting {
    #[serde(rename = "@x", default)]
    pub x: f32,
    #[serde(rename = "@y", default)]
    pub y: f32,
    #[serde(rename = "@z", default)]
    pub z: f32,
}

impl Vec3Setting {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vec3Setting> for glam::Vec3 {
    fn from(v: Vec3Setting) -> Self {
        glam::Vec3::new(v.x, v.y, v.z)
    }
}

/// Perspective camera placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    #[serde(rename = "@fov")]
    pub fov_degrees: f32,
    #[serde(rename = "@near")]
    pub near: f32,
    #[serde(rename = "@far")]
    pub far: f32,
    #[serde(rename = "position")]
    pub position: Vec3Setting,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3Setting::new(0.0, 0.0, 300.0),
        }
    }
}

impl CameraSettings {
    fn at_z(z: f32) -> Self {
        Self {
            position: Vec3Setting::new(0.0, 0.0, z),
            ..Self::default()
        }
    }
}

/// Sphere tessellation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereSettings {
    #[serde(rename = "@radius")]
    pub radius: f32,
    #[serde(rename = "@widthSegments")]
    pub width_segments: u32,
    #[serde(rename = "@heightSegments")]
    pub height_segments: u32,
}

/// Textured plane placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneSettings {
    #[serde(rename = "@texture", default)]
    pub texture: String,
    #[serde(rename = "@width")]
    pub width: f32,
    #[serde(rename = "@height")]
    pub height: f32,
    #[serde(rename = "position", default)]
    pub position: Vec3Setting,
}

impl PlaneSettings {
    fn new(texture: &str, width: f32, height: f32, position: Vec3Setting) -> Self {
        Self {
            texture: texture.to_string(),
            width,
            height,
            position,
        }
    }
}

/// Starting state of a blinking opacity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OscillatorSettings {
    #[serde(rename = "@opacity")]
    pub opacity: f32,
    #[serde(rename = "@direction")]
    pub direction: f32,
    #[serde(rename = "@step")]
    pub step: f32,
    #[serde(rename = "@min")]
    pub min: f32,
    #[serde(rename = "@max")]
    pub max: f32,
}

impl OscillatorSettings {
    pub fn build(&self) -> OpacityOscillator {
        OpacityOscillator::new(self.opacity, self.direction, self.step, self.min, self.max)
    }

    fn normalize(&mut self) {
        if self.min > self.max {
            std::mem::swap(&mut self.min, &mut self.max);
        }
        self.step = self.step.abs();
    }
}

/// OBJ model placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(rename = "@path")]
    pub path: String,
    #[serde(rename = "position", default)]
    pub position: Vec3Setting,
}

/// Fisheye photo viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FisheyeSettings {
    #[serde(rename = "camera")]
    pub camera: CameraSettings,
    #[serde(rename = "sphere")]
    pub sphere: SphereSettings,
    /// Milliseconds between photo changes
    #[serde(rename = "slideshowIntervalMs")]
    pub slideshow_interval_ms: u64,
    /// Radians added to the sphere's Y rotation every frame
    #[serde(rename = "spinPerFrame")]
    pub spin_per_frame: f32,
    #[serde(rename = "photo")]
    pub photos: Vec<String>,
}

impl Default for FisheyeSettings {
    fn default() -> Self {
        let mut photos: Vec<String> = [
            "1.png", "2.png", "3.png", "4.png", "4.1.png", "5.png", "6.png", "7.jpg", "8.png", "9.png", "10.png",
            "11.jpg", "12.png", "13.png", "14.png", "15.jpg", "16.png", "16.1.png", "17.png", "18.png", "19.png",
            "20.jpg", "21.png", "22.png", "23.png", "24.png", "24.1.png", "25.jpg",
        ]
        .iter()
        .map(|name| format!("photos/{}", name))
        .collect();
        photos.extend((26..=36).map(|n| format!("photos/{}.png", n)));

        Self {
            camera: CameraSettings::at_z(300.0),
            sphere: SphereSettings {
                radius: 150.0,
                width_segments: 64,
                height_segments: 64,
            },
            slideshow_interval_ms: 21_500,
            spin_per_frame: 0.002,
            photos,
        }
    }
}

/// Landing page with models, buttons and the video teaser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandingSettings {
    #[serde(rename = "camera")]
    pub camera: CameraSettings,
    #[serde(rename = "orbitDamping")]
    pub orbit_damping: f32,
    #[serde(rename = "orbitRotateSpeed")]
    pub orbit_rotate_speed: f32,
    #[serde(rename = "background")]
    pub background: String,
    #[serde(rename = "backgroundSphere")]
    pub background_sphere: SphereSettings,
    #[serde(rename = "model")]
    pub models: Vec<ModelSettings>,
    /// Radians added to each model's rotation every frame
    #[serde(rename = "modelSpin")]
    pub model_spin: Vec3Setting,
    #[serde(rename = "ambientIntensity")]
    pub ambient_intensity: f32,
    #[serde(rename = "directionalIntensity")]
    pub directional_intensity: f32,
    #[serde(rename = "directionalPosition")]
    pub directional_position: Vec3Setting,
    #[serde(rename = "fishButton")]
    pub fish_button: PlaneSettings,
    #[serde(rename = "fishExposure")]
    pub fish_exposure: f32,
    #[serde(rename = "fishAlphaCutoff")]
    pub fish_alpha_cutoff: f32,
    #[serde(rename = "hoverScale")]
    pub hover_scale: f32,
    #[serde(rename = "video")]
    pub video: String,
    #[serde(rename = "videoPlane")]
    pub video_plane: PlaneSettings,
    #[serde(rename = "clickOverlay")]
    pub click_overlay: PlaneSettings,
    #[serde(rename = "clickOscillator")]
    pub click_oscillator: OscillatorSettings,
    #[serde(rename = "linkButton")]
    pub link_button: PlaneSettings,
    #[serde(rename = "linkOscillator")]
    pub link_oscillator: OscillatorSettings,
    #[serde(rename = "linkUrl")]
    pub link_url: String,
}

impl Default for LandingSettings {
    fn default() -> Self {
        let model = |path: &str, x: f32| ModelSettings {
            path: path.to_string(),
            position: Vec3Setting::new(x, 0.0, 0.0),
        };
        Self {
            camera: CameraSettings::at_z(350.0),
            orbit_damping: 0.05,
            orbit_rotate_speed: 0.5,
            background: "textures/background.jpg".to_string(),
            background_sphere: SphereSettings {
                radius: 500.0,
                width_segments: 60,
                height_segments: 40,
            },
            models: vec![
                model("models/model1.obj", -100.0),
                model("models/model2.obj", 100.0),
                model("models/model3.obj", 0.0),
            ],
            model_spin: Vec3Setting::new(0.005, 0.01, 0.0),
            ambient_intensity: 2.0,
            directional_intensity: 3.0,
            directional_position: Vec3Setting::new(2.0, 2.0, 5.0),
            fish_button: PlaneSettings::new("textures/fish002.png", 100.0, 50.0, Vec3Setting::new(300.0, 200.0, -44.0)),
            fish_exposure: 0.9,
            fish_alpha_cutoff: 0.1,
            hover_scale: 1.1,
            video: "videos/raincoatf.mp4".to_string(),
            video_plane: PlaneSettings::new("", 390.0, 110.0, Vec3Setting::new(0.0, -150.0, 1.0)),
            click_overlay: PlaneSettings::new("textures/click.png", 58.0, 19.0, Vec3Setting::new(0.0, -150.0, 1.1)),
            click_oscillator: OscillatorSettings {
                opacity: 1.0,
                direction: -1.0,
                step: 0.05,
                min: 0.3,
                max: 1.0,
            },
            link_button: PlaneSettings::new("textures/click2.png", 60.0, 18.0, Vec3Setting::new(-300.0, 200.0, -44.0)),
            link_oscillator: OscillatorSettings {
                opacity: 1.0,
                direction: 1.0,
                step: 0.5,
                min: 1.0,
                max: 1.0,
            },
            link_url: DEFAULT_LINK_URL.to_string(),
        }
    }
}

/// Worms video/photo viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WormsSettings {
    #[serde(rename = "camera")]
    pub camera: CameraSettings,
    #[serde(rename = "video")]
    pub video: String,
    #[serde(rename = "videoPlane")]
    pub video_plane: PlaneSettings,
    #[serde(rename = "overlay")]
    pub overlay: PlaneSettings,
    #[serde(rename = "photoPlane")]
    pub photo_plane: PlaneSettings,
    /// How long a clicked photo stays up
    #[serde(rename = "photoDurationMs")]
    pub photo_duration_ms: u64,
    #[serde(rename = "photo")]
    pub photos: Vec<String>,
}

impl Default for WormsSettings {
    fn default() -> Self {
        Self {
            camera: CameraSettings::at_z(400.0),
            video: "worms/worms.mp4".to_string(),
            video_plane: PlaneSettings::new("", 1280.0, 1180.0, Vec3Setting::default()),
            overlay: PlaneSettings::new("worms/click.png", 1280.0, 1180.0, Vec3Setting::new(0.0, 0.0, -75.0)),
            photo_plane: PlaneSettings::new("", 1200.0, 1150.0, Vec3Setting::default()),
            photo_duration_ms: 1800,
            photos: ["H1", "H2", "H3", "H5", "H6", "H7", "H8"]
                .iter()
                .map(|name| format!("worms/{}.JPG", name))
                .collect(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename = "ImmersivePages", default)]
pub struct PagesSettings {
    #[serde(rename = "startPage")]
    pub start_page: PageKind,

    /// Target frame rate (24-240), ignored when vsync is on
    #[serde(rename = "targetFps")]
    pub target_fps: u32,

    #[serde(rename = "vsyncEnabled")]
    pub vsync_enabled: bool,

    #[serde(rename = "windowWidth")]
    pub window_width: u32,

    #[serde(rename = "windowHeight")]
    pub window_height: u32,

    /// Directory asset paths are resolved against; defaults to the working directory
    #[serde(rename = "assetRoot", skip_serializing_if = "Option::is_none")]
    pub asset_root: Option<String>,

    #[serde(rename = "fisheye")]
    pub fisheye: FisheyeSettings,

    #[serde(rename = "landing")]
    pub landing: LandingSettings,

    #[serde(rename = "worms")]
    pub worms: WormsSettings,
}

impl Default for PagesSettings {
    fn default() -> Self {
        Self {
            start_page: PageKind::Landing,
            target_fps: 60,
            vsync_enabled: false,
            window_width: 1280,
            window_height: 720,
            asset_root: None,
            fisheye: FisheyeSettings::default(),
            landing: LandingSettings::default(),
            worms: WormsSettings::default(),
        }
    }
}

impl PagesSettings {
    /// Clamp FPS to valid range (24-240)
    pub fn clamp_fps(&mut self) {
        self.target_fps = self.target_fps.clamp(24, 240);
    }

    /// Bring every value into a usable range
    pub fn normalize(&mut self) {
        self.clamp_fps();
        self.window_width = self.window_width.max(1);
        self.window_height = self.window_height.max(1);

        self.fisheye.slideshow_interval_ms = self.fisheye.slideshow_interval_ms.max(1);
        self.worms.photo_duration_ms = self.worms.photo_duration_ms.max(1);

        for sphere in [&mut self.fisheye.sphere, &mut self.landing.background_sphere] {
            sphere.width_segments = sphere.width_segments.max(3);
            sphere.height_segments = sphere.height_segments.max(2);
        }

        self.landing.click_oscillator.normalize();
        self.landing.link_oscillator.normalize();
    }

    /// Load settings from an XML file
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        let mut settings: Self = from_str(&contents)?;
        settings.normalize();
        Ok(settings)
    }

    /// Save settings to an XML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        let xml = to_string(self)?;
        let formatted = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{}", xml);
        fs::write(path, formatted)?;
        Ok(())
    }

    /// Settings file in the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("ImmersivePages");
            p.push("pages.xml");
            p
        })
    }

    /// Resolve settings: explicit path, then the config directory, then defaults.
    ///
    /// An explicit path that fails to load is an error; a broken file in the
    /// config directory is logged and ignored.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            tracing::info!("Loading settings from {}", path.display());
            return Self::load_from_file(path);
        }

        let Some(path) = Self::default_path() else {
            return Ok(Self::default());
        };
        if !path.exists() {
            return Ok(Self::default());
        }

        match Self::load_from_file(&path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }

    /// Asset root directory
    pub fn asset_root(&self) -> PathBuf {
        self.asset_root
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Settings-related errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    XmlWrite(#[from] quick_xml::SeError),
    #[error("Could not find config directory")]
    NoConfigDir,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PagesSettings::default();
        assert_eq!(settings.target_fps, 60);
        assert_eq!(settings.start_page, PageKind::Landing);
        assert_eq!(settings.fisheye.slideshow_interval_ms, 21_500);
        assert_eq!(settings.fisheye.photos.len(), 39);
        assert_eq!(settings.fisheye.photos[0], "photos/1.png");
        assert_eq!(settings.fisheye.photos[38], "photos/36.png");
        assert_eq!(settings.worms.photos.len(), 7);
        assert_eq!(settings.landing.models.len(), 3);
    }

    #[test]
    fn test_fps_clamping() {
        let mut settings = PagesSettings::default();
        settings.target_fps = 300;
        settings.clamp_fps();
        assert_eq!(settings.target_fps, 240);

        settings.target_fps = 10;
        settings.clamp_fps();
        assert_eq!(settings.target_fps, 24);
    }

    #[test]
    fn test_normalize_fixes_bad_values() {
        let mut settings = PagesSettings::default();
        settings.window_width = 0;
        settings.worms.photo_duration_ms = 0;
        settings.landing.click_oscillator.min = 1.0;
        settings.landing.click_oscillator.max = 0.3;
        settings.landing.click_oscillator.step = -0.05;
        settings.fisheye.sphere.width_segments = 1;
        settings.normalize();

        assert_eq!(settings.window_width, 1);
        assert_eq!(settings.worms.photo_duration_ms, 1);
        assert_eq!(settings.landing.click_oscillator.min, 0.3);
        assert_eq!(settings.landing.click_oscillator.max, 1.0);
        assert_eq!(settings.landing.click_oscillator.step, 0.05);
        assert_eq!(settings.fisheye.sphere.width_segments, 3);
    }

    #[test]
    fn test_degenerate_link_oscillator_survives_normalize() {
        let mut settings = PagesSettings::default();
        settings.normalize();
        assert!(settings.landing.link_oscillator.build().is_degenerate());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.xml");

        let mut settings = PagesSettings::default();
        settings.start_page = PageKind::Worms;
        settings.target_fps = 90;
        settings.asset_root = Some("/srv/pages".to_string());
        settings.worms.photos.truncate(2);
        settings.save_to_file(&path).unwrap();

        let loaded = PagesSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded.start_page, PageKind::Worms);
        assert_eq!(loaded.target_fps, 90);
        assert_eq!(loaded.asset_root(), PathBuf::from("/srv/pages"));
        assert_eq!(loaded.worms.photos, vec!["worms/H1.JPG", "worms/H2.JPG"]);
        assert_eq!(loaded.landing.link_url, DEFAULT_LINK_URL);
        assert_eq!(loaded.landing.fish_button.position, Vec3Setting::new(300.0, 200.0, -44.0));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pages.xml");
        fs::write(
            &path,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ImmersivePages><targetFps>500</targetFps></ImmersivePages>",
        )
        .unwrap();

        let loaded = PagesSettings::load_from_file(&path).unwrap();
        assert_eq!(loaded.target_fps, 240);
        assert_eq!(loaded.fisheye, FisheyeSettings::default());
        assert_eq!(loaded.start_page, PageKind::Landing);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = PagesSettings::resolve(Some(Path::new("/nonexistent/pages.xml")));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }
}
