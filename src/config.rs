use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use serde::de::{self, Deserializer};

/// Top-level configuration: crop-editor behavior plus the card templates the
/// compositor can render. Everything has built-in defaults mirroring the
/// classic participation card, so a config file is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub editor: EditorOptions,
    pub font: FontOptions,
    pub templates: BTreeMap<String, CardTemplate>,
}

impl Default for Config {
    fn default() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert("participation".to_string(), CardTemplate::participation());
        templates.insert("photo-frame".to_string(), CardTemplate::photo_frame());
        Self {
            editor: EditorOptions::default(),
            font: FontOptions::default(),
            templates,
        }
    }
}

impl Config {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg: Self = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(cfg)
    }

    pub fn template(&self, name: &str) -> Option<&CardTemplate> {
        self.templates.get(name)
    }

    pub fn validate(&self) -> Result<()> {
        self.editor.validate()?;
        ensure!(!self.templates.is_empty(), "no card templates configured");
        for (name, template) in &self.templates {
            template
                .validate()
                .with_context(|| format!("template {name:?} is invalid"))?;
        }
        Ok(())
    }
}

/// Crop-editor tuning. `handle-size` is the hit-test region; `marker-size`
/// is the drawn square, kept generous for touch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EditorOptions {
    pub min_crop_size: f32,
    pub handle_size: f32,
    pub marker_size: f32,
    pub layout: HandleLayout,
    pub max_canvas_width: u32,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            min_crop_size: 50.0,
            handle_size: 25.0,
            marker_size: 20.0,
            layout: HandleLayout::SingleCorner,
            max_canvas_width: 400,
        }
    }
}

impl EditorOptions {
    fn validate(&self) -> Result<()> {
        ensure!(self.min_crop_size > 0.0, "min-crop-size must be positive");
        ensure!(self.handle_size > 0.0, "handle-size must be positive");
        ensure!(self.marker_size > 0.0, "marker-size must be positive");
        ensure!(
            self.max_canvas_width as f32 > self.min_crop_size,
            "max-canvas-width must exceed min-crop-size"
        );
        Ok(())
    }
}

/// Which grab points the crop editor exposes. `single-corner` keeps the crop
/// square and resizes from the bottom-right only; `eight-handle` resizes each
/// axis independently from any corner or edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandleLayout {
    SingleCorner,
    EightHandle,
}

/// Font selection for the text layers: an explicit file wins, otherwise the
/// family is looked up among the system fonts with a sans-serif fallback.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FontOptions {
    pub path: Option<PathBuf>,
    pub family: Option<String>,
}

/// One card layout: output dimensions plus the optional layers, drawn in a
/// fixed order (background, stars, confetti, photo, text, overlay).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CardTemplate {
    pub width: u32,
    pub height: u32,
    pub background: Background,
    #[serde(default)]
    pub stars: Option<StarField>,
    #[serde(default)]
    pub confetti: Option<ConfettiOptions>,
    #[serde(default)]
    pub photo: Option<PhotoRegion>,
    #[serde(default)]
    pub text: Vec<TextLine>,
    #[serde(default)]
    pub overlay: Option<PathBuf>,
    #[serde(default = "CardTemplate::default_file_stem")]
    pub file_stem: String,
}

impl CardTemplate {
    fn default_file_stem() -> String {
        "participation-card".to_string()
    }

    /// The classic 4:3 participation card: amber gradient, eight stars,
    /// confetti, circular photo with a white ring, five text lines.
    pub fn participation() -> Self {
        Self {
            width: 1200,
            height: 900,
            background: Background::LinearGradient {
                start: Rgb([0xFE, 0xF3, 0xC7]),
                end: Rgb([0xFC, 0xD3, 0x4D]),
            },
            stars: Some(StarField {
                positions: vec![
                    (120.0, 120.0),
                    (1080.0, 140.0),
                    (150.0, 400.0),
                    (1050.0, 420.0),
                    (80.0, 650.0),
                    (1120.0, 680.0),
                    (180.0, 800.0),
                    (1020.0, 820.0),
                ],
                outer_radius: 15.0,
                inner_radius: 5.0,
                points: 8,
                color: Rgb([0xF5, 0x9E, 0x0B]),
            }),
            confetti: Some(ConfettiOptions::default()),
            photo: Some(PhotoRegion {
                x: 475.0,
                y: 80.0,
                width: 250.0,
                height: 250.0,
                shape: RegionShape::Circle,
                border: Some(BorderStroke {
                    color: Rgb([0xFF, 0xFF, 0xFF]),
                    width: 6.0,
                }),
            }),
            text: vec![
                TextLine {
                    template: "Hello, I'm {name}".to_string(),
                    size: 48.0,
                    color: Rgb([0x1F, 0x29, 0x37]),
                    baseline: 420.0,
                },
                TextLine {
                    template: "and I just participated in".to_string(),
                    size: 42.0,
                    color: Rgb([0x1F, 0x29, 0x37]),
                    baseline: 500.0,
                },
                TextLine {
                    template: "Zero to Maker".to_string(),
                    size: 56.0,
                    color: Rgb([0xDC, 0x26, 0x26]),
                    baseline: 600.0,
                },
                TextLine {
                    template: "by Tinkerhub MBCCET".to_string(),
                    size: 48.0,
                    color: Rgb([0x1F, 0x29, 0x37]),
                    baseline: 680.0,
                },
                TextLine {
                    template: "Tinkerhub MBCCET".to_string(),
                    size: 36.0,
                    color: Rgb([0x6B, 0x72, 0x80]),
                    baseline: 820.0,
                },
            ],
            overlay: None,
            file_stem: Self::default_file_stem(),
        }
    }

    /// Square photo-in-frame card: no text or decorations, a large
    /// rounded-rect photo window over the background art.
    pub fn photo_frame() -> Self {
        Self {
            width: 1920,
            height: 1920,
            background: Background::LinearGradient {
                start: Rgb([0x0F, 0x17, 0x2A]),
                end: Rgb([0x33, 0x41, 0x55]),
            },
            stars: None,
            confetti: None,
            photo: Some(PhotoRegion {
                x: 360.0,
                y: 360.0,
                width: 1200.0,
                height: 1200.0,
                shape: RegionShape::RoundedRect { radius: 48.0 },
                border: Some(BorderStroke {
                    color: Rgb([0xF8, 0xFA, 0xFC]),
                    width: 10.0,
                }),
            }),
            text: Vec::new(),
            overlay: None,
            file_stem: "framed-photo".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.width > 0 && self.height > 0,
            "card dimensions must be positive"
        );
        if let Some(stars) = &self.stars {
            ensure!(stars.points >= 3, "stars need at least 3 points");
            ensure!(
                stars.inner_radius > 0.0 && stars.inner_radius < stars.outer_radius,
                "star inner radius must sit inside the outer radius"
            );
        }
        if let Some(confetti) = &self.confetti {
            ensure!(!confetti.palette.is_empty(), "confetti palette is empty");
            ensure!(
                confetti.min_size > 0.0 && confetti.min_size <= confetti.max_size,
                "confetti size range is inverted"
            );
        }
        if let Some(photo) = &self.photo {
            ensure!(
                photo.width >= 1.0 && photo.height >= 1.0,
                "photo region must be at least 1x1"
            );
            ensure!(
                photo.x >= 0.0
                    && photo.y >= 0.0
                    && photo.x + photo.width <= self.width as f32
                    && photo.y + photo.height <= self.height as f32,
                "photo region exceeds the card canvas"
            );
        }
        for line in &self.text {
            ensure!(line.size > 0.0, "text size must be positive");
            ensure!(
                line.baseline > 0.0 && line.baseline <= self.height as f32,
                "text baseline {} is outside the card",
                line.baseline
            );
        }
        Ok(())
    }
}

/// Bottom layer of a card: a diagonal two-stop gradient or cover-fit art.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Background {
    LinearGradient { start: Rgb, end: Rgb },
    Image { path: PathBuf },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StarField {
    pub positions: Vec<(f32, f32)>,
    #[serde(default = "StarField::default_outer_radius")]
    pub outer_radius: f32,
    #[serde(default = "StarField::default_inner_radius")]
    pub inner_radius: f32,
    #[serde(default = "StarField::default_points")]
    pub points: u32,
    pub color: Rgb,
}

impl StarField {
    fn default_outer_radius() -> f32 {
        15.0
    }

    fn default_inner_radius() -> f32 {
        5.0
    }

    fn default_points() -> u32 {
        8
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfettiOptions {
    pub count: usize,
    pub palette: Vec<Rgb>,
    pub min_size: f32,
    pub max_size: f32,
}

impl Default for ConfettiOptions {
    fn default() -> Self {
        Self {
            count: 40,
            palette: vec![
                Rgb([0xEF, 0x44, 0x44]),
                Rgb([0x3B, 0x82, 0xF6]),
                Rgb([0x10, 0xB9, 0x81]),
                Rgb([0xF5, 0x9E, 0x0B]),
                Rgb([0x8B, 0x5C, 0xF6]),
            ],
            min_size: 4.0,
            max_size: 12.0,
        }
    }
}

/// Destination window for the user photo, in card pixels. The photo is
/// cover-fit into the region and clipped to its shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PhotoRegion {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub shape: RegionShape,
    #[serde(default)]
    pub border: Option<BorderStroke>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RegionShape {
    Circle,
    RoundedRect { radius: f32 },
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BorderStroke {
    pub color: Rgb,
    pub width: f32,
}

/// One centered line of card text. `{name}` in the template interpolates the
/// user-provided name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TextLine {
    pub template: String,
    pub size: f32,
    pub color: Rgb,
    pub baseline: f32,
}

/// An sRGB color configured as `"#RRGGBB"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn r(&self) -> u8 {
        self.0[0]
    }

    pub fn g(&self) -> u8 {
        self.0[1]
    }

    pub fn b(&self) -> u8 {
        self.0[2]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

impl std::str::FromStr for Rgb {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let hex = raw
            .strip_prefix('#')
            .ok_or_else(|| format!("color {raw:?} must start with '#'"))?;
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(format!("color {raw:?} must be #RRGGBB"));
        }
        let parse = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| format!("color {raw:?} must be #RRGGBB"))
        };
        Ok(Self([parse(0..2)?, parse(2..4)?, parse(4..6)?]))
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        cfg.validate().unwrap();
        assert!(cfg.template("participation").is_some());
        assert!(cfg.template("photo-frame").is_some());
    }

    #[test]
    fn rgb_parses_hex() {
        let c: Rgb = "#FEF3C7".parse().unwrap();
        assert_eq!(c, Rgb([0xFE, 0xF3, 0xC7]));
        assert_eq!(c.to_string(), "#FEF3C7");
    }

    #[test]
    fn rgb_rejects_malformed() {
        assert!("FEF3C7".parse::<Rgb>().is_err());
        assert!("#FEF3".parse::<Rgb>().is_err());
        assert!("#GGGGGG".parse::<Rgb>().is_err());
    }

    #[test]
    fn photo_region_outside_canvas_rejected() {
        let mut template = CardTemplate::participation();
        if let Some(photo) = template.photo.as_mut() {
            photo.x = 1100.0;
        }
        assert!(template.validate().is_err());
    }
}
