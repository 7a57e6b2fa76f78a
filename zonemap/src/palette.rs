use raster::Rgb;
use serde::{Deserialize, Serialize};

use crate::color_match::redmean_distance;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum PaletteError {
    #[error("Palette is empty")]
    Empty,
    #[error("Palette entry '{0}' has no reference colors")]
    NoColors(String),
    #[error("Palette entry '{label}' has invalid tolerance {tolerance}")]
    InvalidTolerance { label: String, tolerance: f32 },
    #[error("Palette label '{0}' appears more than once")]
    DuplicateLabel(String),
    #[error("Unknown zone label '{0}'")]
    UnknownLabel(String),
}

/// Area zones are filled land-use parcels; overlay zones are small point
/// amenities drawn on top of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[derive(strum_macros::Display, strum_macros::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ZoneKind {
    #[default]
    Area,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub label: String,
    pub colors: Vec<Rgb>,
    pub tolerance: f32,
    /// Lower tiers are matched first.
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    pub kind: ZoneKind,
}

impl PaletteEntry {
    pub fn new(label: impl Into<String>, colors: Vec<Rgb>, tolerance: f32) -> Self {
        Self {
            label: label.into(),
            colors,
            tolerance,
            priority: 0,
            kind: ZoneKind::Area,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_kind(mut self, kind: ZoneKind) -> Self {
        self.kind = kind;
        self
    }

    /// First reference color; used to fill blocks created by hand.
    pub fn primary_color(&self) -> Rgb {
        self.colors[0]
    }

    /// Closest reference color to `color` and its distance.
    pub fn closest(&self, color: Rgb) -> (Rgb, f32) {
        self.colors
            .iter()
            .map(|&reference| (reference, redmean_distance(color, reference)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .unwrap_or((Rgb::BLACK, f32::INFINITY))
    }

    fn validate(&self) -> Result<(), PaletteError> {
        if self.colors.is_empty() {
            return Err(PaletteError::NoColors(self.label.clone()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(PaletteError::InvalidTolerance {
                label: self.label.clone(),
                tolerance: self.tolerance,
            });
        }
        Ok(())
    }
}

/// Result of classifying one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneMatch {
    pub entry: usize,
    pub reference: Rgb,
    pub distance: f32,
}

/// Validated palette, entries kept in priority order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PaletteEntry>", into = "Vec<PaletteEntry>")]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub fn new(mut entries: Vec<PaletteEntry>) -> Result<Self, PaletteError> {
        if entries.is_empty() {
            return Err(PaletteError::Empty);
        }
        for (i, entry) in entries.iter().enumerate() {
            entry.validate()?;
            if entries[..i].iter().any(|e| e.label == entry.label) {
                return Err(PaletteError::DuplicateLabel(entry.label.clone()));
            }
        }

        // Stable, so declaration order breaks ties within a tier.
        entries.sort_by_key(|e| e.priority);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> &PaletteEntry {
        &self.entries[index]
    }

    pub fn by_label(&self, label: &str) -> Result<&PaletteEntry, PaletteError> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .ok_or_else(|| PaletteError::UnknownLabel(label.to_string()))
    }

    /// Classifies `color`, walking tiers from the lowest priority value up.
    /// The first tier holding any entry within tolerance wins, and inside
    /// that tier the closest entry is chosen.
    pub fn classify(&self, color: Rgb) -> Option<ZoneMatch> {
        let mut best: Option<(u8, ZoneMatch)> = None;

        for (index, entry) in self.entries.iter().enumerate() {
            if let Some((tier, _)) = best {
                if entry.priority != tier {
                    break;
                }
            }

            let (reference, distance) = entry.closest(color);
            if distance > entry.tolerance {
                continue;
            }

            let candidate = ZoneMatch {
                entry: index,
                reference,
                distance,
            };
            match best {
                Some((_, current)) if current.distance <= distance => {}
                _ => best = Some((entry.priority, candidate)),
            }
        }

        best.map(|(_, m)| m)
    }
}

impl TryFrom<Vec<PaletteEntry>> for Palette {
    type Error = PaletteError;

    fn try_from(entries: Vec<PaletteEntry>) -> Result<Self, Self::Error> {
        Palette::new(entries)
    }
}

impl From<Palette> for Vec<PaletteEntry> {
    fn from(palette: Palette) -> Self {
        palette.entries
    }
}

impl Default for Palette {
    fn default() -> Self {
        let entries = vec![
            PaletteEntry::new(
                "Commercial",
                vec![Rgb::new(239, 68, 68), Rgb::new(220, 38, 38)],
                25.0,
            ),
            PaletteEntry::new(
                "Park",
                vec![Rgb::new(34, 197, 94), Rgb::new(22, 163, 74)],
                25.0,
            ),
            PaletteEntry::new("School", vec![Rgb::new(234, 179, 8)], 20.0)
                .with_priority(1)
                .with_kind(ZoneKind::Overlay),
            PaletteEntry::new("Hospital", vec![Rgb::new(236, 72, 153)], 20.0)
                .with_priority(1)
                .with_kind(ZoneKind::Overlay),
            PaletteEntry::new("Place of Worship", vec![Rgb::new(249, 115, 22)], 20.0)
                .with_priority(1)
                .with_kind(ZoneKind::Overlay),
            PaletteEntry::new(
                "Industrial",
                vec![Rgb::new(168, 85, 247), Rgb::new(147, 51, 234)],
                25.0,
            )
            .with_priority(2),
            PaletteEntry::new(
                "Residential",
                vec![Rgb::new(59, 130, 246), Rgb::new(96, 165, 250)],
                25.0,
            )
            .with_priority(3),
        ];

        Palette::new(entries).unwrap_or_else(|e| unreachable!("default palette is valid: {}", e))
    }
}
