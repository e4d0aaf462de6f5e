//! The size ladder: every derivative generated for one source image.
//!
//! The ladder is a fixed, ordered table of [`VariantSpec`] values. Each entry
//! names a target shape, a crop policy, and (optionally) the content-record
//! column that receives its public URL.
//!
//! | Variant | Target | Crop | Column |
//! |---|---|---|---|
//! | `hero_1600` | 1280×720 | center 16:9 | `image_large` |
//! | `hero_1200` | 1024×576 | center 16:9 | `image_standard` |
//! | `hero_800`  | 768×432  | center 16:9 | `image_tablet` |
//! | `hero_400`  | 480×270  | center 16:9 | `image_mobile` |
//! | `list_320`  | 384×384  | center square | `image_list` |
//! | `list_480`  | 512×512  | center square | - |
//! | `list_600`  | 768×768  | center square | - |
//!
//! Variant names are part of the storage path and of the column mapping, so
//! they must never change between runs. The numeric suffix is a historical
//! breakpoint label, not the output width.

use serde::Serialize;

/// Extension of every encoded variant.
pub const OUTPUT_EXTENSION: &str = "webp";

/// How a source is cropped before it is resized to the target dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CropPolicy {
    /// Resize the full frame, distorting if the aspect ratio differs.
    None,
    /// Largest centered square.
    CenterSquare,
    /// Largest centered 16:9 region; near-16:9 sources are left uncropped.
    Center16x9,
}

impl CropPolicy {
    pub fn label(self) -> &'static str {
        match self {
            CropPolicy::None => "none",
            CropPolicy::CenterSquare => "center-square",
            CropPolicy::Center16x9 => "center-16:9",
        }
    }
}

/// A named target shape in the ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VariantSpec {
    pub name: &'static str,
    pub width: u32,
    pub height: u32,
    pub crop: CropPolicy,
    /// Content-record column that stores this variant's URL, if any.
    pub column: Option<&'static str>,
}

impl VariantSpec {
    /// Stored object name, e.g. `hero_1200.webp`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, OUTPUT_EXTENSION)
    }

    /// Local scratch file name, e.g. `temp_hero_1200.webp`.
    pub fn temp_file_name(&self) -> String {
        format!("temp_{}", self.file_name())
    }
}

/// Hero images first, then list thumbnails.
pub const LADDER: [VariantSpec; 7] = [
    VariantSpec {
        name: "hero_1600",
        width: 1280,
        height: 720,
        crop: CropPolicy::Center16x9,
        column: Some("image_large"),
    },
    VariantSpec {
        name: "hero_1200",
        width: 1024,
        height: 576,
        crop: CropPolicy::Center16x9,
        column: Some("image_standard"),
    },
    VariantSpec {
        name: "hero_800",
        width: 768,
        height: 432,
        crop: CropPolicy::Center16x9,
        column: Some("image_tablet"),
    },
    VariantSpec {
        name: "hero_400",
        width: 480,
        height: 270,
        crop: CropPolicy::Center16x9,
        column: Some("image_mobile"),
    },
    VariantSpec {
        name: "list_320",
        width: 384,
        height: 384,
        crop: CropPolicy::CenterSquare,
        column: Some("image_list"),
    },
    VariantSpec {
        name: "list_480",
        width: 512,
        height: 512,
        crop: CropPolicy::CenterSquare,
        column: None,
    },
    VariantSpec {
        name: "list_600",
        width: 768,
        height: 768,
        crop: CropPolicy::CenterSquare,
        column: None,
    },
];

/// Look up a ladder entry by variant name.
pub fn find(name: &str) -> Option<&'static VariantSpec> {
    LADDER.iter().find(|spec| spec.name == name)
}

/// Column mapping: variant name → content-record column.
///
/// Partial: upload-only variants and unknown names map to `None`.
pub fn column_for(name: &str) -> Option<&'static str> {
    find(name).and_then(|spec| spec.column)
}
