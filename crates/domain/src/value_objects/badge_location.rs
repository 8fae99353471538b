//! Placement of a badge overlay on event imagery.

use common::{Outcome, ValueObject, Validator, in_range};
use serde::{Deserialize, Serialize};

/// Where and how large a badge is drawn, as fractions of the image size.
///
/// Positions are in `0.0..=1.0`, sizes in `0.05..=1.0` and rotation in
/// degrees `0..=360`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgeLocationConfig {
    position_x: f64,
    position_y: f64,
    size_width: f64,
    size_height: f64,
    rotation: f64,
}

impl BadgeLocationConfig {
    pub fn create(
        position_x: f64,
        position_y: f64,
        size_width: f64,
        size_height: f64,
        rotation: f64,
    ) -> Outcome<Self> {
        let mut validator = Validator::new();
        validator.collect(in_range(position_x, 0.0, 1.0, "Position X"));
        validator.collect(in_range(position_y, 0.0, 1.0, "Position Y"));
        validator.collect(in_range(size_width, 0.05, 1.0, "Width"));
        validator.collect(in_range(size_height, 0.05, 1.0, "Height"));
        validator.collect(in_range(rotation, 0.0, 360.0, "Rotation"));
        validator.finish_with(|| Self {
            position_x,
            position_y,
            size_width,
            size_height,
            rotation,
        })
    }

    /// Top-right corner at 26% of the image, used on listing cards.
    pub fn default_listing() -> Self {
        Self {
            position_x: 1.0,
            position_y: 0.0,
            size_width: 0.26,
            size_height: 0.26,
            rotation: 0.0,
        }
    }

    /// Same placement as listings, used on featured banners.
    pub fn default_featured() -> Self {
        Self::default_listing()
    }

    /// Top-right corner at 21% of the image, used on detail pages.
    pub fn default_detail() -> Self {
        Self {
            size_width: 0.21,
            size_height: 0.21,
            ..Self::default_listing()
        }
    }

    pub fn position_x(&self) -> f64 {
        self.position_x
    }

    pub fn position_y(&self) -> f64 {
        self.position_y
    }

    pub fn size_width(&self) -> f64 {
        self.size_width
    }

    pub fn size_height(&self) -> f64 {
        self.size_height
    }

    pub fn rotation(&self) -> f64 {
        self.rotation
    }
}

impl ValueObject for BadgeLocationConfig {}

/// Badge placement for each page context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgePlacements {
    pub listing: BadgeLocationConfig,
    pub featured: BadgeLocationConfig,
    pub detail: BadgeLocationConfig,
}

impl Default for BadgePlacements {
    fn default() -> Self {
        Self {
            listing: BadgeLocationConfig::default_listing(),
            featured: BadgeLocationConfig::default_featured(),
            detail: BadgeLocationConfig::default_detail(),
        }
    }
}
