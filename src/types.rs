//! Common types for container-space geometry.
//!
//! Coordinates are in meters. The container floor lies in the XZ plane at
//! `y = 0` and the Y axis points up, so `y` is always an elevation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default pitch of the placement grid in meters.
pub const DEFAULT_GRID_PITCH: f64 = 0.1;

/// Maximum distance between a base elevation and a layer's anchor for the
/// item to join that layer.
pub const LAYER_THRESHOLD: f64 = 0.01;

/// X distance under which two items in one layer count as one column and
/// are ordered by Z instead.
pub const BOX_ORDER_TOLERANCE: f64 = 0.01;

/// A point in container space.
///
/// `y` is the elevation of an item's **base**, `x` and `z` locate the
/// center of its footprint.
///
/// # Examples
/// ```
/// use stowage_planner::types::Position3D;
///
/// let dragged = Position3D::new(1.0, 0.7, -0.5);
/// assert_eq!(dragged.on_floor(), Position3D::new(1.0, 0.0, -0.5));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position3D {
    /// Creates a new position.
    ///
    /// # Parameters
    /// * `x` - Position along the container length
    /// * `y` - Elevation of the base above the floor
    /// * `z` - Position along the container width
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The container origin: floor level, centered.
    #[inline]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Returns `true` when every component is a finite number.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Same position moved down to the floor.
    #[inline]
    pub fn on_floor(&self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }
}

/// Extents of an item in meters.
///
/// `length` runs along X, `width` along Z and `height` along Y.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Dimensions {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

/// Trait for objects that may occupy a position in the container.
pub trait Positioned {
    /// Returns the base position when the object takes part in spatial checks.
    fn placement(&self) -> Option<Position3D>;
}

/// Axis-Aligned Bounding Box (AABB) in container space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Position3D,
    /// Maximum corner
    pub max: Position3D,
}

impl BoundingBox {
    /// Creates a new bounding box from its corners.
    #[inline]
    pub const fn new(min: Position3D, max: Position3D) -> Self {
        Self { min, max }
    }

    /// Creates the box of an item whose footprint is centered on
    /// `base.x`/`base.z` and whose bottom face sits at `base.y`.
    #[inline]
    pub fn from_base_center(base: Position3D, dims: Dimensions) -> Self {
        let half_length = dims.length / 2.0;
        let half_width = dims.width / 2.0;
        Self {
            min: Position3D::new(base.x - half_length, base.y, base.z - half_width),
            max: Position3D::new(
                base.x + half_length,
                base.y + dims.height,
                base.z + half_width,
            ),
        }
    }

    /// Checks if two bounding boxes share interior volume.
    ///
    /// Separating Axis Theorem for AABBs. Boxes that only touch on a face or
    /// an edge are separated, so flush placement is legal.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || self.min.x >= other.max.x
            || self.max.y <= other.min.y
            || self.min.y >= other.max.y
            || self.max.z <= other.min.z
            || self.min.z >= other.max.z)
    }

    /// Checks that `other` lies completely inside this box. Faces lying
    /// exactly on the boundary count as inside.
    #[inline]
    pub fn contains_box(&self, other: &Self) -> bool {
        other.min.x >= self.min.x
            && other.max.x <= self.max.x
            && other.min.y >= self.min.y
            && other.max.y <= self.max.y
            && other.min.z >= self.min.z
            && other.max.z <= self.max.z
    }
}
