//! Data models for container load planning.
//!
//! This module defines the records the planner works on:
//! - `CargoItem`: a loadable unit with declared dimensions, weight and an
//!   optional placement inside the container
//! - `ContainerType`: the fixed-size cargo space
//! - `Unit`: the unit the dimensions of a cargo item were declared in
//!
//! Positions and container dimensions are always in meters. Item dimensions
//! are normalized to meters on demand.

use serde::{Deserialize, Deserializer, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{InputIssue, ValidationError};
use crate::types::{BoundingBox, Dimensions, Position3D, Positioned};

/// Unit in which the dimensions of a cargo item are declared.
///
/// Unknown unit strings deserialize to `Unrecognized` instead of failing, so
/// one bad item does not reject a whole item list. The planner reports such
/// items through [`InputIssue::UnrecognizedUnit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub enum Unit {
    #[serde(rename = "cm")]
    Centimeters,
    #[serde(rename = "m")]
    Meters,
    #[serde(rename = "unrecognized")]
    Unrecognized,
}

impl Unit {
    /// Parses a unit name, accepting short and long spellings.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cm" | "centimeter" | "centimeters" | "centimetre" | "centimetres" => {
                Unit::Centimeters
            }
            "m" | "meter" | "meters" | "metre" | "metres" => Unit::Meters,
            _ => Unit::Unrecognized,
        }
    }

    /// Converts a single magnitude to meters.
    fn to_meters(self, value: f64) -> Option<f64> {
        match self {
            Unit::Centimeters => Some(value / 100.0),
            Unit::Meters => Some(value),
            Unit::Unrecognized => None,
        }
    }
}

impl<'de> Deserialize<'de> for Unit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Unit::parse(&raw))
    }
}

fn default_quantity() -> u32 {
    1
}

/// A loadable unit.
///
/// `quantity` identical units are treated as one volumetric and weight
/// entry; they are not placeable separately.
///
/// `position` is meant to be defined exactly when `is_placed` is `true`.
/// Inconsistent records are tolerated: [`Positioned::placement`] only
/// reports a position when both agree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "cargo-1",
    "name": "Euro pallet",
    "length": 120.0,
    "width": 80.0,
    "height": 100.0,
    "unit": "cm",
    "weight": 250.0,
    "quantity": 1,
    "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
    "isPlaced": true
}))]
pub struct CargoItem {
    pub id: String,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub unit: Unit,
    /// Weight of a single unit in kg
    pub weight: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position3D>,
    #[serde(default)]
    pub is_placed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub box_number_in_layer: Option<u32>,
}

impl CargoItem {
    /// Creates a new, unplaced cargo item with validation.
    ///
    /// # Parameters
    /// * `id` - Stable identifier
    /// * `name` - Display name, must not be blank
    /// * `dims` - Declared (length, width, height) in `unit`
    /// * `unit` - Unit of `dims`
    /// * `weight` - Weight of one unit in kg
    /// * `quantity` - Number of identical units, at least 1
    ///
    /// # Examples
    /// ```
    /// use stowage_planner::model::{CargoItem, Unit};
    ///
    /// let ok = CargoItem::new("a", "Crate", (120.0, 80.0, 60.0), Unit::Centimeters, 40.0, 2);
    /// assert!(ok.is_ok());
    ///
    /// let bad = CargoItem::new("b", "Crate", (0.0, 80.0, 60.0), Unit::Centimeters, 40.0, 2);
    /// assert!(bad.is_err());
    /// ```
    pub fn new(
        id: impl Into<String>,
        name: &str,
        dims: (f64, f64, f64),
        unit: Unit,
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidName(
                "name must not be blank".to_string(),
            ));
        }
        if unit == Unit::Unrecognized {
            return Err(ValidationError::InvalidUnit(
                "unit must be 'cm' or 'm'".to_string(),
            ));
        }
        validate_dimension(dims.0, "Length")?;
        validate_dimension(dims.1, "Width")?;
        validate_dimension(dims.2, "Height")?;
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ValidationError::InvalidWeight(format!(
                "Weight must be positive, got: {}",
                weight
            )));
        }
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(
                "quantity must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            id: id.into(),
            name: name.to_string(),
            length: dims.0,
            width: dims.1,
            height: dims.2,
            unit,
            weight,
            quantity,
            position: None,
            is_placed: false,
            layer_number: None,
            box_number_in_layer: None,
        })
    }

    /// Returns a copy placed at `position`.
    ///
    /// Layer labels are dropped because they belong to the previous layout.
    pub fn placed_at(&self, position: Position3D) -> Self {
        Self {
            position: Some(position),
            is_placed: true,
            layer_number: None,
            box_number_in_layer: None,
            ..self.clone()
        }
    }

    /// Returns a copy taken out of the container.
    pub fn unplaced(&self) -> Self {
        Self {
            position: None,
            is_placed: false,
            layer_number: None,
            box_number_in_layer: None,
            ..self.clone()
        }
    }

    /// Returns a copy with the given layer labels.
    pub fn with_layer_labels(&self, layer_number: Option<u32>, box_number: Option<u32>) -> Self {
        Self {
            layer_number,
            box_number_in_layer: box_number,
            ..self.clone()
        }
    }

    /// Number of units this entry stands for. A quantity of 0 counts as 1.
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.max(1)
    }
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || !value.is_finite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// Converts an item's declared dimensions to meters.
///
/// Centimeter values are divided by 100, meter values pass through. An
/// unrecognized unit or a non-positive, non-finite magnitude is reported as
/// an [`InputIssue`].
pub fn normalize(item: &CargoItem) -> Result<Dimensions, InputIssue> {
    let convert = |value: f64, axis: &str| -> Result<f64, InputIssue> {
        let meters = item
            .unit
            .to_meters(value)
            .ok_or_else(|| InputIssue::UnrecognizedUnit {
                item_id: item.id.clone(),
            })?;
        if !meters.is_finite() || meters <= 0.0 {
            return Err(InputIssue::InvalidDimension {
                item_id: item.id.clone(),
                axis: axis.to_string(),
                value,
            });
        }
        Ok(meters)
    };

    Ok(Dimensions::new(
        convert(item.length, "length")?,
        convert(item.width, "width")?,
        convert(item.height, "height")?,
    ))
}

impl Positioned for CargoItem {
    fn placement(&self) -> Option<Position3D> {
        if !self.is_placed {
            return None;
        }
        self.position.filter(Position3D::is_finite)
    }
}

/// A fixed-size cargo space.
///
/// The container is centered on the origin in the floor plane: it spans
/// `x ∈ [-length/2, length/2]`, `z ∈ [-width/2, width/2]` and
/// `y ∈ [0, height]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": "20ft",
    "name": "20ft Standard",
    "length": 5.9,
    "width": 2.35,
    "height": 2.39,
    "displayLabel": "20ft Container (5.9m × 2.35m × 2.39m)"
}))]
pub struct ContainerType {
    pub id: String,
    pub name: String,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub display_label: String,
}

impl ContainerType {
    /// Creates a custom container type after validating the dimensions.
    ///
    /// # Parameters
    /// * `id` - Identifier of the container type
    /// * `name` - Display name
    /// * `dims` - (length, width, height) in meters
    pub fn new(
        id: impl Into<String>,
        name: &str,
        dims: (f64, f64, f64),
    ) -> Result<Self, ValidationError> {
        validate_dimension(dims.0, "Container length")?;
        validate_dimension(dims.1, "Container width")?;
        validate_dimension(dims.2, "Container height")?;
        let name = name.trim().to_string();
        let display_label = format!("{} ({}m × {}m × {}m)", name, dims.0, dims.1, dims.2);
        Ok(Self {
            id: id.into(),
            name,
            length: dims.0,
            width: dims.1,
            height: dims.2,
            display_label,
        })
    }

    /// Interior volume in cubic meters. Non-finite or negative products
    /// count as zero.
    pub fn volume(&self) -> f64 {
        let volume = self.length * self.width * self.height;
        if volume.is_finite() && volume > 0.0 {
            volume
        } else {
            0.0
        }
    }

    /// The cargo space as a bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            Position3D::new(-self.length / 2.0, 0.0, -self.width / 2.0),
            Position3D::new(self.length / 2.0, self.height, self.width / 2.0),
        )
    }
}
