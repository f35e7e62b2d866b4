//! Geometrische Hilfsfunktionen für Kollisionserkennung und Rasterung im Container.
//!
//! Dieses Modul leitet Bounding Boxes aus Ladungsstücken ab, prüft Überschneidungen
//! und Containergrenzen und rastet Koordinaten auf ein festes Gitter ein.

use crate::error::InputIssue;
use crate::model::{CargoItem, ContainerType, normalize};
use crate::types::{BoundingBox, Position3D, Positioned};

/// Berechnet die Bounding Box eines platzierten Ladungsstücks.
///
/// # Parameter
/// * `item` - Das Ladungsstück
///
/// # Rückgabewert
/// `Some(box)` für platzierte Stücke mit gültigen Maßen, sonst `None`.
/// Nicht platzierte Stücke nehmen an keiner räumlichen Prüfung teil.
pub fn item_bounding_box(item: &CargoItem) -> Option<BoundingBox> {
    let position = item.placement()?;
    match bounding_box_at(item, position) {
        Ok(bbox) => Some(bbox),
        Err(issue) => {
            tracing::debug!("Ignoriere Stück ohne gültige Maße: {}", issue);
            None
        }
    }
}

/// Berechnet die Bounding Box eines Stücks an einer Kandidatenposition.
///
/// Die Grundfläche ist auf `x`/`z` zentriert, die Unterseite liegt bei `y`.
pub fn bounding_box_at(item: &CargoItem, position: Position3D) -> Result<BoundingBox, InputIssue> {
    let dims = normalize(item)?;
    Ok(BoundingBox::from_base_center(position, dims))
}

/// Prüft, ob zwei Bounding Boxes sich räumlich überschneiden.
///
/// Boxen, die sich nur an einer Fläche oder Kante berühren, überschneiden sich
/// NICHT: bündiges Anlegen ist erlaubt, Durchdringung nicht.
///
/// # Beispiel
/// ```
/// use stowage_planner::geometry::boxes_collide;
/// use stowage_planner::types::{BoundingBox, Dimensions, Position3D};
///
/// let dims = Dimensions::new(1.0, 1.0, 1.0);
/// let a = BoundingBox::from_base_center(Position3D::new(0.0, 0.0, 0.0), dims);
/// let b = BoundingBox::from_base_center(Position3D::new(1.0, 0.0, 0.0), dims);
/// assert!(!boxes_collide(&a, &b));
/// ```
#[inline]
pub fn boxes_collide(a: &BoundingBox, b: &BoundingBox) -> bool {
    a.intersects(b)
}

/// Prüft, ob ein Stück an `position` vollständig im Container liegt.
///
/// Flächen, die exakt auf einer Containerwand oder dem Boden liegen, sind
/// zulässig. Stücke ohne gültige Maße liegen nie innerhalb.
///
/// # Parameter
/// * `item` - Das zu prüfende Stück
/// * `position` - Vorgeschlagene Position (Mitte der Grundfläche)
/// * `container` - Der Container
pub fn is_within_container_bounds(
    item: &CargoItem,
    position: Position3D,
    container: &ContainerType,
) -> bool {
    match bounding_box_at(item, position) {
        Ok(bbox) => container.bounding_box().contains_box(&bbox),
        Err(_) => false,
    }
}

/// Rastet einen Wert auf das nächste Vielfache von `pitch` ein.
///
/// Ungültige Rasterweiten (nicht positiv oder nicht endlich) und nicht
/// endliche Werte werden unverändert zurückgegeben.
///
/// # Beispiel
/// ```
/// use stowage_planner::geometry::snap_to_grid;
///
/// assert_eq!(snap_to_grid(0.26, 0.5), 0.5);
/// assert_eq!(snap_to_grid(-0.74, 0.5), -0.5);
/// ```
pub fn snap_to_grid(value: f64, pitch: f64) -> f64 {
    if !value.is_finite() || !pitch.is_finite() || pitch <= 0.0 {
        return value;
    }
    (value / pitch).round() * pitch
}

/// Rastet eine Position auf X und Z ein. Die Höhe bleibt unverändert.
pub fn snap_position(position: Position3D, pitch: f64) -> Position3D {
    Position3D::new(
        snap_to_grid(position.x, pitch),
        position.y,
        snap_to_grid(position.z, pitch),
    )
}
