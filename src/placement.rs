//! Placement validation.
//!
//! A placement is admissible when the item lies completely inside the
//! container and shares no volume with any other placed item. Validation
//! has no side effects and is cheap enough to run on every pointer move.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::InputIssue;
use crate::geometry::{bounding_box_at, boxes_collide, item_bounding_box, snap_position};
use crate::model::{CargoItem, ContainerType};
use crate::types::Position3D;

/// Result of checking one candidate placement.
#[derive(Clone, Debug, PartialEq)]
pub enum PlacementVerdict {
    Valid,
    /// At least one face sticks out of the container.
    OutOfBounds,
    /// The candidate overlaps the placed item with this id.
    Collision { item_id: String },
    /// The candidate's dimensions cannot be normalized.
    MalformedItem(InputIssue),
}

impl PlacementVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, PlacementVerdict::Valid)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementVerdict::Valid => "valid",
            PlacementVerdict::OutOfBounds => "out_of_bounds",
            PlacementVerdict::Collision { .. } => "collision",
            PlacementVerdict::MalformedItem(_) => "malformed_item",
        }
    }

    /// Id of the placed item blocking the candidate, if any.
    pub fn blocking_item_id(&self) -> Option<&str> {
        match self {
            PlacementVerdict::Collision { item_id } => Some(item_id),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlacementVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlacementVerdict::Valid => write!(f, "Placement is valid"),
            PlacementVerdict::OutOfBounds => {
                write!(f, "Item extends beyond the container walls, floor or ceiling")
            }
            PlacementVerdict::Collision { item_id } => {
                write!(f, "Item overlaps placed item '{}'", item_id)
            }
            PlacementVerdict::MalformedItem(issue) => {
                write!(f, "Item cannot be placed: {}", issue)
            }
        }
    }
}

/// Returns the first placed item (in input order) whose volume overlaps
/// `item` at `position`.
///
/// Items sharing `item`'s id and items that are not placed are skipped. An
/// item with malformed dimensions collides with nothing.
pub fn find_collision<'a>(
    item: &CargoItem,
    position: Position3D,
    placed_items: &'a [CargoItem],
) -> Option<&'a CargoItem> {
    let candidate = bounding_box_at(item, position).ok()?;
    placed_items
        .iter()
        .filter(|other| other.id != item.id)
        .find(|other| {
            item_bounding_box(other).is_some_and(|placed| boxes_collide(&candidate, &placed))
        })
}

/// Checks whether `item` at `position` overlaps any other placed item.
pub fn check_collision_with_placed_items(
    item: &CargoItem,
    position: Position3D,
    placed_items: &[CargoItem],
) -> bool {
    find_collision(item, position, placed_items).is_some()
}

/// Evaluates a candidate placement and explains the outcome.
///
/// # Parameters
/// * `item` - The item being placed
/// * `position` - Candidate base position
/// * `container` - The container
/// * `placed_items` - Current item list; unplaced entries and `item` itself
///   are ignored
pub fn evaluate_placement(
    item: &CargoItem,
    position: Position3D,
    container: &ContainerType,
    placed_items: &[CargoItem],
) -> PlacementVerdict {
    let candidate = match bounding_box_at(item, position) {
        Ok(bbox) => bbox,
        Err(issue) => {
            tracing::warn!("⚠️ Rejecting placement of malformed item: {}", issue);
            return PlacementVerdict::MalformedItem(issue);
        }
    };

    if !container.bounding_box().contains_box(&candidate) {
        return PlacementVerdict::OutOfBounds;
    }

    match find_collision(item, position, placed_items) {
        Some(other) => PlacementVerdict::Collision {
            item_id: other.id.clone(),
        },
        None => PlacementVerdict::Valid,
    }
}

/// The single gate before a position change is committed.
///
/// Admissible iff the item stays inside the container and overlaps none of
/// the other placed items.
pub fn is_valid_placement(
    item: &CargoItem,
    position: Position3D,
    container: &ContainerType,
    placed_items: &[CargoItem],
) -> bool {
    evaluate_placement(item, position, container, placed_items).is_valid()
}

/// One evaluated pointer position of a drag gesture.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PreviewStep {
    /// Index of the raw position in the gesture
    pub index: usize,
    /// Snapped position that was evaluated
    pub position: Position3D,
    pub valid: bool,
    pub code: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking_item_id: Option<String>,
}

impl PreviewStep {
    fn new(index: usize, position: Position3D, verdict: &PlacementVerdict) -> Self {
        Self {
            index,
            position,
            valid: verdict.is_valid(),
            code: verdict.code().to_string(),
            reason: verdict.to_string(),
            blocking_item_id: verdict.blocking_item_id().map(str::to_string),
        }
    }
}

/// Evaluates the raw pointer positions of a drag gesture.
///
/// Each position is snapped to the grid on X and Z and dropped to the floor
/// before validation, the way drag previews are placed. The callback sees
/// every step as it is produced and may stop the gesture early by returning
/// `false`.
pub fn preview_path(
    item: &CargoItem,
    raw_positions: &[Position3D],
    container: &ContainerType,
    placed_items: &[CargoItem],
    pitch: f64,
    mut on_step: impl FnMut(&PreviewStep) -> bool,
) -> Vec<PreviewStep> {
    let mut steps = Vec::with_capacity(raw_positions.len());
    for (index, raw) in raw_positions.iter().enumerate() {
        let position = snap_position(*raw, pitch).on_floor();
        let verdict = evaluate_placement(item, position, container, placed_items);
        let step = PreviewStep::new(index, position, &verdict);
        let keep_going = on_step(&step);
        steps.push(step);
        if !keep_going {
            tracing::debug!("Drag preview stopped after {} steps", steps.len());
            break;
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Unit;
    use crate::types::DEFAULT_GRID_PITCH;

    fn cube(id: &str) -> CargoItem {
        CargoItem::new(id, "Cube", (1.0, 1.0, 1.0), Unit::Meters, 10.0, 1).unwrap()
    }

    fn container() -> ContainerType {
        ContainerType::new("test", "Test", (6.0, 2.0, 2.0)).unwrap()
    }

    #[test]
    fn empty_container_accepts_floor_placement() {
        let verdict = evaluate_placement(&cube("a"), Position3D::origin(), &container(), &[]);
        assert_eq!(verdict, PlacementVerdict::Valid);
        assert_eq!(verdict.code(), "valid");
    }

    #[test]
    fn flush_neighbour_is_accepted() {
        let placed = vec![cube("a").placed_at(Position3D::origin())];
        assert!(is_valid_placement(
            &cube("b"),
            Position3D::new(1.0, 0.0, 0.0),
            &container(),
            &placed
        ));
    }

    #[test]
    fn overlapping_neighbour_is_rejected_with_its_id() {
        let placed = vec![cube("a").placed_at(Position3D::origin())];
        let verdict = evaluate_placement(
            &cube("b"),
            Position3D::new(0.5, 0.0, 0.0),
            &container(),
            &placed,
        );
        assert_eq!(
            verdict,
            PlacementVerdict::Collision {
                item_id: "a".to_string()
            }
        );
        assert_eq!(verdict.blocking_item_id(), Some("a"));
        assert!(!verdict.is_valid());
    }

    #[test]
    fn out_of_bounds_is_checked_before_collisions() {
        let placed = vec![cube("a").placed_at(Position3D::new(2.5, 0.0, 0.0))];
        let verdict = evaluate_placement(
            &cube("b"),
            Position3D::new(2.8, 0.0, 0.0),
            &container(),
            &placed,
        );
        assert_eq!(verdict, PlacementVerdict::OutOfBounds);
    }

    #[test]
    fn item_does_not_collide_with_itself() {
        let moving = cube("a").placed_at(Position3D::origin());
        let placed = vec![moving.clone()];
        assert!(is_valid_placement(
            &moving,
            Position3D::new(0.3, 0.0, 0.0),
            &container(),
            &placed
        ));
    }

    #[test]
    fn unplaced_and_inconsistent_items_are_ignored() {
        let mut ghost = cube("ghost");
        ghost.position = Some(Position3D::origin());
        let placed = vec![cube("loose"), ghost];
        assert!(!check_collision_with_placed_items(
            &cube("b"),
            Position3D::origin(),
            &placed
        ));
    }

    #[test]
    fn malformed_candidate_is_reported() {
        let mut item = cube("bad");
        item.width = -1.0;
        let verdict = evaluate_placement(&item, Position3D::origin(), &container(), &[]);
        assert_eq!(verdict.code(), "malformed_item");
        assert!(!is_valid_placement(&item, Position3D::origin(), &container(), &[]));
    }

    #[test]
    fn validation_does_not_mutate_inputs() {
        let placed = vec![cube("a").placed_at(Position3D::origin())];
        let snapshot = placed.clone();
        let item = cube("b");
        for _ in 0..3 {
            let candidate = Position3D::new(0.5, 0.0, 0.0);
            let _ = is_valid_placement(&item, candidate, &container(), &placed);
        }
        assert_eq!(placed, snapshot);
        assert_eq!(item, cube("b"));
    }

    #[test]
    fn collision_reports_first_blocking_item_in_input_order() {
        let wide = CargoItem::new("wide", "Wide", (3.0, 1.0, 1.0), Unit::Meters, 1.0, 1).unwrap();
        let placed = vec![
            cube("left").placed_at(Position3D::new(-1.0, 0.0, 0.0)),
            cube("right").placed_at(Position3D::new(1.0, 0.0, 0.0)),
        ];
        let blocking = find_collision(&wide, Position3D::origin(), &placed).map(|i| i.id.as_str());
        assert_eq!(blocking, Some("left"));
    }

    #[test]
    fn preview_path_snaps_and_evaluates_each_position() {
        let placed = vec![cube("a").placed_at(Position3D::origin())];
        let raw = vec![
            Position3D::new(1.04, 0.7, 0.02),
            Position3D::new(0.46, 0.0, 0.0),
            Position3D::new(9.0, 0.0, 0.0),
        ];
        let steps = preview_path(
            &cube("b"),
            &raw,
            &container(),
            &placed,
            DEFAULT_GRID_PITCH,
            |_| true,
        );

        assert_eq!(steps.len(), 3);
        assert!(steps[0].valid);
        assert_eq!(steps[0].position.y, 0.0);
        assert!((steps[0].position.x - 1.0).abs() < 1e-12);
        assert_eq!(steps[1].code, "collision");
        assert_eq!(steps[1].blocking_item_id.as_deref(), Some("a"));
        assert_eq!(steps[2].code, "out_of_bounds");
    }

    #[test]
    fn preview_path_stops_when_callback_declines() {
        let raw = vec![Position3D::origin(); 5];
        let mut seen = 0;
        let steps = preview_path(&cube("b"), &raw, &container(), &[], 0.1, |_| {
            seen += 1;
            seen < 2
        });
        assert_eq!(steps.len(), 2);
        assert_eq!(seen, 2);
    }
}
