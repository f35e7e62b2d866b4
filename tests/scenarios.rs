use stowage_planner::catalog::container_or_default;
use stowage_planner::geometry::is_within_container_bounds;
use stowage_planner::layering::{
    LayerStrategy, LayerSummary, LayeringConfig, assign_layers, calculate_layer_assignments,
    layer_summary,
};
use stowage_planner::model::{CargoItem, ContainerType, Unit, normalize};
use stowage_planner::placement::{PlacementVerdict, evaluate_placement, is_valid_placement};
use stowage_planner::{Position3D, load_metrics, snap_to_grid};

fn standard_20ft() -> ContainerType {
    container_or_default("20ft")
}

fn cube(id: &str) -> CargoItem {
    CargoItem::new(id, "Cube", (1.0, 1.0, 1.0), Unit::Meters, 25.0, 1).unwrap()
}

/// Places `item` at `position` if the validator admits it.
fn try_place(items: &mut Vec<CargoItem>, item: CargoItem, position: Position3D) -> bool {
    let container = standard_20ft();
    if !is_valid_placement(&item, position, &container, items) {
        return false;
    }
    items.retain(|existing| existing.id != item.id);
    items.push(item.placed_at(position));
    true
}

fn label_of(items: &[CargoItem], id: &str) -> (Option<u32>, Option<u32>) {
    items
        .iter()
        .find(|item| item.id == id)
        .map(|item| (item.layer_number, item.box_number_in_layer))
        .unwrap_or((None, None))
}

#[test]
fn scenario_a_empty_container() {
    let container = standard_20ft();
    assert_eq!((container.length, container.width, container.height), (5.9, 2.35, 2.39));

    let metrics = load_metrics(&[], &container);
    assert!(!metrics.is_degraded());
    assert_eq!(metrics.value.utilization_percent, 0.0);
    assert!(layer_summary(&[]).is_empty());
}

#[test]
fn scenario_b_first_item_on_the_floor() {
    let mut items = Vec::new();
    assert!(try_place(&mut items, cube("first"), Position3D::new(0.0, 0.0, 0.0)));

    let labelled = calculate_layer_assignments(&items);
    assert_eq!(label_of(&labelled, "first"), (Some(1), Some(1)));
}

#[test]
fn scenario_c_flush_neighbour_gets_next_box_number() {
    let mut items = Vec::new();
    assert!(try_place(&mut items, cube("first"), Position3D::new(0.0, 0.0, 0.0)));
    assert!(try_place(&mut items, cube("second"), Position3D::new(1.0, 0.0, 0.0)));

    let labelled = calculate_layer_assignments(&items);
    assert_eq!(label_of(&labelled, "first"), (Some(1), Some(1)));
    assert_eq!(label_of(&labelled, "second"), (Some(1), Some(2)));
    assert_eq!(
        layer_summary(&items),
        vec![LayerSummary {
            layer_number: 1,
            box_count: 2
        }]
    );
}

#[test]
fn scenario_d_overlap_is_rejected() {
    let mut items = Vec::new();
    assert!(try_place(&mut items, cube("first"), Position3D::new(0.0, 0.0, 0.0)));

    let verdict = evaluate_placement(
        &cube("second"),
        Position3D::new(0.5, 0.0, 0.0),
        &standard_20ft(),
        &items,
    );
    assert_eq!(
        verdict,
        PlacementVerdict::Collision {
            item_id: "first".to_string()
        }
    );
    assert!(!try_place(&mut items, cube("second"), Position3D::new(0.5, 0.0, 0.0)));
    assert_eq!(items.len(), 1);
}

#[test]
fn scenario_e_stacked_item_opens_second_layer() {
    let mut items = Vec::new();
    assert!(try_place(&mut items, cube("first"), Position3D::new(0.0, 0.0, 0.0)));
    assert!(try_place(&mut items, cube("stacked"), Position3D::new(0.0, 1.0, 0.0)));

    let labelled = calculate_layer_assignments(&items);
    assert_eq!(label_of(&labelled, "first"), (Some(1), Some(1)));
    assert_eq!(label_of(&labelled, "stacked"), (Some(2), Some(1)));
}

#[test]
fn removing_an_item_renumbers_the_rest() {
    let mut items = Vec::new();
    for (n, x) in [-2.0, -1.0, 0.0, 1.0].into_iter().enumerate() {
        assert!(try_place(&mut items, cube(&format!("c{}", n)), Position3D::new(x, 0.0, 0.0)));
    }
    let before = calculate_layer_assignments(&items);
    assert_eq!(label_of(&before, "c2"), (Some(1), Some(3)));

    let removed: Vec<CargoItem> = items
        .iter()
        .map(|item| if item.id == "c1" { item.unplaced() } else { item.clone() })
        .collect();
    let after = calculate_layer_assignments(&removed);
    assert_eq!(label_of(&after, "c1"), (None, None));
    assert_eq!(label_of(&after, "c2"), (Some(1), Some(2)));
    assert_eq!(label_of(&after, "c3"), (Some(1), Some(3)));
}

#[test]
fn item_filling_container_is_valid_and_any_shift_is_not() {
    let container = ContainerType::new("exact", "Exact", (2.0, 1.0, 1.5)).unwrap();
    let filler = CargoItem::new("fill", "Fill", (200.0, 100.0, 150.0), Unit::Centimeters, 1.0, 1)
        .unwrap();
    assert!(is_within_container_bounds(&filler, Position3D::origin(), &container));

    let eps = 1e-4;
    for offset in [
        Position3D::new(eps, 0.0, 0.0),
        Position3D::new(0.0, eps, 0.0),
        Position3D::new(0.0, -eps, 0.0),
        Position3D::new(0.0, 0.0, -eps),
    ] {
        assert!(!is_valid_placement(&filler, offset, &container, &[]));
    }
}

#[test]
fn snapped_drag_positions_are_reproducible() {
    let pitch = 0.1;
    let raw = [0.333, 0.349, 0.351, -1.04];
    let snapped: Vec<f64> = raw.iter().map(|v| snap_to_grid(*v, pitch)).collect();
    for value in &snapped {
        assert_eq!(snap_to_grid(*value, pitch), *value);
    }
    assert_eq!(snapped[0], snapped[1]);
}

#[test]
fn centimeter_items_validate_in_meters() {
    let declared = (120.0, 80.0, 100.0);
    let pallet =
        CargoItem::new("pallet", "Euro pallet", declared, Unit::Centimeters, 250.0, 1).unwrap();
    let dims = normalize(&pallet).unwrap();
    assert!((dims.length - 1.2).abs() < 1e-12);

    let container = standard_20ft();
    assert!(is_valid_placement(&pallet, Position3D::new(-2.0, 0.0, 0.5), &container, &[]));
    // 1.2 m long: a center at x = 2.5 pushes the far face past 2.95
    assert!(!is_valid_placement(&pallet, Position3D::new(2.5, 0.0, 0.0), &container, &[]));
}

#[test]
fn sorted_linkage_matches_default_on_clean_layouts() {
    let mut items = Vec::new();
    for (n, (x, y)) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (2.0, 0.0)]
        .into_iter()
        .enumerate()
    {
        items.push(cube(&format!("c{}", n)).placed_at(Position3D::new(x, y, 0.0)));
    }

    let default = assign_layers(&items, &LayeringConfig::default());
    let linkage = assign_layers(
        &items,
        &LayeringConfig::default().with_strategy(LayerStrategy::SortedLinkage),
    );
    assert_eq!(default.items, linkage.items);
    assert_eq!(default.summary(), linkage.summary());
}
