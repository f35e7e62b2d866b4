//! Layer detection and box numbering for placed cargo.
//!
//! Placed items are grouped into horizontal layers by the elevation of their
//! base. Layers are numbered bottom-up starting at 1, and the items of each
//! layer are numbered left to right (ascending X), front to back (ascending
//! Z) for items standing in the same column. Labels are recomputed from
//! scratch on every call; the caller's items are never mutated.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::CargoItem;
use crate::types::{BOX_ORDER_TOLERANCE, LAYER_THRESHOLD, Positioned};

/// How placed items are clustered into layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LayerStrategy {
    /// Items are scanned in input order and join the first layer whose
    /// anchor (the base of its first member) is closer than the threshold.
    /// Membership can depend on input order.
    #[default]
    FirstEncounter,
    /// Elevations are sorted and a new layer starts wherever the gap to the
    /// next lower elevation reaches the threshold. Membership does not depend
    /// on input order.
    SortedLinkage,
}

impl LayerStrategy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "first_encounter" | "first" | "compat" => Some(LayerStrategy::FirstEncounter),
            "sorted_linkage" | "sorted" | "linkage" => Some(LayerStrategy::SortedLinkage),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayerStrategy::FirstEncounter => "first_encounter",
            LayerStrategy::SortedLinkage => "sorted_linkage",
        }
    }
}

/// Tolerances and strategy for layer detection and box numbering.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LayeringConfig {
    /// Elevation distance below which two bases share a layer
    pub threshold: f64,
    /// X distance up to which items in one layer are ordered by Z
    pub box_order_tolerance: f64,
    pub strategy: LayerStrategy,
}

impl Default for LayeringConfig {
    fn default() -> Self {
        Self {
            threshold: LAYER_THRESHOLD,
            box_order_tolerance: BOX_ORDER_TOLERANCE,
            strategy: LayerStrategy::default(),
        }
    }
}

impl LayeringConfig {
    pub fn with_strategy(mut self, strategy: LayerStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// A horizontal band of placed items.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// 1-based, increasing with elevation
    pub layer_number: u32,
    /// Base elevation of the layer's anchor
    pub min_y: f64,
    /// Highest base elevation among the members
    pub max_y: f64,
    /// Member ids in input order
    pub item_ids: Vec<String>,
    /// Input positions of the members, parallel to `item_ids`
    #[serde(skip)]
    member_indices: Vec<usize>,
}

/// Number of boxes per layer, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub layer_number: u32,
    pub box_count: usize,
}

/// Annotated items together with the layers they were assigned from.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct LayerAssignment {
    pub items: Vec<CargoItem>,
    pub layers: Vec<Layer>,
}

impl LayerAssignment {
    pub fn summary(&self) -> Vec<LayerSummary> {
        summarize(&self.layers)
    }
}

/// Layer under construction. Members carry their input index so that the
/// final id list is in input order regardless of strategy.
#[derive(Clone, Debug)]
struct LayerAccumulator<'a> {
    anchor_y: f64,
    max_y: f64,
    members: Vec<(usize, &'a str)>,
}

impl<'a> LayerAccumulator<'a> {
    fn open(index: usize, id: &'a str, y: f64) -> Self {
        Self {
            anchor_y: y,
            max_y: y,
            members: vec![(index, id)],
        }
    }

    fn join(&mut self, index: usize, id: &'a str, y: f64) {
        self.max_y = self.max_y.max(y);
        self.members.push((index, id));
    }
}

/// Groups placed items into layers with the default configuration.
pub fn detect_layers(items: &[CargoItem]) -> Vec<Layer> {
    detect_layers_with(items, &LayeringConfig::default())
}

/// Groups placed items into layers.
///
/// Only items with a consistent placement take part. Layers are sorted
/// ascending by their anchor elevation and numbered 1..N in that order.
pub fn detect_layers_with(items: &[CargoItem], config: &LayeringConfig) -> Vec<Layer> {
    let participants: Vec<(usize, &str, f64)> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| item.placement().map(|pos| (index, item.id.as_str(), pos.y)))
        .collect();

    if participants.is_empty() {
        return Vec::new();
    }

    let mut accumulators = match config.strategy {
        LayerStrategy::FirstEncounter => cluster_first_encounter(&participants, config.threshold),
        LayerStrategy::SortedLinkage => cluster_sorted_linkage(&participants, config.threshold),
    };

    accumulators.sort_by(|a, b| a.anchor_y.total_cmp(&b.anchor_y));

    let layers: Vec<Layer> = accumulators
        .into_iter()
        .enumerate()
        .map(|(position, mut acc)| {
            acc.members.sort_by_key(|(index, _)| *index);
            let (member_indices, item_ids) = acc
                .members
                .into_iter()
                .map(|(index, id)| (index, id.to_string()))
                .unzip();
            Layer {
                layer_number: position as u32 + 1,
                min_y: acc.anchor_y,
                max_y: acc.max_y,
                item_ids,
                member_indices,
            }
        })
        .collect();

    tracing::debug!(
        "Detected {} layers from {} placed items ({})",
        layers.len(),
        participants.len(),
        config.strategy.as_str()
    );
    layers
}

fn cluster_first_encounter<'a>(
    participants: &[(usize, &'a str, f64)],
    threshold: f64,
) -> Vec<LayerAccumulator<'a>> {
    participants
        .iter()
        .fold(Vec::new(), |mut layers: Vec<LayerAccumulator<'a>>, &(index, id, y)| {
            match layers
                .iter()
                .position(|layer| (y - layer.anchor_y).abs() < threshold)
            {
                Some(found) => layers[found].join(index, id, y),
                None => layers.push(LayerAccumulator::open(index, id, y)),
            }
            layers
        })
}

fn cluster_sorted_linkage<'a>(
    participants: &[(usize, &'a str, f64)],
    threshold: f64,
) -> Vec<LayerAccumulator<'a>> {
    let mut sorted = participants.to_vec();
    sorted.sort_by(|a, b| a.2.total_cmp(&b.2).then_with(|| a.0.cmp(&b.0)));

    sorted
        .into_iter()
        .fold(Vec::new(), |mut layers: Vec<LayerAccumulator<'a>>, (index, id, y)| {
            match layers.last_mut() {
                Some(layer) if y - layer.max_y < threshold => layer.join(index, id, y),
                _ => layers.push(LayerAccumulator::open(index, id, y)),
            }
            layers
        })
}

/// Orders the members of one layer: ascending X, and ascending Z for items
/// whose X lies within `tolerance` of the first item of their column.
///
/// Every comparison here is a total order, so the result is fully
/// determined by the positions (ties fall back to input order).
fn order_layer_members(mut members: Vec<(usize, f64, f64)>, tolerance: f64) -> Vec<usize> {
    members.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| a.2.total_cmp(&b.2))
            .then_with(|| a.0.cmp(&b.0))
    });

    let mut ordered = Vec::with_capacity(members.len());
    let mut column: Vec<(usize, f64, f64)> = Vec::new();
    for member in members {
        let starts_new_column = column
            .first()
            .is_some_and(|first| member.1 - first.1 > tolerance);
        if starts_new_column {
            flush_column(&mut column, &mut ordered);
        }
        column.push(member);
    }
    flush_column(&mut column, &mut ordered);
    ordered
}

fn flush_column(column: &mut Vec<(usize, f64, f64)>, ordered: &mut Vec<usize>) {
    column.sort_by(|a, b| {
        a.2.total_cmp(&b.2)
            .then_with(|| a.1.total_cmp(&b.1))
            .then_with(|| a.0.cmp(&b.0))
    });
    ordered.extend(column.drain(..).map(|(index, _, _)| index));
}

/// Stamps layer and box numbers onto a copy of `items`.
///
/// `layers` must come from [`detect_layers_with`] over the same `items`.
/// Labels are matched by input position, so an unplaced entry that shares
/// its id with a placed one stays unlabelled. Items that belong to no layer
/// come back with their labels cleared.
pub fn assign_box_numbers(items: &[CargoItem], layers: &[Layer], tolerance: f64) -> Vec<CargoItem> {
    let mut labels: Vec<Option<(u32, u32)>> = vec![None; items.len()];

    for layer in layers {
        let members: Vec<(usize, f64, f64)> = layer
            .member_indices
            .iter()
            .filter_map(|&index| {
                let pos = items.get(index)?.placement()?;
                Some((index, pos.x, pos.z))
            })
            .collect();

        for (position, index) in order_layer_members(members, tolerance)
            .into_iter()
            .enumerate()
        {
            labels[index] = Some((layer.layer_number, position as u32 + 1));
        }
    }

    items
        .iter()
        .zip(labels)
        .map(|(item, label)| match label {
            Some((layer_number, box_number)) => {
                item.with_layer_labels(Some(layer_number), Some(box_number))
            }
            None => item.with_layer_labels(None, None),
        })
        .collect()
}

/// Detects layers and numbers the boxes in one pass.
pub fn assign_layers(items: &[CargoItem], config: &LayeringConfig) -> LayerAssignment {
    let layers = detect_layers_with(items, config);
    let items = assign_box_numbers(items, &layers, config.box_order_tolerance);
    LayerAssignment { items, layers }
}

/// Returns an annotated copy of `items` with `layer_number` and
/// `box_number_in_layer` set on every placed item.
///
/// # Examples
/// ```
/// use stowage_planner::layering::calculate_layer_assignments;
/// use stowage_planner::model::{CargoItem, Unit};
/// use stowage_planner::types::Position3D;
///
/// let cube = CargoItem::new("a", "Cube", (1.0, 1.0, 1.0), Unit::Meters, 5.0, 1).unwrap();
/// let items = vec![cube.placed_at(Position3D::new(0.0, 1.0, 0.0))];
/// let labelled = calculate_layer_assignments(&items);
/// assert_eq!(labelled[0].layer_number, Some(1));
/// assert_eq!(labelled[0].box_number_in_layer, Some(1));
/// assert_eq!(items[0].layer_number, None);
/// ```
pub fn calculate_layer_assignments(items: &[CargoItem]) -> Vec<CargoItem> {
    calculate_layer_assignments_with(items, &LayeringConfig::default())
}

pub fn calculate_layer_assignments_with(
    items: &[CargoItem],
    config: &LayeringConfig,
) -> Vec<CargoItem> {
    assign_layers(items, config).items
}

fn summarize(layers: &[Layer]) -> Vec<LayerSummary> {
    layers
        .iter()
        .map(|layer| LayerSummary {
            layer_number: layer.layer_number,
            box_count: layer.item_ids.len(),
        })
        .collect()
}

/// Box count per layer, ordered by layer number.
pub fn layer_summary(items: &[CargoItem]) -> Vec<LayerSummary> {
    layer_summary_with(items, &LayeringConfig::default())
}

pub fn layer_summary_with(items: &[CargoItem], config: &LayeringConfig) -> Vec<LayerSummary> {
    summarize(&detect_layers_with(items, config))
}
