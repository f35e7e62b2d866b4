//! Load metrics: cargo volume, weight and container utilization.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{InputIssue, Outcome};
use crate::model::{CargoItem, ContainerType, normalize};

/// Utilization band as shown on the load summary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationLevel {
    /// Up to 70 %
    Normal,
    /// Above 70 %
    High,
    /// Above 90 %
    Critical,
    /// Above 100 %: the declared cargo cannot physically fit
    Overloaded,
}

impl UtilizationLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 100.0 {
            UtilizationLevel::Overloaded
        } else if percent > 90.0 {
            UtilizationLevel::Critical
        } else if percent > 70.0 {
            UtilizationLevel::High
        } else {
            UtilizationLevel::Normal
        }
    }
}

/// Aggregated load figures for one container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoadMetrics {
    /// Cubic meters of cargo, quantities included
    pub cargo_volume: f64,
    /// Cubic meters of cargo space
    pub container_volume: f64,
    pub utilization_percent: f64,
    /// kg, quantities included
    pub total_weight: f64,
    /// Number of entries that were aggregated
    pub item_count: usize,
    /// Free cargo space, never negative
    pub remaining_volume: f64,
    pub utilization_level: UtilizationLevel,
}

/// Share of the container volume taken by the cargo, in percent.
///
/// A container without volume yields 0.
pub fn calculate_utilization(cargo_volume: f64, container_volume: f64) -> f64 {
    if container_volume <= 0.0 || !container_volume.is_finite() {
        return 0.0;
    }
    (cargo_volume / container_volume) * 100.0
}

/// Selects the items that are placed in the container.
pub fn filter_placed_items(items: &[CargoItem]) -> Vec<CargoItem> {
    items.iter().filter(|item| item.is_placed).cloned().collect()
}

/// Aggregates volume, weight and utilization over `items`.
///
/// Malformed items contribute zero volume or weight; each problem is
/// reported on the returned outcome.
pub fn load_metrics(items: &[CargoItem], container: &ContainerType) -> Outcome<LoadMetrics> {
    let mut issues = Vec::new();
    let mut cargo_volume = 0.0;
    let mut total_weight = 0.0;

    for item in items {
        let quantity = f64::from(item.effective_quantity());
        match normalize(item) {
            Ok(dims) => cargo_volume += dims.volume() * quantity,
            Err(issue) => issues.push(issue),
        }
        if item.weight.is_finite() && item.weight >= 0.0 {
            total_weight += item.weight * quantity;
        } else {
            issues.push(InputIssue::InvalidWeight {
                item_id: item.id.clone(),
                value: item.weight,
            });
        }
    }

    let container_volume = container.volume();
    if container_volume <= 0.0 {
        issues.push(InputIssue::ZeroContainerVolume {
            container_id: container.id.clone(),
        });
    }

    let utilization_percent = calculate_utilization(cargo_volume, container_volume);
    let metrics = LoadMetrics {
        cargo_volume,
        container_volume,
        utilization_percent,
        total_weight,
        item_count: items.len(),
        remaining_volume: (container_volume - cargo_volume).max(0.0),
        utilization_level: UtilizationLevel::from_percent(utilization_percent),
    };

    for issue in &issues {
        tracing::warn!("⚠️ Load metrics degraded: {}", issue);
    }
    tracing::debug!(
        "Load metrics: {:.2} m³ of {:.2} m³ ({:.1}%), {:.1} kg",
        cargo_volume,
        container_volume,
        utilization_percent,
        total_weight
    );

    Outcome::degraded(metrics, issues)
}

/// Load metrics over the placed items only.
pub fn placed_load_metrics(items: &[CargoItem], container: &ContainerType) -> Outcome<LoadMetrics> {
    load_metrics(&filter_placed_items(items), container)
}
