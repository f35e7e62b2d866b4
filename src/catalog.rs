//! Standard shipping container types.

use crate::model::ContainerType;

/// Identifier of the container type used when none is selected.
pub const DEFAULT_CONTAINER_ID: &str = "20ft";

fn standard(id: &str, name: &str, dims: (f64, f64, f64), display_label: &str) -> ContainerType {
    ContainerType {
        id: id.to_string(),
        name: name.to_string(),
        length: dims.0,
        width: dims.1,
        height: dims.2,
        display_label: display_label.to_string(),
    }
}

/// All standard container types, smallest first.
pub fn standard_containers() -> Vec<ContainerType> {
    vec![
        standard(
            "20ft",
            "20ft Standard",
            (5.9, 2.35, 2.39),
            "20ft Container (5.9m × 2.35m × 2.39m)",
        ),
        standard(
            "40ft",
            "40ft Standard",
            (12.03, 2.35, 2.39),
            "40ft Container (12.03m × 2.35m × 2.39m)",
        ),
        standard(
            "40ftHC",
            "40ft High Cube",
            (12.03, 2.35, 2.69),
            "40ft High Cube (12.03m × 2.35m × 2.69m)",
        ),
    ]
}

/// Looks up a standard container type by id (case-insensitive).
pub fn find_container(id: &str) -> Option<ContainerType> {
    let id = id.trim();
    standard_containers()
        .into_iter()
        .find(|container| container.id.eq_ignore_ascii_case(id))
}

/// Looks up a container type, falling back to the first standard type for
/// unknown ids.
pub fn container_or_default(id: &str) -> ContainerType {
    if let Some(container) = find_container(id) {
        return container;
    }
    tracing::warn!(
        "⚠️ Unknown container type '{}', falling back to {}",
        id,
        DEFAULT_CONTAINER_ID
    );
    standard_containers().swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lists_three_types() {
        let ids: Vec<_> = standard_containers().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["20ft", "40ft", "40ftHC"]);
    }

    #[test]
    fn find_container_is_case_insensitive() {
        let hc = find_container("40fthc").expect("high cube should exist");
        assert_eq!(hc.height, 2.69);
        assert!(find_container("45ft").is_none());
    }

    #[test]
    fn unknown_id_falls_back_to_default() {
        let container = container_or_default("does-not-exist");
        assert_eq!(container.id, DEFAULT_CONTAINER_ID);
        assert_eq!(container, find_container(DEFAULT_CONTAINER_ID).unwrap());
    }

    #[test]
    fn default_container_volume() {
        let container = container_or_default(DEFAULT_CONTAINER_ID);
        assert!((container.volume() - 5.9 * 2.35 * 2.39).abs() < 1e-9);
    }
}
