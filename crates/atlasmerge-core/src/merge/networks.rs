//! Yeo 17-network naming for Schaefer-derived atlases.
//!
//! Subcortical and cerebellar parcellations built from the Schaefer/Yeo
//! resting-state networks label each voxel with its network number.

use std::collections::BTreeMap;

/// Network names indexed by `label - 1`.
pub const YEO17_NETWORKS: [&str; 17] = [
    "VisCent",
    "VisPeri",
    "SomMotA",
    "SomMotB",
    "DorsAttnA",
    "DorsAttnB",
    "SalVentAttnA",
    "SalVentAttnB",
    "LimbicA",
    "LimbicB",
    "ContC",
    "ContA",
    "ContB",
    "TempPar",
    "DefaultC",
    "DefaultA",
    "DefaultB",
];

/// Per-label names `"{prefix}-{Network}"` for labels 1..=17.
pub fn network_names(prefix: &str) -> BTreeMap<u32, String> {
    YEO17_NETWORKS
        .iter()
        .zip(1u32..)
        .map(|(network, label)| (label, format!("{}-{}", prefix, network)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_names() {
        let names = network_names("subcortical");
        assert_eq!(names.len(), 17);
        assert_eq!(names[&1], "subcortical-VisCent");
        assert_eq!(names[&14], "subcortical-TempPar");
        assert_eq!(names[&17], "subcortical-DefaultB");
    }
}
