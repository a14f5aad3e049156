use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{building::BuildingKind, types::Tick, walker::Service};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub max_workers: u32,
}

/// Served-population estimate per fully staffed education building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationConfig {
    pub school_capacity:  u32,
    pub college_capacity: u32,
    pub library_capacity: u32,
}

impl Default for EducationConfig {
    fn default() -> Self {
        Self {
            school_capacity:  75,
            college_capacity: 100,
            library_capacity: 800,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkerConfig {
    /// Ticks a service walker stays out before retiring.
    pub lifetime_ticks: Tick,
    /// Chebyshev radius a walker serves around its position.
    pub service_radius: i32,
    /// A staffed service building sends a walker at most this often.
    pub spawn_interval_ticks: Tick,
    /// Fire removed per prefect visit.
    pub prefect_service_value: f64,
    /// Service value for every other role.
    pub default_service_value: f64,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            lifetime_ticks:        64,
            service_radius:        2,
            spawn_interval_ticks:  32,
            prefect_service_value: 5.0,
            default_service_value: 1.0,
        }
    }
}

impl WalkerConfig {
    pub fn service_value(&self, service: Service) -> f64 {
        match service {
            Service::Prefect => self.prefect_service_value,
            _ => self.default_service_value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub buildings: HashMap<BuildingKind, BuildingSpec>,
    #[serde(default)]
    pub education: EducationConfig,
    #[serde(default)]
    pub walkers:   WalkerConfig,
}

impl SimConfig {
    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/city.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        log::debug!("loaded config from {path}: {} building specs", config.buildings.len());
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let buildings = [
            (BuildingKind::Prefecture, 6),
            (BuildingKind::School,     10),
            (BuildingKind::College,    30),
            (BuildingKind::Library,    20),
        ]
        .into_iter()
        .map(|(kind, max_workers)| (kind, BuildingSpec { max_workers }))
        .collect();

        Self {
            buildings,
            education: EducationConfig::default(),
            walkers:   WalkerConfig::default(),
        }
    }

    /// Worker quota for `kind`; zero for unstaffed kinds.
    pub fn max_workers_for(&self, kind: BuildingKind) -> u32 {
        self.buildings.get(&kind).map_or(0, |spec| spec.max_workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_test_covers_every_staffed_kind() {
        let config = SimConfig::default_test();
        for kind in BuildingKind::all() {
            if kind.is_staffed() {
                assert!(config.max_workers_for(*kind) > 0, "{kind:?} has no quota");
            }
        }
        assert_eq!(config.max_workers_for(BuildingKind::House), 0);
    }

    #[test]
    fn parses_json_with_missing_sections() {
        let json = r#"{ "buildings": { "school": { "max_workers": 12 } } }"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_workers_for(BuildingKind::School), 12);
        assert_eq!(config.education.library_capacity, 800);
        assert_eq!(config.walkers.spawn_interval_ticks, 32);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimConfig::load("/nonexistent-data-dir").unwrap_err();
        assert!(err.to_string().contains("Cannot read"));
    }
}
