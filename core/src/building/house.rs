use serde::{Deserialize, Serialize};
use serde_json::json;
use std::any::Any;
use std::collections::BTreeMap;

use super::{Building, BuildingBase, BuildingKind};
use crate::error::{SimError, SimResult};
use crate::variant::VariantMap;

/// Age bands of a household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitizenGroup {
    Newborn,
    Child,
    Scholar,
    Student,
    Mature,
    Aged,
}

impl CitizenGroup {
    pub fn all() -> &'static [CitizenGroup] {
        &[
            Self::Newborn,
            Self::Child,
            Self::Scholar,
            Self::Student,
            Self::Mature,
            Self::Aged,
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Habitants {
    counts: BTreeMap<CitizenGroup, u32>,
}

impl Habitants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, group: CitizenGroup, count: u32) -> Self {
        self.set(group, count);
        self
    }

    pub fn set(&mut self, group: CitizenGroup, count: u32) {
        self.counts.insert(group, count);
    }

    pub fn count(&self, group: CitizenGroup) -> u32 {
        self.counts.get(&group).copied().unwrap_or(0)
    }

    /// Headcount across every group, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.counts.values().fold(0, |sum, n| sum.saturating_add(*n))
    }
}

#[derive(Debug, Clone)]
pub struct House {
    base:      BuildingBase,
    habitants: Habitants,
}

impl House {
    pub fn new() -> Self {
        Self {
            base:      BuildingBase::new(BuildingKind::House),
            habitants: Habitants::new(),
        }
    }

    pub fn habitants(&self) -> &Habitants {
        &self.habitants
    }

    pub fn set_habitants(&mut self, habitants: Habitants) {
        self.habitants = habitants;
    }
}

impl Default for House {
    fn default() -> Self { Self::new() }
}

impl Building for House {
    fn base(&self) -> &BuildingBase { &self.base }
    fn base_mut(&mut self) -> &mut BuildingBase { &mut self.base }

    fn save(&self, stream: &mut VariantMap) {
        self.base.save(stream);
        stream.insert("habitants".into(), json!(self.habitants));
    }

    fn load(&mut self, stream: &VariantMap) -> SimResult<()> {
        self.base.load(stream)?;
        if let Some(value) = stream.get("habitants") {
            self.habitants = serde_json::from_value(value.clone()).map_err(|e| {
                SimError::MalformedSave { reason: format!("house {} habitants: {e}", self.base.id) }
            })?;
        }
        Ok(())
    }

    fn as_house(&self) -> Option<&House> { Some(self) }
    fn as_house_mut(&mut self) -> Option<&mut House> { Some(self) }

    fn as_any(&self) -> &dyn Any { self }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn habitants_count_by_group() {
        let habitants = Habitants::new()
            .with(CitizenGroup::Scholar, 12)
            .with(CitizenGroup::Mature, 30);
        assert_eq!(habitants.count(CitizenGroup::Scholar), 12);
        assert_eq!(habitants.count(CitizenGroup::Student), 0);
        assert_eq!(habitants.total(), 42);
    }

    #[test]
    fn total_saturates_on_huge_households() {
        let habitants = Habitants::new()
            .with(CitizenGroup::Mature, 3_000_000_000)
            .with(CitizenGroup::Aged, 3_000_000_000);
        assert_eq!(habitants.total(), u32::MAX);
    }

    #[test]
    fn house_keeps_habitants_across_save() {
        let mut house = House::new();
        house.base_mut().id = 2;
        house.set_habitants(Habitants::new().with(CitizenGroup::Child, 4));

        let mut stream = VariantMap::new();
        house.save(&mut stream);
        let mut restored = House::new();
        restored.load(&stream).unwrap();
        assert_eq!(restored.habitants().count(CitizenGroup::Child), 4);
    }
}
