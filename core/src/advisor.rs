//! Education advisor: read-only coverage report over the city.
//!
//! For each education service the report counts buildings, how many of
//! them are staffed, and estimates how many people they serve from a
//! per-building capacity scaled by staffing. Coverage is
//! `served * 100 / (eligible + 1)`.

use serde::Serialize;
use std::fmt;

use crate::{
    building::{BuildingKind, CitizenGroup},
    city::City,
    config::EducationConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EducationService {
    School,
    College,
    Library,
}

impl EducationService {
    pub fn all() -> [EducationService; 3] {
        [Self::School, Self::College, Self::Library]
    }

    pub fn building_kind(&self) -> BuildingKind {
        match self {
            Self::School  => BuildingKind::School,
            Self::College => BuildingKind::College,
            Self::Library => BuildingKind::Library,
        }
    }

    /// People one fully staffed building serves.
    pub fn capacity(&self, config: &EducationConfig) -> u32 {
        match self {
            Self::School  => config.school_capacity,
            Self::College => config.college_capacity,
            Self::Library => config.library_capacity,
        }
    }

    /// The age band this service is meant for.
    pub fn eligible_group(&self) -> CitizenGroup {
        match self {
            Self::School  => CitizenGroup::Scholar,
            Self::College => CitizenGroup::Student,
            Self::Library => CitizenGroup::Mature,
        }
    }

    pub fn building_label(&self) -> &'static str {
        match self {
            Self::School  => "schools",
            Self::College => "colleges",
            Self::Library => "libraries",
        }
    }

    pub fn people_label(&self) -> &'static str {
        match self {
            Self::School  => "children",
            Self::College => "students",
            Self::Library => "peoples",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageRating {
    NoCoverage,
    Poor,
    VeryBad,
    Bad,
    NotBad,
    Simple,
    AboveSimple,
    Good,
    VeryGood,
    Pretty,
    Awesome,
}

const RATING_TIERS: [CoverageRating; 10] = [
    CoverageRating::Poor,
    CoverageRating::VeryBad,
    CoverageRating::Bad,
    CoverageRating::NotBad,
    CoverageRating::Simple,
    CoverageRating::AboveSimple,
    CoverageRating::Good,
    CoverageRating::VeryGood,
    CoverageRating::Pretty,
    CoverageRating::Awesome,
];

impl CoverageRating {
    /// One tier per ten points; 90 and above (including over-coverage)
    /// share the top tier.
    pub fn from_coverage(coverage: u32) -> Self {
        if coverage == 0 {
            return Self::NoCoverage;
        }
        let tier = (coverage / 10).min(RATING_TIERS.len() as u32 - 1);
        RATING_TIERS[tier as usize]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoCoverage  => "no coverage",
            Self::Poor        => "poor",
            Self::VeryBad     => "very bad",
            Self::Bad         => "bad",
            Self::NotBad      => "not bad",
            Self::Simple      => "simple",
            Self::AboveSimple => "above simple",
            Self::Good        => "good",
            Self::VeryGood    => "very good",
            Self::Pretty      => "pretty",
            Self::Awesome     => "awesome",
        }
    }
}

/// Coverage percentage. The +1 keeps an empty city from dividing by zero.
pub fn coverage_percent(served: u32, eligible: u32) -> u32 {
    let percent = u64::from(served) * 100 / (u64::from(eligible) + 1);
    percent.min(u64::from(u32::MAX)) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationInfo {
    pub service:           EducationService,
    pub building_count:    u32,
    pub buildings_working: u32,
    pub people_served:     u32,
    pub eligible:          u32,
    pub coverage:          u32,
    pub rating:            CoverageRating,
}

impl EducationInfo {
    pub fn compute(city: &City, service: EducationService, config: &EducationConfig) -> Self {
        let capacity = u64::from(service.capacity(config));
        let mut building_count = 0u32;
        let mut buildings_working = 0u32;
        let mut served = 0u64;

        for working in city
            .buildings_of(service.building_kind())
            .filter_map(|b| b.as_working())
        {
            building_count += 1;
            if working.workers() > 0 && working.max_workers() > 0 {
                buildings_working += 1;
                served += capacity * u64::from(working.workers()) / u64::from(working.max_workers());
            }
        }

        let people_served = served.min(u64::from(u32::MAX)) as u32;
        let eligible = city
            .houses()
            .map(|h| h.habitants().count(service.eligible_group()))
            .fold(0u32, u32::saturating_add);
        let coverage = coverage_percent(people_served, eligible);

        Self {
            service,
            building_count,
            buildings_working,
            people_served,
            eligible,
            coverage,
            rating: CoverageRating::from_coverage(coverage),
        }
    }
}

impl fmt::Display for EducationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:>4}   {:<16} {}",
            format!("{} {}", self.building_count, self.service.building_label()),
            self.buildings_working,
            format!("{} {}", self.people_served, self.service.people_label()),
            self.rating.label(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationReport {
    pub population: u32,
    pub scholars:   u32,
    pub students:   u32,
    pub rows:       Vec<EducationInfo>,
}

impl EducationReport {
    pub fn compute(city: &City, config: &EducationConfig) -> Self {
        let (scholars, students) = city.houses().fold((0u32, 0u32), |(sch, stu), house| {
            let h = house.habitants();
            (
                sch.saturating_add(h.count(CitizenGroup::Scholar)),
                stu.saturating_add(h.count(CitizenGroup::Student)),
            )
        });

        Self {
            population: city.population(),
            scholars,
            students,
            rows: EducationService::all()
                .into_iter()
                .map(|service| EducationInfo::compute(city, service, config))
                .collect(),
        }
    }

    pub fn row(&self, service: EducationService) -> Option<&EducationInfo> {
        self.rows.iter().find(|r| r.service == service)
    }
}

impl fmt::Display for EducationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} peoples, {} scholars, {} students",
            self.population, self.scholars, self.students
        )?;
        for row in &self.rows {
            writeln!(f, "  {row}")?;
        }
        Ok(())
    }
}
