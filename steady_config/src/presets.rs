//! Named sensitivity presets and per-procedure defaults.
//!
//! A procedure preset picks a sensitivity, a movement threshold and a dwell
//! requirement suited to the imaging modality. A population modifier then
//! relaxes (or tightens) both for the patient group being examined.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Sensitivity selector. Each variant bundles a movement threshold and the
/// number of stability flags required before a score is trusted.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    High,
    #[default]
    Medium,
    Low,
}

impl Sensitivity {
    pub const ALL: [Sensitivity; 3] = [Sensitivity::High, Sensitivity::Medium, Sensitivity::Low];

    /// Maximum centroid movement per tick still counted as stable (pixels).
    pub const fn threshold_px(self) -> u32 {
        match self {
            Sensitivity::High => 5,
            Sensitivity::Medium => 10,
            Sensitivity::Low => 20,
        }
    }

    /// Stability-flag window length used for scoring.
    pub const fn min_detections(self) -> u32 {
        match self {
            Sensitivity::High => 20,
            Sensitivity::Medium => 15,
            Sensitivity::Low => 10,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Sensitivity::High => "high",
            Sensitivity::Medium => "medium",
            Sensitivity::Low => "low",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Sensitivity {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Sensitivity::High),
            "medium" => Ok(Sensitivity::Medium),
            "low" => Ok(Sensitivity::Low),
            other => eyre::bail!("unknown sensitivity '{other}' (expected high|medium|low)"),
        }
    }
}

/// How bad a movement artefact would be for the procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    Critical,
    High,
    Medium,
}

impl Criticality {
    pub const fn name(self) -> &'static str {
        match self {
            Criticality::Critical => "critical",
            Criticality::High => "high",
            Criticality::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ProcedurePreset {
    pub id: &'static str,
    pub name: &'static str,
    pub sensitivity: Sensitivity,
    pub threshold_px: u32,
    pub time_threshold_s: f64,
    pub description: &'static str,
    pub typical_duration: &'static str,
    pub criticality: Criticality,
}

pub const PROCEDURES: &[ProcedurePreset] = &[
    ProcedurePreset {
        id: "mri-skull",
        name: "Skull MRI",
        sensitivity: Sensitivity::High,
        threshold_px: 5,
        time_threshold_s: 5.0,
        description: "Magnetic resonance imaging of the brain",
        typical_duration: "15-45 min",
        criticality: Criticality::Critical,
    },
    ProcedurePreset {
        id: "ct-head",
        name: "Head CT",
        sensitivity: Sensitivity::Medium,
        threshold_px: 8,
        time_threshold_s: 3.0,
        description: "X-ray computed tomography of the head",
        typical_duration: "10-30 min",
        criticality: Criticality::High,
    },
    ProcedurePreset {
        id: "skull-xray",
        name: "Skull X-ray",
        sensitivity: Sensitivity::Medium,
        threshold_px: 10,
        time_threshold_s: 2.0,
        description: "Plain radiography of the skull bones",
        typical_duration: "2-10 min",
        criticality: Criticality::Medium,
    },
    ProcedurePreset {
        id: "cerebral-angiography",
        name: "Cerebral angiography",
        sensitivity: Sensitivity::High,
        threshold_px: 6,
        time_threshold_s: 4.0,
        description: "Imaging of the cerebral blood vessels",
        typical_duration: "30-60 min",
        criticality: Criticality::Critical,
    },
    ProcedurePreset {
        id: "cerebral-pet",
        name: "Cerebral PET",
        sensitivity: Sensitivity::High,
        threshold_px: 7,
        time_threshold_s: 6.0,
        description: "Positron emission tomography of the brain",
        typical_duration: "45-90 min",
        criticality: Criticality::Critical,
    },
    ProcedurePreset {
        id: "transcranial-ultrasound",
        name: "Transcranial ultrasound",
        sensitivity: Sensitivity::Low,
        threshold_px: 15,
        time_threshold_s: 1.5,
        description: "Non-invasive Doppler assessment of cerebral vessels",
        typical_duration: "15-30 min",
        criticality: Criticality::Medium,
    },
];

/// Adjustments for a patient group. Modifiers below 1.0 relax the
/// requirement; above 1.0 tighten it.
#[derive(Debug, Clone, Copy)]
pub struct PopulationPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub threshold_modifier: f64,
    pub time_modifier: f64,
    /// Seconds between repeated operator reminders.
    pub announce_interval_s: f64,
}

pub const POPULATIONS: &[PopulationPreset] = &[
    PopulationPreset {
        id: "pediatric",
        name: "Pediatric patients",
        threshold_modifier: 0.8,
        time_modifier: 0.7,
        announce_interval_s: 5.0,
    },
    PopulationPreset {
        id: "geriatric",
        name: "Geriatric patients",
        threshold_modifier: 0.9,
        time_modifier: 0.8,
        announce_interval_s: 3.0,
    },
    PopulationPreset {
        id: "neurological",
        name: "Patients with neurological conditions",
        threshold_modifier: 0.6,
        time_modifier: 0.5,
        announce_interval_s: 2.0,
    },
    PopulationPreset {
        id: "emergency",
        name: "Emergency cases",
        threshold_modifier: 1.2,
        time_modifier: 0.8,
        announce_interval_s: 1.0,
    },
    PopulationPreset {
        id: "standard",
        name: "Standard population",
        threshold_modifier: 1.0,
        time_modifier: 1.0,
        announce_interval_s: 10.0,
    },
];

pub const DEFAULT_POPULATION: &str = "standard";

pub fn find_procedure(id: &str) -> Option<&'static ProcedurePreset> {
    PROCEDURES.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

pub fn find_population(id: &str) -> Option<&'static PopulationPreset> {
    POPULATIONS.iter().find(|p| p.id.eq_ignore_ascii_case(id.trim()))
}

/// A procedure preset with the population modifiers applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedProcedure {
    pub id: &'static str,
    pub name: &'static str,
    pub population: &'static str,
    pub sensitivity: Sensitivity,
    pub threshold_px: u32,
    pub time_threshold_s: f64,
    pub announce_interval_s: f64,
    pub criticality: Criticality,
    pub typical_duration: &'static str,
}

/// Resolve `procedure` for `population` (standard when `None`).
///
/// The scaled threshold is truncated toward zero and never drops below 1 px.
pub fn resolve_procedure(procedure: &str, population: Option<&str>) -> eyre::Result<ResolvedProcedure> {
    let Some(base) = find_procedure(procedure) else {
        eyre::bail!("unknown procedure '{procedure}'");
    };
    let pop_id = population.unwrap_or(DEFAULT_POPULATION);
    let Some(pop) = find_population(pop_id) else {
        eyre::bail!("unknown population '{pop_id}'");
    };

    let scaled = (f64::from(base.threshold_px) * pop.threshold_modifier).trunc();
    let threshold_px = if scaled.is_finite() && scaled >= 1.0 {
        scaled as u32
    } else {
        1
    };

    Ok(ResolvedProcedure {
        id: base.id,
        name: base.name,
        population: pop.id,
        sensitivity: base.sensitivity,
        threshold_px,
        time_threshold_s: base.time_threshold_s * pop.time_modifier,
        announce_interval_s: pop.announce_interval_s,
        criticality: base.criticality,
        typical_duration: base.typical_duration,
    })
}
