//! Reference pipeline dataset: declared strategic assets from a `;`-delimited CSV

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

use crate::classify::AreaClassifier;
use crate::normalize::norm_text;

/// Company assumed when the dataset leaves it blank
pub const DEFAULT_COMPANY: &str = "GSK";

/// Expected columns, in order
pub const COLUMNS: [&str; 8] = [
    "Name",
    "Therapy Area",
    "Indication",
    "Phase",
    "Mode of Action",
    "Notes",
    "Reason",
    "Company",
];

/// Standardized development phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseStd {
    EarlyPhase1,
    Phase1,
    Phase2,
    Phase3,
    Phase4,
    NotApplicable,
}

impl PhaseStd {
    pub fn label(self) -> &'static str {
        match self {
            Self::EarlyPhase1 => "Early Phase 1",
            Self::Phase1 => "Phase 1",
            Self::Phase2 => "Phase 2",
            Self::Phase3 => "Phase 3",
            Self::Phase4 => "Phase 4",
            Self::NotApplicable => "N/A",
        }
    }
}

impl std::fmt::Display for PhaseStd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// `phase N` or a standalone `N`, tried for N = 1..4 in order
static PHASE_PATTERNS: LazyLock<[(PhaseStd, Regex); 4]> = LazyLock::new(|| {
    [
        (PhaseStd::Phase1, 1),
        (PhaseStd::Phase2, 2),
        (PhaseStd::Phase3, 3),
        (PhaseStd::Phase4, 4),
    ]
    .map(|(phase, n)| {
        let re = Regex::new(&format!(r"\bphase\s*{n}\b|\b{n}\b")).expect("valid phase regex");
        (phase, re)
    })
});

/// Map a free-text phase to [`PhaseStd`]; first rule that matches wins
pub fn standardize_phase(raw: Option<&str>) -> PhaseStd {
    let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
        return PhaseStd::NotApplicable;
    };
    let s = raw.to_lowercase();
    if s.contains("early") && s.contains('1') {
        return PhaseStd::EarlyPhase1;
    }
    PHASE_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&s))
        .map_or(PhaseStd::NotApplicable, |(phase, _)| *phase)
}

/// One declared asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub name: Option<String>,
    pub therapy_area: Option<String>,
    pub indication: Option<String>,
    pub phase: Option<String>,
    pub phase_std: PhaseStd,
    pub mode_of_action: Option<String>,
    pub notes: Option<String>,
    pub reason: Option<String>,
    pub company: Option<String>,
    pub company_std: String,
    pub therapeutic_area: String,
}

/// Read the dataset. Headers are trimmed; missing columns read as empty.
pub fn read_reference<R: Read>(
    reader: R,
    areas: &AreaClassifier,
) -> Result<Vec<ReferenceRecord>> {
    let mut input = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(reader);
    let headers = input.headers().context("Failed to read header")?;
    let idx = COLUMNS.map(|name| headers.iter().position(|h| h.trim() == name));
    for (name, i) in COLUMNS.iter().zip(&idx) {
        if i.is_none() {
            log::warn!("Reference dataset has no '{name}' column");
        }
    }

    let mut records = Vec::new();
    for (n, row) in input.records().enumerate() {
        let row = row.with_context(|| format!("Failed to read row {}", n + 2))?;
        let field = |col: usize| {
            idx[col]
                .and_then(|i| row.get(i))
                .map(norm_text)
                .filter(|v| !v.is_empty())
        };

        let therapy_area = field(1);
        let indication = field(2);
        let phase = field(3);
        let company = field(7);
        records.push(ReferenceRecord {
            name: field(0),
            phase_std: standardize_phase(phase.as_deref()),
            therapeutic_area: areas
                .classify_declared(therapy_area.as_deref(), indication.as_deref())
                .to_string(),
            company_std: company.clone().unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            mode_of_action: field(4),
            notes: field(5),
            reason: field(6),
            therapy_area,
            indication,
            phase,
            company,
        });
    }
    Ok(records)
}

pub fn load_reference(path: &Path, areas: &AreaClassifier) -> Result<Vec<ReferenceRecord>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let records =
        read_reference(file, areas).with_context(|| format!("Failed to read {}", path.display()))?;
    log::info!(
        "Loaded {} reference assets from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}
