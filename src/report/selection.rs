use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::data::derive::{DEEP_SLEEP_TIME, LIGHT_SLEEP_TIME, REM_SLEEP_TIME};

// ---------------------------------------------------------------------------
// Sleep stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SleepStage {
    Deep,
    Light,
    Rem,
}

impl SleepStage {
    /// Trace order used by every stage chart.
    pub const ALL: [SleepStage; 3] = [SleepStage::Deep, SleepStage::Light, SleepStage::Rem];

    pub fn label(self) -> &'static str {
        match self {
            SleepStage::Deep => "Deep sleep",
            SleepStage::Light => "Light sleep",
            SleepStage::Rem => "REM sleep",
        }
    }

    pub fn percentage_column(self) -> &'static str {
        match self {
            SleepStage::Deep => "deep_sleep_percentage",
            SleepStage::Light => "light_sleep_percentage",
            SleepStage::Rem => "REM_sleep_percentage",
        }
    }

    pub fn time_column(self) -> &'static str {
        match self {
            SleepStage::Deep => DEEP_SLEEP_TIME,
            SleepStage::Light => LIGHT_SLEEP_TIME,
            SleepStage::Rem => REM_SLEEP_TIME,
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SleepStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deep" => Ok(SleepStage::Deep),
            "light" => Ok(SleepStage::Light),
            "rem" => Ok(SleepStage::Rem),
            other => Err(format!("unknown sleep stage '{other}' (expected deep, light or rem)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Dropdown: one stage or all of them
// ---------------------------------------------------------------------------

/// Which stage traces a substance/percentage chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StageFilter {
    #[default]
    All,
    Only(SleepStage),
}

impl StageFilter {
    pub fn shows(self, stage: SleepStage) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Only(only) => only == stage,
        }
    }
}

impl FromStr for StageFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StageFilter::All);
        }
        s.parse().map(StageFilter::Only)
    }
}

// ---------------------------------------------------------------------------
// Checkboxes: any subset of stages
// ---------------------------------------------------------------------------

/// Set of checked stages. Defaults to every stage checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSelection(BTreeSet<SleepStage>);

impl Default for StageSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl StageSelection {
    pub fn all() -> Self {
        StageSelection(SleepStage::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        StageSelection(BTreeSet::new())
    }

    pub fn contains(&self, stage: SleepStage) -> bool {
        self.0.contains(&stage)
    }

    /// Toggle a single stage on or off.
    pub fn toggle(&mut self, stage: SleepStage) {
        if !self.0.remove(&stage) {
            self.0.insert(stage);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<SleepStage> for StageSelection {
    fn from_iter<I: IntoIterator<Item = SleepStage>>(iter: I) -> Self {
        StageSelection(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Radio: which caffeine chart is shown
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaffeineView {
    #[default]
    SleepEfficiency,
    StageTimes,
}

impl FromStr for CaffeineView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "efficiency" | "sleep-efficiency" => Ok(CaffeineView::SleepEfficiency),
            "stages" | "stage-times" => Ok(CaffeineView::StageTimes),
            other => Err(format!("unknown caffeine view '{other}' (expected efficiency or stages)")),
        }
    }
}

// ---------------------------------------------------------------------------
// Widget state
// ---------------------------------------------------------------------------

/// All interactive selections of the report, independent of rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetState {
    pub smoking_stages: StageFilter,
    pub alcohol_stages: StageFilter,
    pub caffeine_view: CaffeineView,
    pub caffeine_stages: StageSelection,
}
