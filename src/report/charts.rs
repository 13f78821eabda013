use std::collections::BTreeMap;

use log::warn;
use serde::Serialize;

use crate::data::derive::ACTUAL_SLEEP_TIME;
use crate::data::model::{CellValue, Table};
use crate::data::pipeline::PreparedData;
use crate::data::summary::{sorted_values, NumericStats};
use crate::error::SchemaError;

use super::selection::{CaffeineView, SleepStage, StageFilter, StageSelection, WidgetState};

/// Width of an age histogram bin, in years.
pub const AGE_BIN_WIDTH: f64 = 5.0;

/// Upper bound on the number of histogram bins.
pub const MAX_HISTOGRAM_BINS: usize = 10_000;

// ---------------------------------------------------------------------------
// Chart specifications (data only, no styling)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartId {
    GenderRatio,
    AgeDistribution,
    SleepTimeByAge,
    DatasetComparison,
    SmokingEfficiency,
    SmokingStagePercentages,
    AlcoholEfficiency,
    AlcoholStagePercentages,
    CaffeineEfficiency,
    CaffeineStageTimes,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chart {
    pub id: ChartId,
    /// Whether the chart is the one currently selected in its widget group.
    pub active: bool,
    pub spec: ChartSpec,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Pie {
        column: String,
        slices: Vec<PieSlice>,
    },
    Histogram {
        column: String,
        bins: Vec<HistogramBin>,
    },
    Scatter {
        x: String,
        y: String,
        color: String,
        points: Vec<ScatterPoint>,
    },
    Box {
        group_by: Option<String>,
        traces: Vec<BoxTrace>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: CellValue,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub color: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoxTrace {
    pub name: String,
    pub column: String,
    pub visible: bool,
    pub groups: Vec<BoxGroup>,
}

/// One box: the non-null values of a series for one group key (`Null` when
/// the trace is not grouped).
#[derive(Debug, Clone, Serialize)]
pub struct BoxGroup {
    pub key: CellValue,
    pub count: usize,
    #[serde(flatten)]
    pub stats: NumericStats,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Build every chart of the report from the prepared tables.
pub fn build_charts(data: &PreparedData, widgets: &WidgetState) -> Result<Vec<Chart>, SchemaError> {
    let eff = data.efficiency();
    let caffeine_stages_active = widgets.caffeine_view == CaffeineView::StageTimes;

    let chart = |id, spec| Chart {
        id,
        active: true,
        spec,
    };

    Ok(vec![
        chart(ChartId::GenderRatio, gender_ratio(eff)?),
        chart(ChartId::AgeDistribution, age_distribution(eff)?),
        chart(ChartId::SleepTimeByAge, sleep_time_by_age(eff)?),
        chart(ChartId::DatasetComparison, dataset_comparison(data)?),
        chart(ChartId::SmokingEfficiency, efficiency_by(eff, "smoking_status")?),
        chart(
            ChartId::SmokingStagePercentages,
            stage_percentages_by(eff, "smoking_status", widgets.smoking_stages)?,
        ),
        chart(ChartId::AlcoholEfficiency, efficiency_by(eff, "alcohol_consumption")?),
        chart(
            ChartId::AlcoholStagePercentages,
            stage_percentages_by(eff, "alcohol_consumption", widgets.alcohol_stages)?,
        ),
        Chart {
            id: ChartId::CaffeineEfficiency,
            active: !caffeine_stages_active,
            spec: efficiency_by(eff, "caffeine_consumption")?,
        },
        Chart {
            id: ChartId::CaffeineStageTimes,
            active: caffeine_stages_active,
            spec: stage_times_by(eff, "caffeine_consumption", &widgets.caffeine_stages)?,
        },
    ])
}

/// Subject count per gender.
pub fn gender_ratio(table: &Table) -> Result<ChartSpec, SchemaError> {
    let mut counts: BTreeMap<CellValue, usize> = BTreeMap::new();
    for value in &table.require("gender")?.values {
        *counts.entry(value.clone()).or_default() += 1;
    }
    Ok(ChartSpec::Pie {
        column: "gender".into(),
        slices: counts
            .into_iter()
            .map(|(label, count)| PieSlice { label, count })
            .collect(),
    })
}

pub fn age_distribution(table: &Table) -> Result<ChartSpec, SchemaError> {
    let ages = sorted_values(table.numeric("age")?);
    Ok(ChartSpec::Histogram {
        column: "age".into(),
        bins: histogram(&ages, AGE_BIN_WIDTH),
    })
}

/// Fixed-width bins aligned to multiples of `width`, covering min..=max.
///
/// Non-finite values are skipped. A range needing more than
/// [`MAX_HISTOGRAM_BINS`] bins yields no bins.
pub fn histogram(sorted: &[f64], width: f64) -> Vec<HistogramBin> {
    let finite: Vec<f64> = sorted.iter().copied().filter(|v| v.is_finite()).collect();
    let (Some(&min), Some(&max)) = (finite.first(), finite.last()) else {
        return Vec::new();
    };
    let first = (min / width).floor() * width;
    let span = ((max - first) / width).floor();
    if span >= MAX_HISTOGRAM_BINS as f64 {
        warn!("histogram range {min}..{max} needs too many bins of width {width}");
        return Vec::new();
    }
    let n = span as usize + 1;
    let mut bins: Vec<HistogramBin> = (0..n)
        .map(|i| HistogramBin {
            start: first + i as f64 * width,
            end: first + (i + 1) as f64 * width,
            count: 0,
        })
        .collect();
    for v in &finite {
        let i = (((v - first) / width).floor() as usize).min(n - 1);
        bins[i].count += 1;
    }
    bins
}

/// Actual sleep time against age, coloured by sleep efficiency.
pub fn sleep_time_by_age(table: &Table) -> Result<ChartSpec, SchemaError> {
    let ages = table.numeric("age")?;
    let times = table.numeric(ACTUAL_SLEEP_TIME)?;
    let efficiency = table.numeric("sleep_efficiency")?;

    let points = ages
        .into_iter()
        .zip(times)
        .zip(efficiency)
        .filter_map(|((x, y), color)| Some(ScatterPoint { x: x?, y: y?, color }))
        .collect();

    Ok(ChartSpec::Scatter {
        x: "age".into(),
        y: ACTUAL_SLEEP_TIME.into(),
        color: "sleep_efficiency".into(),
        points,
    })
}

/// Sleep duration of the efficiency dataset next to average sleep of the
/// university dataset.
pub fn dataset_comparison(data: &PreparedData) -> Result<ChartSpec, SchemaError> {
    Ok(ChartSpec::Box {
        group_by: None,
        traces: vec![
            box_trace(data.efficiency(), None, "sleep_duration", "Sleep duration (dataset 1)", true)?,
            box_trace(data.university(), None, "average_sleep", "Average sleep (dataset 2)", true)?,
        ],
    })
}

/// Sleep efficiency grouped by a substance column.
pub fn efficiency_by(table: &Table, group_by: &str) -> Result<ChartSpec, SchemaError> {
    Ok(ChartSpec::Box {
        group_by: Some(group_by.into()),
        traces: vec![box_trace(table, Some(group_by), "sleep_efficiency", "Sleep efficiency", true)?],
    })
}

/// Deep/light/REM percentages grouped by a substance column; the dropdown
/// decides which traces are visible.
pub fn stage_percentages_by(
    table: &Table,
    group_by: &str,
    filter: StageFilter,
) -> Result<ChartSpec, SchemaError> {
    let traces = SleepStage::ALL
        .into_iter()
        .map(|stage| {
            box_trace(
                table,
                Some(group_by),
                stage.percentage_column(),
                stage.label(),
                filter.shows(stage),
            )
        })
        .collect::<Result<_, _>>()?;
    Ok(ChartSpec::Box {
        group_by: Some(group_by.into()),
        traces,
    })
}

/// Deep/light/REM hours grouped by a substance column; only checked stages
/// are included.
pub fn stage_times_by(
    table: &Table,
    group_by: &str,
    selection: &StageSelection,
) -> Result<ChartSpec, SchemaError> {
    let traces = SleepStage::ALL
        .into_iter()
        .filter(|stage| selection.contains(*stage))
        .map(|stage| box_trace(table, Some(group_by), stage.time_column(), stage.label(), true))
        .collect::<Result<_, _>>()?;
    Ok(ChartSpec::Box {
        group_by: Some(group_by.into()),
        traces,
    })
}

fn box_trace(
    table: &Table,
    group_by: Option<&str>,
    column: &str,
    name: &str,
    visible: bool,
) -> Result<BoxTrace, SchemaError> {
    let values = table.numeric(column)?;
    let keys: Vec<CellValue> = match group_by {
        Some(key) => table.require(key)?.values.clone(),
        None => vec![CellValue::Null; table.len()],
    };

    let mut grouped: BTreeMap<CellValue, Vec<Option<f64>>> = BTreeMap::new();
    for (key, value) in keys.into_iter().zip(values) {
        grouped.entry(key).or_default().push(value);
    }

    let groups = grouped
        .into_iter()
        .filter_map(|(key, values)| {
            let values = sorted_values(values);
            let stats = NumericStats::from_sorted(&values)?;
            Some(BoxGroup {
                key,
                count: values.len(),
                stats,
                values,
            })
        })
        .collect();

    Ok(BoxTrace {
        name: name.into(),
        column: column.into(),
        visible,
        groups,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::pipeline::prepare_tables;
    use pretty_assertions::assert_eq;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table::from_records(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
            None,
        )
        .unwrap()
    }

    fn prepared() -> PreparedData {
        let efficiency = raw(
            &[
                "Age",
                "Gender",
                "Sleep duration",
                "Sleep efficiency",
                "REM sleep percentage",
                "Deep sleep percentage",
                "Light sleep percentage",
                "Caffeine consumption",
                "Alcohol consumption",
                "Smoking status",
            ],
            &[
                &["65", "Female", "6", "0.88", "18", "70", "12", "0", "0", "Yes"],
                &["69", "Male", "7", "0.66", "19", "28", "53", "0", "3", "Yes"],
                &["40", "Female", "8", "0.89", "20", "70", "10", "25", "0", "No"],
                &["41", "Female", "6", "0.51", "23", "25", "52", "50", "5", "Yes"],
            ],
        );
        let university = raw(&["AverageSleep", "GPA"], &[&["7.5", "3.0"], &["8.2", "3.4"]]);
        prepare_tables(efficiency, university).unwrap()
    }

    #[test]
    fn gender_ratio_counts_subjects() {
        let spec = gender_ratio(prepared().efficiency()).unwrap();
        let ChartSpec::Pie { slices, .. } = spec else {
            panic!("expected pie");
        };
        assert_eq!(
            slices,
            vec![
                PieSlice { label: CellValue::Text("Female".into()), count: 3 },
                PieSlice { label: CellValue::Text("Male".into()), count: 1 },
            ]
        );
    }

    #[test]
    fn histogram_bins_cover_range() {
        let bins = histogram(&[40.0, 41.0, 65.0, 69.0], 5.0);
        assert_eq!(bins.first().unwrap().start, 40.0);
        assert_eq!(bins.last().unwrap().end, 70.0);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
        assert_eq!(bins[0].count, 2);
        assert!(histogram(&[], 5.0).is_empty());
    }

    #[test]
    fn histogram_skips_infinite_values() {
        let bins = histogram(&[30.0, f64::INFINITY], 5.0);
        assert_eq!(
            bins,
            vec![HistogramBin { start: 30.0, end: 35.0, count: 1 }]
        );
        assert!(histogram(&[f64::NEG_INFINITY, f64::NAN], 5.0).is_empty());
    }

    #[test]
    fn histogram_with_huge_range_is_empty() {
        assert!(histogram(&[0.0, 1e300], 5.0).is_empty());
    }

    #[test]
    fn infinite_age_in_csv_does_not_break_charts() {
        let efficiency = raw(
            &[
                "Age",
                "Gender",
                "Sleep duration",
                "Sleep efficiency",
                "REM sleep percentage",
                "Deep sleep percentage",
                "Light sleep percentage",
                "Caffeine consumption",
                "Alcohol consumption",
                "Smoking status",
            ],
            &[
                &["inf", "Female", "6", "0.88", "18", "70", "12", "0", "0", "Yes"],
                &["41", "Male", "7", "0.66", "19", "28", "53", "0", "3", "No"],
            ],
        );
        let university = raw(&["AverageSleep"], &[&["7.5"]]);
        let data = prepare_tables(efficiency, university).unwrap();
        let charts = build_charts(&data, &WidgetState::default()).unwrap();
        let ChartSpec::Histogram { bins, .. } = &charts[1].spec else {
            panic!("expected histogram");
        };
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 1);
    }

    #[test]
    fn efficiency_groups_by_smoking_status() {
        let spec = efficiency_by(prepared().efficiency(), "smoking_status").unwrap();
        let ChartSpec::Box { traces, .. } = spec else {
            panic!("expected box");
        };
        let keys: Vec<_> = traces[0].groups.iter().map(|g| (g.key.clone(), g.count)).collect();
        assert_eq!(
            keys,
            vec![(CellValue::Text("No".into()), 1), (CellValue::Text("Yes".into()), 3)]
        );
    }

    #[test]
    fn dropdown_hides_other_stages() {
        let spec = stage_percentages_by(
            prepared().efficiency(),
            "alcohol_consumption",
            StageFilter::Only(SleepStage::Deep),
        )
        .unwrap();
        let ChartSpec::Box { traces, .. } = spec else {
            panic!("expected box");
        };
        let visible: Vec<_> = traces.iter().map(|t| (t.name.as_str(), t.visible)).collect();
        assert_eq!(
            visible,
            vec![("Deep sleep", true), ("Light sleep", false), ("REM sleep", false)]
        );
    }

    #[test]
    fn checkboxes_choose_included_stage_times() {
        let mut selection = StageSelection::none();
        selection.toggle(SleepStage::Rem);
        let spec = stage_times_by(prepared().efficiency(), "caffeine_consumption", &selection).unwrap();
        let ChartSpec::Box { traces, .. } = spec else {
            panic!("expected box");
        };
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].column, "REM_sleep_time");
    }

    #[test]
    fn radio_marks_active_caffeine_chart() {
        let widgets = WidgetState {
            caffeine_view: CaffeineView::StageTimes,
            ..WidgetState::default()
        };
        let charts = build_charts(&prepared(), &widgets).unwrap();
        assert_eq!(charts.len(), 10);
        let active = |id: ChartId| charts.iter().find(|c| c.id == id).unwrap().active;
        assert!(!active(ChartId::CaffeineEfficiency));
        assert!(active(ChartId::CaffeineStageTimes));
    }

    #[test]
    fn missing_grouping_column_is_schema_error() {
        let err = efficiency_by(prepared().efficiency(), "exercise_frequency").unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("exercise_frequency".into()));
    }
}
