/// Presentation-side consumer of [`PreparedData`](crate::data::pipeline::PreparedData).
///
/// `charts` turns the prepared tables into serializable chart data; `selection`
/// holds the widget state (dropdowns, checkboxes, radio) that decides which
/// precomputed series are visible. Nothing here draws anything.

pub mod charts;
pub mod selection;
