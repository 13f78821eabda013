/// Data layer: table model, loading, normalization and derived metrics.
///
/// Architecture:
/// ```text
///  sleep_efficiency.csv        SleepStudy.csv (HTTP)
///        │                            │
///        ▼                            ▼
///   ┌──────────────────────────────────────┐
///   │  loader      parse → Table           │
///   └──────────────────────────────────────┘
///        │                            │
///        ▼                            ▼
///   ┌──────────────────────────────────────┐
///   │  normalize   rename / drop columns   │
///   │  schema      declared column kinds   │
///   └──────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  derive       │  stage durations in hours
///   └──────────────┘
///        │
///        ▼
///   PreparedData  (pipeline)
/// ```

pub mod derive;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod summary;
