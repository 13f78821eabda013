use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const SUBJECTS: usize = 452;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n
    }

    fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.below(items.len() as u64) as usize]
    }

    /// `None` with probability `p`, mimicking the gaps in the real dataset.
    fn gap<T>(&mut self, p: f64, value: T) -> Option<T> {
        (self.next_f64() >= p).then_some(value)
    }
}

/// One synthetic subject, using the raw column semantics of the Kaggle dataset.
struct Subject {
    id: i64,
    age: i64,
    gender: &'static str,
    bedtime: String,
    wakeup: String,
    duration: f64,
    efficiency: f64,
    rem: i64,
    deep: i64,
    light: i64,
    awakenings: Option<f64>,
    caffeine: Option<f64>,
    alcohol: Option<f64>,
    smoker: &'static str,
    exercise: Option<f64>,
}

fn generate(rng: &mut SimpleRng, id: i64) -> Subject {
    let smoker = *rng.pick(&["Yes", "No", "No"]);
    let alcohol = rng.below(6) as f64;
    let caffeine = *rng.pick(&[0.0, 0.0, 25.0, 50.0, 75.0, 100.0, 200.0]);

    // Smoking and alcohol push efficiency and deep sleep down.
    let mut efficiency = 0.92 - rng.next_f64() * 0.2;
    let mut deep = 40 + rng.below(25) as i64;
    if smoker == "Yes" {
        efficiency -= 0.06;
        deep -= 10;
    }
    if alcohol > 1.0 {
        efficiency -= 0.03 * alcohol;
        deep -= 6 * alcohol as i64;
    }
    let rem = 15 + rng.below(14) as i64;
    let light = 100 - rem - deep;

    let duration = *rng.pick(&[5.0, 6.0, 6.5, 7.0, 7.5, 8.0, 9.0, 10.0]);
    let bed_hour = *rng.pick(&[21, 22, 23, 0, 1, 2]);
    let awakenings = rng.below(5) as f64;
    let exercise = rng.below(6) as f64;
    let day = if bed_hour < 12 { 6 } else { 5 };
    let wake_minutes = (bed_hour * 60 + (duration * 60.0) as i64) % (24 * 60);

    Subject {
        id,
        age: 9 + rng.below(61) as i64,
        gender: *rng.pick(&["Male", "Female"]),
        bedtime: format!("2021-03-{day:02} {bed_hour:02}:00:00"),
        wakeup: format!("2021-03-06 {:02}:{:02}:00", wake_minutes / 60, wake_minutes % 60),
        duration,
        efficiency: (efficiency.clamp(0.5, 0.99) * 100.0).round() / 100.0,
        rem,
        deep,
        light,
        awakenings: rng.gap(0.05, awakenings),
        caffeine: rng.gap(0.05, caffeine),
        alcohol: rng.gap(0.03, alcohol),
        smoker,
        exercise: rng.gap(0.01, exercise),
    }
}

const HEADERS: [&str; 15] = [
    "ID",
    "Age",
    "Gender",
    "Bedtime",
    "Wakeup time",
    "Sleep duration",
    "Sleep efficiency",
    "REM sleep percentage",
    "Deep sleep percentage",
    "Light sleep percentage",
    "Awakenings",
    "Caffeine consumption",
    "Alcohol consumption",
    "Smoking status",
    "Exercise frequency",
];

fn opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.1}")).unwrap_or_default()
}

fn write_csv(subjects: &[Subject], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record(HEADERS)?;
    for s in subjects {
        writer.write_record([
            s.id.to_string(),
            s.age.to_string(),
            s.gender.to_string(),
            s.bedtime.clone(),
            s.wakeup.clone(),
            s.duration.to_string(),
            s.efficiency.to_string(),
            s.rem.to_string(),
            s.deep.to_string(),
            s.light.to_string(),
            opt(s.awakenings),
            opt(s.caffeine),
            opt(s.alcohol),
            s.smoker.to_string(),
            opt(s.exercise),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(subjects: &[Subject], path: &str) -> Result<()> {
    let ints = |f: fn(&Subject) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(subjects.iter().map(f).collect::<Vec<_>>()))
    };
    let floats = |f: fn(&Subject) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(subjects.iter().map(f).collect::<Vec<_>>()))
    };
    let texts = |f: fn(&Subject) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(subjects.iter().map(f).collect::<Vec<_>>()))
    };

    let columns: Vec<ArrayRef> = vec![
        ints(|s| s.id),
        ints(|s| s.age),
        texts(|s| s.gender),
        texts(|s| s.bedtime.as_str()),
        texts(|s| s.wakeup.as_str()),
        floats(|s| Some(s.duration)),
        floats(|s| Some(s.efficiency)),
        ints(|s| s.rem),
        ints(|s| s.deep),
        ints(|s| s.light),
        floats(|s| s.awakenings),
        floats(|s| s.caffeine),
        floats(|s| s.alcohol),
        texts(|s| s.smoker),
        floats(|s| s.exercise),
    ];

    let schema = Arc::new(Schema::new(
        HEADERS
            .iter()
            .zip(&columns)
            .map(|(name, col)| Field::new(*name, col.data_type().clone(), col.null_count() > 0))
            .collect::<Vec<_>>(),
    ));

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let subjects: Vec<Subject> = (1..=SUBJECTS as i64).map(|id| generate(&mut rng, id)).collect();

    write_csv(&subjects, "sleep_efficiency.csv")?;
    write_parquet(&subjects, "sleep_efficiency.parquet")?;

    println!(
        "Wrote {} subjects to sleep_efficiency.csv and sleep_efficiency.parquet",
        subjects.len()
    );
    Ok(())
}
