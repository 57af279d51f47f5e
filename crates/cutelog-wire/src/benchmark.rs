//! Synthetic load generator

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::Value;

use cutelog_core::prelude::*;
use cutelog_core::{now_timestamp, Fields, LogRecord};

use crate::source::{RecordSink, RecordSource};

/// Connection id reserved for the benchmark source
pub const BENCHMARK_CONN_ID: u64 = 0;

/// Level names cycled through by the generator, in order
pub const BENCHMARK_LEVELS: [&str; 6] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "REQ"];

/// Logger names picked at random for each record
pub const BENCHMARK_NAMES: [&str; 6] = [
    "CL",
    "CL.Test1",
    "CL.Test1.Test2",
    "CL.Test3hey",
    "hey.hi.hello",
    "CL.Test3.Test4.Test5",
];

const BENCHMARK_EXC_TEXT: &str = "exception test\nmultiple lines\ntest 123";
const MAX_EXTRA_FIELDS: usize = 6;

/// Emits synthetic records at a fixed interval until stopped.
pub struct SyntheticBenchmarkSource {
    interval: Duration,
    rng: StdRng,
}

impl SyntheticBenchmarkSource {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic generator for tests
    pub fn with_seed(interval: Duration, seed: u64) -> Self {
        Self {
            interval,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Build the `count`-th record.
    fn generate(&mut self, count: u64) -> LogRecord {
        let mut fields = Fields::new();
        fields.insert("msg".into(), Value::String(format!("msg {}", count)));

        let name = BENCHMARK_NAMES.choose(&mut self.rng).copied().unwrap_or("CL");
        fields.insert("name".into(), Value::String(name.to_string()));
        fields.insert("created".into(), Value::from(now_timestamp()));

        let level = BENCHMARK_LEVELS[(count % BENCHMARK_LEVELS.len() as u64) as usize];
        fields.insert("levelname".into(), Value::String(level.to_string()));
        if level == "CRITICAL" {
            fields.insert("exc_text".into(), Value::String(BENCHMARK_EXC_TEXT.into()));
        }

        for i in 0..self.rng.gen_range(0..MAX_EXTRA_FIELDS) {
            let value: u8 = self.rng.gen();
            fields.insert(format!("{}f", i), Value::from(value));
        }

        LogRecord::from_fields(fields)
    }
}

impl RecordSource for SyntheticBenchmarkSource {
    async fn run(mut self, sink: &RecordSink) {
        let conn_id = sink.conn_id();
        debug!("Connection id={} is starting", conn_id);

        let mut count = 0u64;
        while !sink.need_to_stop() {
            let record = self.generate(count);
            if !sink.emit(record).await {
                break;
            }
            count += 1;
            tokio::time::sleep(self.interval).await;
        }

        debug!(
            "Connection id={} has stopped after {} records",
            conn_id, count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ConnectionControl, ServerEvent};
    use crate::source::drive;
    use tokio::sync::{mpsc, watch};

    #[test]
    fn test_levels_cycle_in_order() {
        let mut source = SyntheticBenchmarkSource::with_seed(Duration::ZERO, 1);
        let levels: Vec<String> = (0..7)
            .map(|c| source.generate(c).level_name.unwrap())
            .collect();
        assert_eq!(
            levels,
            vec!["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "REQ", "DEBUG"]
        );
    }

    #[test]
    fn test_generated_record_shape() {
        let mut source = SyntheticBenchmarkSource::with_seed(Duration::ZERO, 42);
        for count in 0..50 {
            let record = source.generate(count);
            assert_eq!(record.message, Some(format!("msg {}", count)));
            assert!(BENCHMARK_NAMES.contains(&record.logger_name.as_deref().unwrap()));
            assert!(record.has_native_timestamp);
            assert!(record.extra_fields.len() < MAX_EXTRA_FIELDS);
            for (i, (key, value)) in record.extra_fields.iter().enumerate() {
                assert_eq!(key, &format!("{}f", i));
                assert!(value.as_u64().unwrap() < 256);
            }
            if record.level_name.as_deref() == Some("CRITICAL") {
                assert_eq!(record.exception_text.as_deref(), Some(BENCHMARK_EXC_TEXT));
            } else {
                assert!(record.exception_text.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_runs_until_stop_requested() {
        let (tx, mut rx) = mpsc::channel(64);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let control = ConnectionControl::new();
        let sink = RecordSink::new(BENCHMARK_CONN_ID, control.clone(), shutdown_rx, tx);
        let task = tokio::spawn(drive(
            SyntheticBenchmarkSource::with_seed(Duration::from_millis(1), 7),
            sink,
        ));

        let mut seen = 0;
        while seen < 5 {
            if let Some(ServerEvent::Record { .. }) = rx.recv().await {
                seen += 1;
            }
        }
        control.request_stop();
        task.await.unwrap();

        let mut finished = false;
        while let Some(event) = rx.recv().await {
            if let ServerEvent::ConnectionFinished { conn_id } = event {
                assert_eq!(conn_id, BENCHMARK_CONN_ID);
                finished = true;
            }
        }
        assert!(finished);
    }
}
