// tests/log_buffer.rs

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use pipeline_console::logs::{LogBuffer, LogEvent, DEFAULT_LOG_CAPACITY};
use pipeline_console::types::{LogLevel, LogSource};

fn event(n: usize) -> LogEvent {
    LogEvent {
        level: LogLevel::Info,
        source: LogSource::System,
        message: format!("line {n}"),
        job_id: None,
        timestamp: Utc.timestamp_opt(1_700_000_000 + n as i64, 0).unwrap(),
    }
}

#[test]
fn default_capacity_is_500() {
    let buf = LogBuffer::default();
    assert_eq!(buf.capacity(), 500);
    assert_eq!(DEFAULT_LOG_CAPACITY, 500);
    assert!(buf.is_empty());
}

#[test]
fn appending_to_a_full_buffer_drops_the_oldest() {
    let mut buf = LogBuffer::new(DEFAULT_LOG_CAPACITY);
    for n in 0..500 {
        buf.append(event(n));
    }
    assert_eq!(buf.len(), 500);

    buf.append(event(500));

    let logs = buf.list();
    assert_eq!(logs.len(), 500);
    assert_eq!(logs.first().unwrap().message, "line 1");
    assert_eq!(logs.last().unwrap().message, "line 500");
}

#[test]
fn clear_empties_the_buffer() {
    let mut buf = LogBuffer::new(3);
    buf.append(event(0));
    buf.append(event(1));
    buf.clear();
    assert!(buf.is_empty());
    assert!(buf.list().is_empty());
}

#[test]
fn zero_capacity_is_treated_as_one() {
    let mut buf = LogBuffer::new(0);
    buf.append(event(0));
    buf.append(event(1));
    assert_eq!(buf.capacity(), 1);
    assert_eq!(buf.list(), vec![event(1)]);
}

#[test]
fn display_line_includes_level_source_and_job() {
    let mut e = event(0);
    e.level = LogLevel::Warning;
    e.source = LogSource::PipelineLoader;
    e.job_id = Some("job-7".into());
    let line = e.to_string();
    assert!(line.contains("[warning]"), "{line}");
    assert!(line.contains("pipeline-loader"), "{line}");
    assert!(line.contains("(job-7)"), "{line}");
    assert!(line.ends_with("line 0"), "{line}");
}

proptest! {
    #[test]
    fn buffer_holds_the_most_recent_events(count in 0usize..1200, capacity in 1usize..600) {
        let mut buf = LogBuffer::new(capacity);
        for n in 0..count {
            buf.append(event(n));
        }

        let logs = buf.list();
        prop_assert!(logs.len() <= capacity);
        prop_assert_eq!(logs.len(), count.min(capacity));

        let expected: Vec<LogEvent> = (count.saturating_sub(capacity)..count).map(event).collect();
        prop_assert_eq!(logs, expected);
    }
}
