mod common;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{harness, FixedPower};
use fibre_datalog::Options;

const KEYS: usize = 50;
const WRITES_PER_THREAD: usize = 5_000;

#[test]
fn test_interleaved_writes_never_duplicate_handles() {
  let h = Arc::new(harness(Options::default()));
  let barrier = Arc::new(Barrier::new(2));
  let mut handles = vec![];

  for thread_index in 0..2 {
    let h = h.clone();
    let barrier = barrier.clone();
    handles.push(thread::spawn(move || {
      barrier.wait();
      for i in 0..WRITES_PER_THREAD {
        // Both threads walk the same keys, offset so they collide often.
        let key = format!("Stress/Key{}", (i + thread_index * 7) % KEYS);
        h.logger.write(&key, i as f64).unwrap();
      }
    }));
  }

  for handle in handles {
    handle.join().unwrap();
  }

  let entries = h.persisted.entries();
  let unique: HashSet<&str> = entries.iter().map(|e| e.path.as_str()).collect();
  assert_eq!(entries.len(), KEYS, "no duplicate handles");
  assert_eq!(unique.len(), KEYS);
  assert_eq!(h.live.entries().len(), KEYS);

  // No lost writes either.
  assert_eq!(h.persisted.samples().len(), 2 * WRITES_PER_THREAD);
  assert_eq!(h.live.samples().len(), 2 * WRITES_PER_THREAD);
  assert_eq!(h.logger.metrics().writes, (2 * WRITES_PER_THREAD) as u64);
}

#[test]
fn test_caller_writes_interleave_with_extras_task() {
  let h = harness(
    Options::default()
      .log_extras(true)
      .extras_period(std::time::Duration::from_millis(1)),
  );
  h.logger
    .set_power_source(Arc::new(FixedPower::new(25.0, 12.0, vec![0.1; 4])));

  // The caller also logs some of the keys the extras battery uses.
  for i in 0..WRITES_PER_THREAD {
    let key = if i % 2 == 0 {
      "PowerDistribution/ChannelCount".to_string()
    } else {
      format!("Loop/Key{}", i % KEYS)
    };
    h.logger.write(&key, i as i64).unwrap();
  }
  h.logger.shutdown();

  let entries = h.persisted.entries();
  let unique: HashSet<(String, fibre_datalog::ValueKind)> =
    entries.iter().map(|e| (e.path.clone(), e.kind)).collect();
  assert_eq!(unique.len(), entries.len(), "each (path, kind) registered once");

  let extras_writes = h.logger.metrics().extras_writes as usize;
  assert_eq!(h.persisted.samples().len(), WRITES_PER_THREAD + extras_writes);
}

#[test]
fn test_racing_set_options_leave_task_matching_options() {
  let h = Arc::new(harness(Options::default()));

  for _ in 0..50 {
    let barrier = Arc::new(Barrier::new(2));
    let mut handles = vec![];
    for log_extras in [true, false] {
      let h = h.clone();
      let barrier = barrier.clone();
      handles.push(thread::spawn(move || {
        barrier.wait();
        h.logger
          .set_options(
            Options::default()
              .log_extras(log_extras)
              .extras_period(std::time::Duration::from_millis(50)),
          )
          .unwrap();
      }));
    }
    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(h.logger.options().log_extras, h.logger.is_extras_running());
  }

  h.logger.shutdown();
}
