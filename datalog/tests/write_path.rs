mod common;

use common::harness;
use fibre_datalog::{Error, Measurement, Metadata, Options, Value, ValueKind};
use pretty_assertions::assert_eq;

#[test]
fn test_repeated_writes_create_one_handle_per_sink() {
  let h = harness(Options::default());

  for i in 0..100 {
    h.clock.advance(20_000);
    h.logger.write("Drive/LeftSpeed", i as f64).unwrap();
  }

  let persisted = h.persisted.entries();
  let live = h.live.entries();
  assert_eq!(persisted.len(), 1);
  assert_eq!(live.len(), 1);
  assert_eq!(persisted[0].metadata, Metadata::new("fibre_datalog"));
  assert_eq!(live[0].metadata, Metadata::new("fibre_datalog"));
  assert_eq!(h.persisted.samples_for("NT/Robot/Drive/LeftSpeed").len(), 100);
  assert_eq!(h.live.samples_for("/Robot/Drive/LeftSpeed").len(), 100);

  let metrics = h.logger.metrics();
  assert_eq!(metrics.writes, 100);
  assert_eq!(metrics.persistent_handles, 1);
  assert_eq!(metrics.live_handles, 1);
}

#[test]
fn test_every_kind_reaches_both_sinks_with_same_timestamp() {
  let h = harness(Options::default());

  h.clock.set(5_000);
  h.logger.write("Flags/Ready", true).unwrap();
  h.clock.set(6_000);
  h.logger.write("Counts/Ticks", 17_i64).unwrap();
  h.clock.set(7_000);
  h.logger.write("Arm/Angle", 0.5).unwrap();
  h.clock.set(8_000);
  h.logger.write("Drive/Wheels", vec![1.0, 2.0]).unwrap();
  h.clock.set(9_000);
  h.logger.write("State/Mode", "teleop").unwrap();
  h.clock.set(10_000);
  h.logger.write("State/Commands", &["Drive", "Intake"][..]).unwrap();

  let persisted = h.persisted.samples();
  let live = h.live.samples();
  assert_eq!(persisted.len(), 6);
  assert_eq!(live.len(), 6);

  for (p, l) in persisted.iter().zip(live.iter()) {
    assert_eq!(p.timestamp, l.timestamp);
    assert_eq!(p.value, l.value);
  }

  let kinds: Vec<ValueKind> = h.persisted.entries().iter().map(|e| e.kind).collect();
  assert_eq!(kinds, ValueKind::ALL.to_vec());
  assert_eq!(
    persisted.iter().map(|s| s.timestamp).collect::<Vec<_>>(),
    vec![5_000, 6_000, 7_000, 8_000, 9_000, 10_000]
  );
}

#[test]
fn test_timestamps_never_go_backwards() {
  let h = harness(Options::default());

  h.clock.set(50_000);
  h.logger.write("Loop/Count", 1_i64).unwrap();
  h.clock.set(10_000);
  h.logger.write("Loop/Count", 2_i64).unwrap();

  let stamps: Vec<u64> = h
    .persisted
    .samples_for("NT/Robot/Loop/Count")
    .into_iter()
    .map(|(ts, _)| ts)
    .collect();
  assert_eq!(stamps, vec![50_000, 50_000]);
}

#[test]
fn test_measurement_key_is_decorated_with_unit() {
  let h = harness(Options::default());

  h.logger
    .write_measure("Units/Height", &Measurement::new(1.5, "m"))
    .unwrap();
  h.logger
    .write_measure("Units/Height", &Measurement::new(59.05, "in"))
    .unwrap();

  assert_eq!(
    h.persisted.paths(),
    vec!["NT/Robot/Units/Height(m)", "NT/Robot/Units/Height(in)"]
  );
  assert_eq!(
    h.live.samples_for("/Robot/Units/Height(m)"),
    vec![(1_000, Value::Float(1.5))]
  );
  assert_eq!(h.logger.metrics().measurements, 2);
}

#[test]
fn test_disabled_logger_touches_no_sink() {
  let h = harness(Options::default());
  h.logger.write("Arm/Angle", 1.0).unwrap();
  let before = h.persisted.interaction_count() + h.live.interaction_count();

  // Act
  h.logger.set_enabled(false);
  assert!(!h.logger.is_enabled());
  h.logger.write("Arm/Angle", 2.0).unwrap();
  h.logger.write("Arm/NewKey", true).unwrap();
  h.logger
    .write_measure("Arm/Height", &Measurement::new(0.2, "m"))
    .unwrap();

  // Assert
  let after = h.persisted.interaction_count() + h.live.interaction_count();
  assert_eq!(before, after);

  // Re-enabling reuses the cached handle.
  h.logger.set_enabled(true);
  h.logger.write("Arm/Angle", 3.0).unwrap();
  assert_eq!(h.persisted.entries().len(), 1);
  assert_eq!(h.persisted.samples().len(), 2);
}

#[test]
fn test_live_publishing_can_be_turned_off() {
  let h = harness(Options::default().publish_live(false));

  h.logger.write("Vision/HasTarget", false).unwrap();

  assert_eq!(h.persisted.samples().len(), 1);
  assert_eq!(h.live.interaction_count(), 0);
}

#[test]
fn test_prefix_change_is_not_retroactive() {
  let h = harness(Options::default().persist_with_live_prefix(false));

  h.logger.write("Old/Key", 1_i64).unwrap();

  // Act
  h.logger
    .set_options(Options::default().persist_with_live_prefix(true))
    .unwrap();
  h.logger.write("Old/Key", 2_i64).unwrap();
  h.logger.write("New/Key", 3_i64).unwrap();

  // Assert
  assert_eq!(h.persisted.paths(), vec!["/Robot/Old/Key", "NT/Robot/New/Key"]);
  assert_eq!(
    h.persisted.samples_for("/Robot/Old/Key"),
    vec![(1_000, Value::Int(1)), (1_000, Value::Int(2))]
  );
  // The live sink never carries the namespace.
  assert_eq!(h.live.paths(), vec!["/Robot/Old/Key", "/Robot/New/Key"]);
}

#[test]
fn test_key_logged_under_two_kinds_gets_two_handles() {
  let h = harness(Options::default());

  h.logger.write("Debug/MotorPosition", 12.5).unwrap();
  h.logger.write("Debug/MotorPosition", 12_i64).unwrap();

  let entries = h.persisted.entries();
  assert_eq!(entries.len(), 2);
  assert_eq!(entries[0].path, entries[1].path);
  assert_eq!(entries[0].kind, ValueKind::Float);
  assert_eq!(entries[1].kind, ValueKind::Int);
}

#[test]
fn test_transport_failure_is_reported_and_other_sink_still_written() {
  let h = harness(Options::default());
  h.persisted.fail_creation("NT/Robot/Broken");

  let err = h.logger.write("Broken", 1.0).unwrap_err();

  assert!(err.is_transport());
  match err {
    Error::HandleCreation { sink, path, .. } => {
      assert_eq!(sink, "persistent");
      assert_eq!(path, "NT/Robot/Broken");
    }
    other => panic!("unexpected error: {other}"),
  }
  assert_eq!(h.live.samples_for("/Robot/Broken").len(), 1);
  assert_eq!(h.logger.metrics().transport_errors, 1);

  // No retries are queued; the next write simply tries again.
  h.persisted.heal();
  h.logger.write("Broken", 2.0).unwrap();
  assert_eq!(h.persisted.samples_for("NT/Robot/Broken"), vec![(1_000, Value::Float(2.0))]);
}

#[test]
fn test_set_options_rejects_zero_period() {
  let h = harness(Options::default());

  let err = h
    .logger
    .set_options(Options::default().extras_period(std::time::Duration::ZERO))
    .unwrap_err();

  assert!(matches!(err, Error::InvalidConfigValue { .. }));
  assert_eq!(h.logger.options(), Options::default());
}

#[test]
fn test_builder_requires_persistent_transport() {
  let err = fibre_datalog::DataLogger::builder().build().unwrap_err();
  assert!(matches!(err, Error::MissingPersistentTransport));
}

#[test]
fn test_logger_without_live_transport_only_persists() {
  let persisted = fibre_datalog::MemoryTransport::new();
  let logger = fibre_datalog::DataLogger::builder()
    .persistent(persisted.clone())
    .config(fibre_datalog::Config::default().root_table("Bench"))
    .build()
    .unwrap();

  logger.write("Voltage", 12.1).unwrap();

  assert_eq!(persisted.paths(), vec!["NT/Bench/Voltage"]);
  assert_eq!(logger.metrics().live_handles, 0);
}
