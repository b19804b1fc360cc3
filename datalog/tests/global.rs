use fibre_datalog::{global, DataLogger, MemoryTransport};

#[test]
fn test_global_logger_is_installed_once() {
  assert!(global::global().is_none());

  let first = MemoryTransport::new();
  let installed = global::install(
    DataLogger::builder()
      .persistent(first.clone())
      .build()
      .unwrap(),
  )
  .unwrap();

  // A second install is refused and hands the logger back.
  let second = DataLogger::builder()
    .persistent(MemoryTransport::new())
    .build()
    .unwrap();
  assert!(global::install(second).is_err());

  // Both references point at the same instance.
  global::global().unwrap().write("Global/Key", 1_i64).unwrap();
  installed.write("Global/Key", 2_i64).unwrap();
  assert_eq!(first.entries().len(), 1);
  assert_eq!(first.samples().len(), 2);

  installed.shutdown();
}
