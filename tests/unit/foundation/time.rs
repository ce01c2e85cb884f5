use super::*;

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new();
    let handle = clock.clone();
    assert_eq!(clock.now(), Duration::ZERO);

    handle.advance(Duration::from_millis(250));
    assert_eq!(clock.now(), Duration::from_millis(250));
}

#[test]
fn system_clock_is_monotonic() {
    let clock = SystemClock::new();
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}

#[test]
fn recording_pacer_records_without_sleeping() {
    let pacer = RecordingPacer::new();
    let mut boxed: Box<dyn Pacer> = Box::new(pacer.clone());
    boxed.sleep(Duration::from_secs(3600));
    boxed.sleep(Duration::from_millis(5));

    assert_eq!(
        pacer.delays(),
        vec![Duration::from_secs(3600), Duration::from_millis(5)]
    );
    assert_eq!(pacer.total(), Duration::from_millis(3_600_005));
}
