use super::*;

#[test]
fn fake_clock_advances_monotonically() {
    let clock = FakeClock::new(100.0);
    assert_eq!(clock.now_secs(), 100.0);
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.now_secs(), 105.0);
}

#[test]
fn fake_clock_set_is_absolute() {
    let clock = FakeClock::new(100.0);
    clock.set(42.0);
    assert_eq!(clock.now_secs(), 42.0);
}

#[test]
fn system_clock_is_increasing() {
    let clock = SystemClock;
    let a = clock.now_secs();
    std::thread::sleep(Duration::from_millis(5));
    let b = clock.now_secs();
    assert!(b > a);
}
