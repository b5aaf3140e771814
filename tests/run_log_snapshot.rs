use episim::io::debug_log::write_run_log;
use episim::scenario::{InitialCompartments, ModelKind};
use episim::{Event, Scenario};

#[test]
fn run_log_snapshot_small() {
    // No infections and no transmission keep every compartment exactly constant.
    let scenario = Scenario {
        model: ModelKind::Sir,
        population: 1000.0,
        days: 5,
        contact_rate: 0.0,
        recovery_rate: 0.1,
        initial: Some(InitialCompartments { s: 1000.0, e: 0.0, i: 0.0, r: 0.0 }),
        events: vec![Event::set_effective_r(2, 0.0), Event::scale_effective_r(3, 2.0)],
        ..Scenario::default()
    };

    let series = episim::run(&scenario).expect("run scenario");

    let tmp = tempfile::tempdir().expect("tempdir");
    let path = write_run_log(tmp.path(), "TEST-SMALL", &scenario, &series).expect("write run log");
    assert!(path.ends_with("run_TEST-SMALL.txt"));

    let s = std::fs::read_to_string(path).expect("read run log");
    insta::assert_snapshot!(s);
}

#[test]
fn run_log_rejects_mismatched_series() {
    let scenario = Scenario { days: 10, ..Scenario::default() };
    let series = episim::run(&Scenario { days: 5, ..Scenario::default() }).expect("run scenario");
    let tmp = tempfile::tempdir().expect("tempdir");
    assert!(write_run_log(tmp.path(), "BAD", &scenario, &series).is_err());
}
