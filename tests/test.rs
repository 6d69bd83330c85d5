use std::collections::HashMap;
use std::time::Duration;

use print_lights::config::defaults;
use print_lights::error::ConfigError;
use print_lights::printer::PrinterState;
use print_lights::profiles::SegmentCommand;
use print_lights::tracker::{heating_percentage, printing_cadence, total_job_duration_threshold};
use print_lights::{
    Cadence, Config, LedProfiles, PollerDecision, PollerSet, PrinterService, PrinterSnapshot,
    RenderProfile, VisualState, WledService, classify,
};
use serde_json::json;

fn snapshot(value: serde_json::Value) -> PrinterSnapshot {
    serde_json::from_value(value).expect("valid snapshot")
}

fn printer(
    state: &str,
    temp_bed: f64,
    target_bed: f64,
    temp_nozzle: f64,
    target_nozzle: f64,
) -> PrinterSnapshot {
    snapshot(json!({
        "printer": {
            "state": state,
            "temp_bed": temp_bed,
            "target_bed": target_bed,
            "temp_nozzle": temp_nozzle,
            "target_nozzle": target_nozzle,
        }
    }))
}

#[test]
fn test_snapshot_decodes_prusalink_status() {
    let decoded = snapshot(json!({
        "job": { "id": 9, "progress": 24.0, "time_remaining": 44880, "time_printing": 14854 },
        "storage": { "path": "/usb/", "name": "usb", "read_only": false },
        "printer": {
            "state": "ATTENTION",
            "temp_bed": 60.0, "target_bed": 60.0,
            "temp_nozzle": 219.0, "target_nozzle": 220.0,
            "axis_z": 43.4, "flow": 100, "speed": 100,
            "fan_hotend": 7035, "fan_print": 6578,
            "status_connect": { "ok": true, "message": "OK" }
        }
    }));
    assert_eq!(decoded.printer.state, PrinterState::Attention);
    let job = decoded.job_or_default();
    assert_eq!(job.progress, 24.0);
    assert_eq!(job.time_remaining, 44880.0);
    assert_eq!(job.time_printing, 14854.0);
}

#[test]
fn test_snapshot_without_job_and_unknown_state() {
    let decoded = printer("PAUSED", 30.0, 0.0, 30.0, 0.0);
    assert_eq!(decoded.printer.state, PrinterState::Unknown);
    assert!(decoded.job.is_none());
    assert_eq!(decoded.job_or_default().progress, 0.0);
}

#[test]
fn test_classify_bed_gap_threshold() {
    let (state, _) = classify(&printer("PRINTING", 55.0, 60.0, 215.0, 215.0));
    assert_eq!(state, VisualState::PrintingHeating);

    let (state, _) = classify(&printer("PRINTING", 57.0, 60.0, 210.0, 215.0));
    assert_eq!(state, VisualState::PrintingPercentage);
}

#[test]
fn test_classify_nozzle_gap_threshold() {
    let (state, _) = classify(&printer("PRINTING", 60.0, 60.0, 208.0, 215.0));
    assert_eq!(state, VisualState::PrintingHeating);

    let (state, _) = classify(&printer("PRINTING", 60.0, 60.0, 209.0, 215.0));
    assert_eq!(state, VisualState::PrintingPercentage);
}

#[test]
fn test_classify_ignores_gaps_without_targets() {
    let (state, _) = classify(&printer("PRINTING", 20.0, 0.0, 20.0, 0.0));
    assert_eq!(state, VisualState::PrintingPercentage);
}

#[test]
fn test_classify_busy_unloading_filament() {
    let (state, decision) = classify(&printer("BUSY", 29.4, 0.0, 43.0, 215.0));
    // Nozzle is far below target, so BUSY heats.
    assert_eq!(state, VisualState::PrintingHeating);
    assert_eq!(decision.start, VisualState::PrintingHeating);

    let (state, decision) = classify(&printer("BUSY", 29.4, 0.0, 212.0, 215.0));
    assert_eq!(state, VisualState::SwitchingFilament);
    assert_eq!(decision.start, VisualState::SwitchingFilament);
}

#[test]
fn test_classify_remaining_states() {
    let cases = [
        ("IDLE", VisualState::Idle),
        ("FINISHED", VisualState::PrintingFinished),
        ("ATTENTION", VisualState::SwitchingFilament),
        ("STOPPED", VisualState::Idle),
        ("ERROR", VisualState::Idle),
    ];
    for (raw, expected) in cases {
        // Large gaps must not matter outside PRINTING and BUSY.
        let (state, decision) = classify(&printer(raw, 30.0, 60.0, 40.0, 215.0));
        assert_eq!(state, expected, "raw state {}", raw);
        assert_eq!(decision.start, expected);
    }
}

#[test]
fn test_classify_decision_stops_every_other_poller() {
    let (state, decision) = classify(&printer("IDLE", 29.3, 0.0, 30.0, 0.0));
    assert_eq!(state, VisualState::Idle);
    assert_eq!(decision.stop.len(), 4);
    assert!(!decision.stop.contains(&VisualState::Idle));
    for other in VisualState::ALL.into_iter().filter(|s| *s != VisualState::Idle) {
        assert!(decision.stop.contains(&other));
    }
}

#[test]
fn test_classify_is_deterministic() {
    let input = printer("PRINTING", 32.4, 60.0, 139.0, 170.0);
    let first = classify(&input);
    for _ in 0..10 {
        assert_eq!(classify(&input), first);
    }
}

#[test]
fn test_poller_set_starts_with_everything_stopped() {
    let pollers = PollerSet::new();
    assert!(pollers.running().is_empty());
    assert_eq!(pollers.cadence(VisualState::PrintingHeating), Cadence::EverySecond);
    assert_eq!(pollers.cadence(VisualState::PrintingPercentage), Cadence::Every10Seconds);
    assert_eq!(pollers.cadence(VisualState::Idle), Cadence::Every5Seconds);
    assert_eq!(pollers.cadence(VisualState::SwitchingFilament), Cadence::EverySecond);
    assert_eq!(pollers.cadence(VisualState::PrintingFinished), Cadence::EverySecond);
}

#[test]
fn test_poller_set_keeps_exactly_one_running() {
    let pollers = PollerSet::new();
    let sequence = [
        VisualState::Idle,
        VisualState::PrintingHeating,
        VisualState::PrintingPercentage,
        VisualState::PrintingPercentage,
        VisualState::SwitchingFilament,
        VisualState::PrintingFinished,
        VisualState::Idle,
    ];
    for state in sequence {
        pollers.apply_decision(&PollerDecision::only(state));
        assert_eq!(pollers.running(), vec![state]);
    }
}

#[test]
fn test_poller_set_apply_decision_is_idempotent() {
    let pollers = PollerSet::new();
    let decision = PollerDecision::only(VisualState::SwitchingFilament);

    let first = pollers.apply_decision(&decision);
    assert_eq!(first.started, Some(VisualState::SwitchingFilament));
    assert!(first.stopped.is_empty());

    let second = pollers.apply_decision(&decision);
    assert!(second.is_noop());
    assert_eq!(pollers.running(), vec![VisualState::SwitchingFilament]);
}

#[test]
fn test_poller_set_swap_reports_stop_and_start() {
    let pollers = PollerSet::new();
    pollers.apply_decision(&PollerDecision::only(VisualState::Idle));
    let transition = pollers.apply_decision(&PollerDecision::only(VisualState::PrintingHeating));
    assert_eq!(transition.stopped, vec![VisualState::Idle]);
    assert_eq!(transition.started, Some(VisualState::PrintingHeating));
}

#[test]
fn test_poller_set_notifies_subscribers() {
    let pollers = PollerSet::new();
    let mut receiver = pollers.subscribe(VisualState::Idle);
    receiver.borrow_and_update();

    pollers.apply_decision(&PollerDecision::only(VisualState::PrintingFinished));
    assert!(!receiver.has_changed().expect("sender alive"));

    pollers.apply_decision(&PollerDecision::only(VisualState::Idle));
    assert!(receiver.has_changed().expect("sender alive"));
    assert!(receiver.borrow_and_update().running);
}

#[test]
fn test_poller_set_retune_only_on_change() {
    let pollers = PollerSet::new();
    pollers.apply_decision(&PollerDecision::only(VisualState::PrintingPercentage));

    assert!(pollers.retune(VisualState::PrintingPercentage, Cadence::FAST));
    assert_eq!(pollers.cadence(VisualState::PrintingPercentage), Cadence::Every5Seconds);
    assert!(!pollers.retune(VisualState::PrintingPercentage, Cadence::FAST));

    // Retuning leaves the running flag alone.
    assert!(pollers.is_running(VisualState::PrintingPercentage));
}

#[test]
fn test_heating_percentage() {
    let heating = printer("PRINTING", 60.0, 60.0, 139.0, 170.0);
    assert_eq!(heating_percentage(&heating.printer), Some(82.0));

    let overshoot = printer("PRINTING", 60.0, 60.0, 180.0, 170.0);
    assert_eq!(heating_percentage(&overshoot.printer), Some(100.0));

    let no_target = printer("PRINTING", 30.0, 60.0, 25.0, 0.0);
    assert_eq!(heating_percentage(&no_target.printer), None);
}

#[test]
fn test_printing_cadence_selection() {
    let job = |remaining: f64, printing: f64| {
        snapshot(json!({
            "printer": { "state": "PRINTING" },
            "job": { "progress": 10.0, "time_remaining": remaining, "time_printing": printing }
        }))
        .job_or_default()
    };

    assert_eq!(printing_cadence(&job(500.0, 200.0), 91), Cadence::FAST);
    // Long jobs on the default strip fall through to the fast branch.
    assert_eq!(printing_cadence(&job(10000.0, 200.0), 91), Cadence::FAST);

    // Five LEDs stand for 20 minutes of job time each.
    assert_eq!(total_job_duration_threshold(5), 1200.0);
    assert_eq!(printing_cadence(&job(700.0, 200.0), 5), Cadence::MEDIUM);
    assert_eq!(printing_cadence(&job(1000.0, 200.0), 5), Cadence::FAST);
}

#[test]
fn test_profiles_lit_leds() {
    let profiles = LedProfiles::new(91, 1);
    assert_eq!(profiles.lit_leds(0.0), 1);
    assert_eq!(profiles.lit_leds(50.0), 46);
    assert_eq!(profiles.lit_leds(100.0), 91);
    assert_eq!(profiles.lit_leds(-5.0), 1);
}

#[test]
fn test_profiles_progress_matrix_single_row() {
    let profiles = LedProfiles::new(91, 1);
    let command = profiles.render(RenderProfile::Printing, 50.0);

    assert!(command.on);
    assert_eq!(command.bri, 255);
    assert_eq!(command.seg.len(), 2);

    let (base, fill) = (&command.seg[0], &command.seg[1]);
    assert_eq!((base.start, base.stop), (Some(0), 45));
    assert_eq!((fill.start, fill.stop), (Some(45), 91));
    assert_eq!(base.fx, Some(2));
    assert_eq!(fill.fx, Some(46));
    assert_eq!(base.bri, Some(255));
    assert_eq!(fill.rev, Some(true));
}

#[test]
fn test_profiles_progress_matrix_two_rows() {
    let profiles = LedProfiles::new(90, 2);
    let command = profiles.render(RenderProfile::Heating, 20.0);
    // 20% of 45 LEDs per row, plus the leading LED.
    let lit = profiles.lit_leds(20.0);
    assert_eq!(lit, 10);

    let spans: Vec<_> = command.seg.iter().map(|s| (s.start, s.stop)).collect();
    assert_eq!(
        spans,
        vec![
            (Some(0), 35),
            (Some(35), 45),
            (Some(45), 80),
            (Some(80), 90),
        ]
    );
}

#[test]
fn test_profiles_idle_is_full_orange() {
    let profiles = LedProfiles::new(91, 1);
    let command = profiles.render(RenderProfile::Idle, 0.0);
    assert_eq!(command.seg.len(), 2);
    assert_eq!(command.seg[0].stop, 0);
    assert_eq!(command.seg[1].start, Some(0));
    assert_eq!(command.seg[1].stop, 91);
    assert_eq!(command.seg[1].ix, Some(45));
}

#[test]
fn test_profiles_fixed_animations_clear_trailing_segments() {
    let profiles = LedProfiles::new(91, 1);
    for profile in [RenderProfile::SwitchingFilament, RenderProfile::Finished] {
        let command = profiles.render(profile, 0.0);
        assert_eq!(command.seg.len(), 11);
        assert_eq!(command.seg[0].start, Some(0));
        assert_eq!(command.seg[0].stop, 91);
        assert!(command.seg[1..].iter().all(|s| *s == SegmentCommand::default()));
    }
}

#[test]
fn test_profiles_finished_serializes_to_wled_json() {
    let profiles = LedProfiles::new(91, 1);
    let value = serde_json::to_value(profiles.render(RenderProfile::Finished, 0.0))
        .expect("serializable");

    assert_eq!(value["on"], json!(true));
    assert_eq!(value["bri"], json!(255));
    assert_eq!(
        value["seg"][0],
        json!({
            "start": 0,
            "stop": 91,
            "col": [[8, 255, 0, 0], [9, 255, 0], [0, 55, 255]],
            "fx": 64,
            "sx": 156,
            "ix": 119,
            "c1": 128,
            "c2": 128,
            "c3": 16
        })
    );
    assert_eq!(value["seg"][1], json!({ "stop": 0 }));
}

fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

const REQUIRED: [(&str, &str); 3] = [
    ("WLED_URL", "http://10.0.0.48/"),
    ("PRUSALINK_URL", "http://10.0.0.44"),
    ("PRUSALINK_API_KEY", "secret"),
];

#[test]
fn test_config_defaults() {
    let config = Config::from_lookup(lookup(&REQUIRED)).expect("valid config");
    assert_eq!(config.wled_url, "http://10.0.0.48");
    assert_eq!(config.prusalink_url, "http://10.0.0.44");
    assert_eq!(config.prusalink_api_key, "secret");
    assert_eq!(config.led_count, defaults::LED_COUNT);
    assert_eq!(config.led_rows, defaults::LED_ROWS);
    assert_eq!(config.http_timeout_seconds, defaults::HTTP_TIMEOUT_SECONDS);
}

#[test]
fn test_config_missing_required_variable() {
    let err = Config::from_lookup(lookup(&REQUIRED[1..])).expect_err("WLED_URL missing");
    match err {
        ConfigError::MissingEnvVar { var_name } => assert_eq!(var_name, "WLED_URL"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_config_rejects_bad_layout() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("LED_ROWS", "2"));
    let err = Config::from_lookup(lookup(&pairs)).expect_err("91 LEDs do not split into 2 rows");
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "LED_ROWS"));

    let mut pairs = REQUIRED.to_vec();
    pairs.push(("LED_COUNT", "many"));
    let err = Config::from_lookup(lookup(&pairs)).expect_err("not a number");
    assert!(err.to_string().contains("LED_COUNT"));
}

#[test]
fn test_config_custom_layout() {
    let mut pairs = REQUIRED.to_vec();
    pairs.push(("LED_COUNT", "120"));
    pairs.push(("LED_ROWS", "4"));
    let config = Config::from_lookup(lookup(&pairs)).expect("valid config");
    assert_eq!(config.led_count, 120);
    assert_eq!(config.led_rows, 4);
}

#[test]
fn test_services_keep_configured_urls() {
    let config = Config::from_lookup(lookup(&REQUIRED)).expect("valid config");
    let timeout = Duration::from_secs(config.http_timeout_seconds);

    let wled = WledService::new(config.wled_url.clone(), timeout).unwrap();
    let printer = PrinterService::new(
        config.prusalink_url.clone(),
        config.prusalink_api_key.clone(),
        timeout,
    )
    .unwrap();

    assert_eq!(wled.base_url(), "http://10.0.0.48");
    assert_eq!(printer.api_url, "http://10.0.0.44");
}
