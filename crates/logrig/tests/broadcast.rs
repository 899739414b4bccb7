use chrono::NaiveDate;
use logrig::{
    parse_rotation, ConfigParams, ConfigTemplates, Error, Fields, Level, LoggerConfig, LoggerEvent,
    LoggerRegistry, RetentionRule, RotationPreset, RotationRule,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn recorded(registry: &LoggerRegistry, event_type: &str) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = registry.subscribe(event_type, move |e: &LoggerEvent| {
        sink.lock().push(e.name().to_string());
        Ok(())
    });
    seen
}

#[test]
fn test_update_reaches_every_attached_logger() {
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::new(ConfigParams::new().rotation("10 MB").retention(5u64)).unwrap();
    config.apply_to(&registry, ["a", "b"]).unwrap();

    config.update(ConfigParams::new().level("DEBUG")).unwrap();

    for name in ["a", "b"] {
        let settings = registry.get(name).unwrap().settings();
        assert_eq!(settings.level, Level::Debug, "{}", name);
        assert_eq!(
            settings.rotation.rule,
            RotationRule::Size {
                threshold_bytes: 10 * 1024 * 1024
            }
        );
        assert_eq!(settings.retention, RetentionRule::MaxCount(5));
    }
}

#[test]
fn test_rebinding_is_exclusive() {
    let registry = LoggerRegistry::new();
    let a = LoggerConfig::new(ConfigParams::new().level("info")).unwrap();
    let b = LoggerConfig::new(ConfigParams::new().level("warning")).unwrap();

    a.apply_to(&registry, ["n", "m"]).unwrap();
    b.apply_to(&registry, ["n"]).unwrap();

    assert_eq!(a.attached_names(), vec!["m"]);
    assert_eq!(b.attached_names(), vec!["n"]);
    assert_eq!(registry.bound_config("n"), Some(b.id()));

    a.update(ConfigParams::new().level("critical")).unwrap();
    assert_eq!(registry.get("n").unwrap().level(), Level::Warning);
    assert_eq!(registry.get("m").unwrap().level(), Level::Critical);
}

#[test]
fn test_apply_to_reuses_registered_handles() {
    let registry = LoggerRegistry::new();
    let existing = registry.create_or_get("x");
    let handles = ConfigTemplates::testing()
        .clone_with(ConfigParams::new().path(""))
        .unwrap()
        .apply_to(&registry, ["x"])
        .unwrap();
    assert!(handles[0].ptr_eq(&existing));
    assert_eq!(existing.level(), Level::Warning);
}

#[test]
fn test_unregister_removes_binding() {
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::default();
    let handle = config.apply_to(&registry, ["gone"]).unwrap().remove(0);

    assert!(registry.unregister("gone"));
    assert!(config.attached_names().is_empty());
    assert!(matches!(
        handle.write(Level::Info, "x", &Fields::new()),
        Err(Error::HandleUnavailable(_))
    ));

    // a fresh handle carries no memory of the old binding
    let fresh = registry.create_or_get("gone");
    assert_eq!(registry.bound_config("gone"), None);
    config.update(ConfigParams::new().level("error")).unwrap();
    assert_eq!(fresh.level(), Level::Info);
}

#[test]
fn test_recreate_keeps_binding() {
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::new(ConfigParams::new().level("debug")).unwrap();
    let old = config.apply_to(&registry, ["svc"]).unwrap().remove(0);

    let new = registry.recreate("svc").unwrap();
    assert!(old.is_closed());
    assert_eq!(new.level(), Level::Debug);

    config.update(ConfigParams::new().level("error")).unwrap();
    assert_eq!(new.level(), Level::Error);
}

#[test]
fn test_events_follow_lifecycle() {
    let registry = LoggerRegistry::new();
    let registered = recorded(&registry, "registered");
    let bound = recorded(&registry, "bound");
    let updated = recorded(&registry, "updated");
    let detached = recorded(&registry, "detached");

    let config = LoggerConfig::default();
    config.apply_to(&registry, ["a", "b"]).unwrap();
    config.update(ConfigParams::new().level("debug")).unwrap();
    config.detach(["a"]);

    assert_eq!(*registered.lock(), vec!["a", "b"]);
    assert_eq!(*bound.lock(), vec!["a", "b"]);
    assert_eq!(*updated.lock(), vec!["a", "b"]);
    assert_eq!(*detached.lock(), vec!["a"]);
}

#[test]
fn test_failing_subscriber_does_not_break_update() {
    let registry = LoggerRegistry::new();
    let _bad = registry.subscribe("updated", |_| panic!("observer bug"));
    let updated = recorded(&registry, "updated");

    let config = LoggerConfig::default();
    config.apply_to(&registry, ["a"]).unwrap();
    config.update(ConfigParams::new().level("debug")).unwrap();

    assert_eq!(*updated.lock(), vec!["a"]);
    assert_eq!(registry.get("a").unwrap().level(), Level::Debug);
}

#[test]
fn test_update_is_all_or_nothing_on_sink_failure() {
    let dir = TempDir::new().unwrap();
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::new(ConfigParams::new().path(dir.path())).unwrap();
    config.apply_to(&registry, ["a", "b"]).unwrap();

    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "file, not directory").unwrap();

    let err = config
        .update(ConfigParams::new().level("debug").path(&blocker))
        .unwrap_err();
    assert!(matches!(err, Error::SinkIo { .. }));
    assert_eq!(config.settings().level, Level::Info);
    for name in ["a", "b"] {
        let handle = registry.get(name).unwrap();
        assert_eq!(handle.level(), Level::Info);
        assert!(handle.active_file().unwrap().starts_with(dir.path()));
    }
}

#[test]
fn test_writes_land_in_preset_named_files() {
    let dir = TempDir::new().unwrap();
    let registry = LoggerRegistry::new();
    let config = ConfigTemplates::daily()
        .clone_with(ConfigParams::new().path(dir.path()).format("{level}|{message}"))
        .unwrap();
    let handle = config.apply_to(&registry, ["svc"]).unwrap().remove(0);

    handle.write(Level::Info, "hello", &Fields::new()).unwrap();
    let active = dir.path().join("[svc]daily_latest.temp.log");
    assert_eq!(std::fs::read_to_string(&active).unwrap(), "INFO|hello\n");

    config.update(ConfigParams::new().component_name("api")).unwrap();
    assert_eq!(handle.active_file(), Some(dir.path().join("[api]daily_latest.temp.log")));
}

#[test]
fn test_daily_naming_round_trip() {
    let at = NaiveDate::from_ymd_opt(2025, 1, 13)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let naming = RotationPreset::Daily.naming();
    assert_eq!(naming.rotated_file("svc", at), "[svc]20250113.log");
}

#[test]
fn test_invalid_rotation_is_rejected() {
    assert!(matches!(
        parse_rotation("not-a-time"),
        Err(Error::InvalidRotationExpression(e)) if e == "not-a-time"
    ));
    let err = LoggerConfig::new(ConfigParams::new().rotation("not-a-time")).unwrap_err();
    assert_eq!(err.field_name(), Some("rotation"));

    for huge in ["300000000 years", "99999999999999999999999 years"] {
        let err = LoggerConfig::new(ConfigParams::new().rotation(huge)).unwrap_err();
        assert_eq!(err.field_name(), Some("rotation"), "{}", huge);
    }
}

#[test]
fn test_longest_interval_rotation_writes_one_file() {
    let dir = TempDir::new().unwrap();
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::new(ConfigParams::new().path(dir.path()).rotation("100 years")).unwrap();
    let handle = config.apply_to(&registry, ["svc"]).unwrap().remove(0);

    handle.write(Level::Info, "one", &Fields::new()).unwrap();
    handle.write(Level::Info, "two", &Fields::new()).unwrap();
    handle.flush().unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_concurrent_rebinding_keeps_partition() {
    let registry = LoggerRegistry::new();
    let configs: Vec<LoggerConfig> = (0..4).map(|_| LoggerConfig::default()).collect();
    let names: Vec<String> = (0..8).map(|i| format!("n{}", i)).collect();

    thread::scope(|s| {
        for (i, config) in configs.iter().enumerate() {
            let registry = registry.clone();
            let names = &names;
            s.spawn(move || {
                for round in 0..25 {
                    let pick: Vec<&String> = names.iter().skip((i + round) % 3).step_by(2).collect();
                    config.apply_to(&registry, pick).unwrap();
                    config.update(ConfigParams::new().level(if round % 2 == 0 { "debug" } else { "info" })).unwrap();
                }
            });
        }
    });

    // every name is owned by exactly one config, and the ledger agrees
    for name in &names {
        let owners: Vec<u64> = configs
            .iter()
            .filter(|c| c.attached_names().contains(name))
            .map(LoggerConfig::id)
            .collect();
        assert_eq!(owners.len(), 1, "{} owned by {:?}", name, owners);
        assert_eq!(registry.bound_config(name), Some(owners[0]));
    }
}

#[test]
fn test_unregister_racing_bind_leaves_no_stale_binding() {
    let registry = LoggerRegistry::new();
    let config = LoggerConfig::default();
    let names = ["x", "y"];

    thread::scope(|s| {
        s.spawn(|| {
            for round in 0..200 {
                match config.apply_to(&registry, names) {
                    Ok(_) | Err(Error::HandleUnavailable(_)) => {}
                    Err(e) => panic!("unexpected bind failure: {}", e),
                }
                let level = if round % 2 == 0 { "debug" } else { "info" };
                config.update(ConfigParams::new().level(level)).unwrap();
            }
        });
        s.spawn(|| {
            for _ in 0..200 {
                registry.unregister("x");
                thread::yield_now();
            }
        });
    });

    for name in names {
        let bound = registry.bound_config(name);
        assert_eq!(bound.is_some(), config.is_attached(name), "{}", name);
        if !registry.contains(name) {
            assert_eq!(bound, None, "{}", name);
        }
    }

    registry.unregister("x");
    registry.create_or_get("x");
    assert_eq!(registry.bound_config("x"), None);
    assert!(!config.is_attached("x"));
}
