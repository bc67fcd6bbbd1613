use router_log_exporter::{CaseSensitivity, LogDelta, LogSnapshot};

fn snapshot(lines: &[&str]) -> LogSnapshot {
    lines.iter().copied().collect()
}

/// Pairs of (previous, current) snapshots covering overlap, rotation,
/// truncation and duplicates.
fn cases() -> Vec<(LogSnapshot, LogSnapshot)> {
    vec![
        (snapshot(&[]), snapshot(&[])),
        (snapshot(&[]), snapshot(&["a", "a", "b"])),
        (snapshot(&["a", "b"]), snapshot(&["a", "b", "c"])),
        (snapshot(&["a", "b"]), snapshot(&["b", "a"])),
        (snapshot(&["a", "b", "c"]), snapshot(&["c", "d"])),
        (snapshot(&["a", "a"]), snapshot(&["a", "b", "b", "a"])),
        (snapshot(&["x"]), snapshot(&[])),
        (
            snapshot(&["10:00 DSL up", "10:01 WLAN up"]),
            snapshot(&["10:02 Login admin", "10:00 DSL up", "10:01 WLAN up"]),
        ),
    ]
}

#[test]
fn test_delta_is_exactly_the_lines_absent_from_previous() {
    for (previous, current) in cases() {
        let delta = LogDelta::between(&previous, &current, CaseSensitivity::Sensitive);

        let expected: Vec<&str> = current
            .iter()
            .filter(|line| !previous.iter().any(|seen| seen == *line))
            .collect();
        assert_eq!(delta.lines(), expected.as_slice(), "prev={previous:?} new={current:?}");
    }
}

#[test]
fn test_delta_of_snapshot_with_itself_is_empty() {
    for (previous, current) in cases() {
        for snap in [&previous, &current] {
            assert!(LogDelta::between(snap, snap, CaseSensitivity::Sensitive).is_empty());
            assert!(LogDelta::between(snap, snap, CaseSensitivity::Insensitive).is_empty());
        }
    }
}

#[test]
fn test_delta_against_empty_baseline_is_whole_snapshot() {
    for (_, current) in cases() {
        let delta = LogDelta::between(&LogSnapshot::empty(), &current, CaseSensitivity::Sensitive);
        assert_eq!(delta.to_owned_lines(), current.lines());
    }
}

#[test]
fn test_newest_entries_first_layout() {
    // Routers usually list newest entries at the top; prepending must still be detected
    let previous = snapshot(&["09:00 boot", "08:59 power on"]);
    let current = snapshot(&["09:05 dsl sync", "09:00 boot", "08:59 power on"]);

    let delta = LogDelta::between(&previous, &current, CaseSensitivity::Sensitive);
    assert_eq!(delta.lines(), &["09:05 dsl sync"]);
}
