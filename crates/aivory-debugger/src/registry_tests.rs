use super::*;

fn bp(backend_id: &str, line: u32) -> Breakpoint {
    Breakpoint {
        backend_id: backend_id.to_owned(),
        session_id: None,
        file_path_pattern: "src/foo.js".to_owned(),
        line_number: line,
        condition: None,
    }
}

#[test]
fn duplicate_backend_id_replaces() {
    let mut registry = BreakpointRegistry::new();
    assert!(registry.upsert(bp("b1", 10)).is_none());
    let previous = registry.upsert(bp("b1", 20));
    assert_eq!(previous.unwrap().line_number, 10);
    assert_eq!(registry.len(), 1);
}

#[test]
fn attach_session_id_then_find_by_it() {
    let mut registry = BreakpointRegistry::new();
    registry.upsert(bp("b1", 10));
    registry.attach_session_id("b1", "debugger-session-1".to_owned());
    let found = registry.find_by_session_id("debugger-session-1").unwrap();
    assert_eq!(found.backend_id, "b1");
}

#[test]
fn remove_is_best_effort() {
    let mut registry = BreakpointRegistry::new();
    registry.upsert(bp("b1", 10));
    assert!(registry.remove("b1").is_some());
    assert!(registry.remove("b1").is_none());
    assert!(registry.is_empty());
}

#[test]
fn url_regex_matches_either_slash_style() {
    let pattern = url_regex_pattern("src/foo.js");
    let re = regex::Regex::new(&pattern).unwrap();
    assert!(re.is_match("file:///project/src/foo.js"));
    assert!(re.is_match("file:///project/src\\foo.js"));
    assert!(!re.is_match("src/bar.js"));
}
