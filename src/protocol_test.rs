use super::*;
use serde_json::json;

fn point(x: f64, y: f64) -> serde_json::Value {
    json!({"x": x, "y": y, "color": "#fff", "width": 3.0})
}

// =============================================================================
// parse
// =============================================================================

#[test]
fn join_accepts_bare_string_and_alias() {
    let inbound = parse(&Frame::new("joinRoom", json!("lobby"))).unwrap();
    assert_eq!(inbound.event, ClientEvent::Join);
    assert_eq!(inbound.room_hint.as_deref(), Some("lobby"));

    let inbound = parse(&Frame::new("join", json!({"roomId": "lobby"}))).unwrap();
    assert_eq!(inbound.event, ClientEvent::Join);
    assert_eq!(inbound.room_hint.as_deref(), Some("lobby"));
}

#[test]
fn drawing_parses_points() {
    let frame = Frame::new("drawing", json!({"roomId": "r", "line": [point(1.0, 2.0), point(3.0, 4.0)]}));
    let inbound = parse(&frame).unwrap();
    let ClientEvent::Drawing { line } = inbound.event else {
        panic!("expected drawing");
    };
    assert_eq!(line.len(), 2);
    assert!((line[1].x - 3.0).abs() < f64::EPSILON);
    assert_eq!(line[0].color, "#fff");
}

#[test]
fn drawing_with_non_array_line_is_malformed() {
    let err = parse(&Frame::new("drawing", json!({"roomId": "r", "line": "nope"}))).unwrap_err();
    assert!(matches!(err, Dropped::MalformedPayload { event: "drawing", .. }));
}

#[test]
fn drawing_point_missing_color_is_malformed() {
    let frame = Frame::new("drawing", json!({"line": [{"x": 1.0, "y": 1.0, "width": 2.0}]}));
    assert!(matches!(parse(&frame), Err(Dropped::MalformedPayload { .. })));
}

#[test]
fn drawing_without_payload_is_malformed() {
    assert!(matches!(
        parse(&Frame::new("drawing", serde_json::Value::Null)),
        Err(Dropped::MalformedPayload { event: "drawing", .. })
    ));
}

#[test]
fn erase_drawing_keeps_empty_lines_for_store_filtering() {
    let frame = Frame::new("eraseDrawing", json!({"lines": [[point(0.0, 0.0)], []]}));
    let ClientEvent::EraseDrawing { lines } = parse(&frame).unwrap().event else {
        panic!("expected eraseDrawing");
    };
    assert_eq!(lines.len(), 2);
    assert!(lines[1].is_empty());
}

#[test]
fn erase_path_defaults_zoom_and_validates_radius() {
    let frame = Frame::new("erasePath", json!({"path": [{"x": 1.0, "y": 1.0}], "radius": 10.0}));
    let ClientEvent::ErasePath { path, radius, zoom } = parse(&frame).unwrap().event else {
        panic!("expected erasePath");
    };
    assert_eq!(path.len(), 1);
    assert!((radius - 10.0).abs() < f64::EPSILON);
    assert!((zoom - 1.0).abs() < f64::EPSILON);

    let bad = Frame::new("erasePath", json!({"path": [], "radius": -1.0}));
    assert!(matches!(parse(&bad), Err(Dropped::MalformedPayload { event: "erasePath", .. })));

    let bad_zoom = Frame::new("erasePath", json!({"path": [], "radius": 1.0, "zoom": 0.0}));
    assert!(parse(&bad_zoom).is_err());
}

#[test]
fn text_update_drops_null_selection() {
    let frame = Frame::new("textUpdate", json!({"roomId": "r", "text": "<p>hi</p>", "selection": null}));
    let inbound = parse(&frame).unwrap();
    assert_eq!(inbound.event, ClientEvent::TextUpdate { text: "<p>hi</p>".into(), selection: None });

    let frame = Frame::new("textUpdate", json!({"text": "x", "selection": {"index": 1, "length": 0}}));
    let ClientEvent::TextUpdate { selection, .. } = parse(&frame).unwrap().event else {
        panic!("expected textUpdate");
    };
    assert_eq!(selection, Some(json!({"index": 1, "length": 0})));
}

#[test]
fn text_delta_text_is_optional() {
    let frame = Frame::new("textDelta", json!({"delta": {"ops": []}, "version": 4}));
    assert_eq!(parse(&frame).unwrap().event, ClientEvent::TextDelta { text: None, version: Some(4) });
}

#[test]
fn presence_reads_nested_color() {
    let frame = Frame::new("userPresence", json!({"roomId": "r", "user": {"id": "x", "name": "User", "color": "#FF5252"}}));
    assert_eq!(parse(&frame).unwrap().event, ClientEvent::UserPresence { color: Some("#FF5252".into()) });

    let frame = Frame::new("userPresence", json!({"roomId": "r"}));
    assert_eq!(parse(&frame).unwrap().event, ClientEvent::UserPresence { color: None });
}

#[test]
fn cursor_requires_both_coordinates() {
    let frame = Frame::new("cursorPosition", json!({"roomId": "r", "canvasX": 10.5, "canvasY": -2.0}));
    assert_eq!(
        parse(&frame).unwrap().event,
        ClientEvent::CursorPosition(CanvasPosition { x: 10.5, y: -2.0 })
    );

    let frame = Frame::new("cursorPosition", json!({"canvasX": 1.0}));
    assert!(matches!(parse(&frame), Err(Dropped::MalformedPayload { event: "cursorPosition", .. })));
}

#[test]
fn unknown_event_is_dropped() {
    assert_eq!(
        parse(&Frame::new("teleport", json!({}))),
        Err(Dropped::UnknownEvent("teleport".into()))
    );
}

// =============================================================================
// Stroke
// =============================================================================

#[test]
fn stroke_rejects_empty_sequences() {
    assert!(Stroke::new(Vec::new()).is_none());
    let stroke = Stroke::new(vec![Point { x: 0.0, y: 0.0, color: "#000".into(), width: 1.0 }]).unwrap();
    assert_eq!(stroke.len(), 1);
    assert!(!stroke.is_empty());
}

// =============================================================================
// ServerEvent encoding
// =============================================================================

#[test]
fn server_events_use_event_data_envelope() {
    let stroke = Stroke::new(vec![Point { x: 1.0, y: 2.0, color: "#abc".into(), width: 4.0 }]).unwrap();
    let event = ServerEvent::History { room_id: "r".into(), lines: vec![stroke], text: "hello".into() };

    let frame = Frame::decode(&event.encode().unwrap()).unwrap();
    assert_eq!(frame.event, "history");
    assert_eq!(frame.data["roomId"], "r");
    assert_eq!(frame.data["text"], "hello");
    assert_eq!(frame.data["lines"][0][0]["color"], "#abc");
}

#[test]
fn cursor_update_uses_camel_case_fields() {
    let user_id = Uuid::new_v4();
    let event = ServerEvent::CursorUpdate { room_id: "r".into(), user_id, canvas_x: 1.0, canvas_y: 2.0 };
    let frame = Frame::decode(&event.encode().unwrap()).unwrap();
    assert_eq!(frame.event, "cursorUpdate");
    assert_eq!(frame.data["userId"], user_id.to_string());
    assert_eq!(frame.data["canvasX"], 1.0);
    assert!(event.is_cursor());
}

#[test]
fn text_update_omits_absent_selection() {
    let event = ServerEvent::TextUpdate { room_id: "r".into(), text: "t".into(), selection: None };
    let frame = Frame::decode(&event.encode().unwrap()).unwrap();
    assert!(frame.data.get("selection").is_none());
    assert_eq!(event.name(), frame.event);
}
