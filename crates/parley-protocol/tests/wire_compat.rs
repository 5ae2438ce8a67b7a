// Wire format the bundled chat page and any other browser client depend on.

use parley_protocol::frames::{decode_message, EventFrame, FrameError, InboundFrame};

#[test]
fn message_event_serialization() {
    let json = EventFrame::message("hello").to_json();

    assert!(json.contains(r#""type":"event""#));
    assert!(json.contains(r#""event":"message""#));
    assert!(json.contains(r#""payload":"hello""#));
}

#[test]
fn inbound_message_is_decoded() {
    let json = r#"{"type":"event","event":"message","payload":"hi there"}"#;
    assert_eq!(decode_message(json).unwrap(), "hi there");
}

#[test]
fn payload_is_opaque_text() {
    // structured content stays embedded in the string, untouched
    let inner = r#"{"username":"ada","text":"hi","ts":"10:42"}"#;
    let frame = EventFrame::message(inner).to_json();
    assert_eq!(decode_message(&frame).unwrap(), inner);
}

#[test]
fn outbound_frame_parses_as_inbound() {
    let frame: InboundFrame = serde_json::from_str(&EventFrame::message("x").to_json()).unwrap();
    assert_eq!(frame.frame_type, "event");
    assert_eq!(frame.event.as_deref(), Some("message"));
}

#[test]
fn malformed_json_rejected() {
    assert!(matches!(decode_message("not json"), Err(FrameError::Malformed(_))));
}

#[test]
fn wrong_type_rejected() {
    let json = r#"{"type":"req","id":"1","method":"chat.send"}"#;
    assert!(matches!(decode_message(json), Err(FrameError::UnexpectedType(t)) if t == "req"));
}

#[test]
fn other_event_names_rejected() {
    let json = r#"{"type":"event","event":"typing","payload":"x"}"#;
    assert!(matches!(decode_message(json), Err(FrameError::UnknownEvent(e)) if e == "typing"));

    let missing = r#"{"type":"event","payload":"x"}"#;
    assert!(matches!(decode_message(missing), Err(FrameError::UnknownEvent(_))));
}

#[test]
fn non_string_payload_rejected() {
    let json = r#"{"type":"event","event":"message","payload":{"text":"hi"}}"#;
    assert!(matches!(decode_message(json), Err(FrameError::NonTextPayload)));

    let absent = r#"{"type":"event","event":"message"}"#;
    assert!(matches!(decode_message(absent), Err(FrameError::NonTextPayload)));
}

#[test]
fn empty_string_payload_allowed() {
    let json = r#"{"type":"event","event":"message","payload":""}"#;
    assert_eq!(decode_message(json).unwrap(), "");
}
