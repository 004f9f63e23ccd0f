//! Tests for messages, attachments and responses.

use switchboard_core::{
    Attachment, AttachmentKind, Citation, Completion, Error, Message, Prompt, ResponseMetadata,
    SendResponse, Usage, error_body, error_message,
};

// --- attachments ---

#[test]
fn payload_prefers_base64_field() {
    let attachment = Attachment::image("image/png", "aGVsbG8=");
    assert_eq!(attachment.payload().as_deref(), Some("aGVsbG8="));
    assert_eq!(
        attachment.data_uri().as_deref(),
        Some("data:image/png;base64,aGVsbG8=")
    );
}

#[test]
fn payload_falls_back_to_data_uri() {
    let attachment = Attachment {
        kind: AttachmentKind::Image,
        uri: "data:image/jpeg;base64,aGVsbG8=".into(),
        mime_type: "image/jpeg".into(),
        base64: None,
        file_name: None,
        file_size: None,
    };
    assert_eq!(attachment.payload().as_deref(), Some("aGVsbG8="));
}

#[test]
fn file_uri_cannot_be_inlined() {
    let attachment = Attachment {
        kind: AttachmentKind::Document,
        uri: "file:///tmp/report.pdf".into(),
        mime_type: "application/pdf".into(),
        base64: None,
        file_name: Some("report.pdf".into()),
        file_size: Some(1024),
    };
    assert!(attachment.payload().is_none());
    assert!(attachment.is_pdf());
    assert_eq!(attachment.label(), "report.pdf");
}

#[test]
fn prompt_inherits_message_attachments() {
    let mut message = Message::user("1", "look");
    message.attachments.push(Attachment::image("image/png", "aGVsbG8="));
    assert_eq!(Prompt::new(message).attachments.len(), 1);
}

#[test]
fn message_serializes_sender_type() {
    let message = Message::ai("2", "Claude", "hi");
    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["sender_type"], "ai");
    assert!(json.get("attachments").is_none());
}

// --- responses ---

#[test]
fn plain_text_response() {
    let response = SendResponse::from("hi".to_owned());
    assert_eq!(response.text(), "hi");
    assert!(response.usage().is_none());
    assert!(response.citations().is_empty());
}

#[test]
fn structured_response_accessors() {
    let response = SendResponse::from(Completion {
        response: "answer".into(),
        model_used: Some("sonar-pro".into()),
        usage: Some(Usage::new(3, 4)),
        metadata: Some(ResponseMetadata {
            citations: vec![Citation {
                index: 1,
                url: "https://example.com".into(),
                title: None,
                snippet: None,
            }],
            provider_metadata: None,
        }),
    });
    assert_eq!(response.text(), "answer");
    assert_eq!(response.model_used(), Some("sonar-pro"));
    assert_eq!(response.usage().unwrap().total_tokens, 7);
    assert_eq!(response.citations()[0].index, 1);
}

#[test]
fn usage_total_saturates() {
    assert_eq!(Usage::new(u32::MAX, 1).total_tokens, u32::MAX);
    assert_eq!(Usage::new(2, 5).total_tokens, 7);
}

// --- errors ---

#[test]
fn error_message_lookup_order() {
    let status = reqwest::StatusCode::TOO_MANY_REQUESTS;
    let nested = serde_json::json!({ "error": { "message": "slow down" }, "message": "outer" });
    assert_eq!(error_message(&nested, status), "slow down");

    let flat = serde_json::json!({ "message": "outer" });
    assert_eq!(error_message(&flat, status), "outer");

    assert_eq!(error_message(&error_body("<html>"), status), "Too Many Requests");
}

#[test]
fn error_formats() {
    let api = Error::Api {
        provider: "OpenAI".into(),
        status: 401,
        message: "Invalid key".into(),
    };
    assert_eq!(api.to_string(), "OpenAI API error (401): Invalid key");
    assert_eq!(api.status(), Some(401));

    let claude = Error::Claude {
        status: 529,
        message: "Overloaded".into(),
        kind: Some("overloaded_error".into()),
    };
    assert_eq!(claude.to_string(), "Anthropic API error: 529 - Overloaded");
}
