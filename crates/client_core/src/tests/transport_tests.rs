use std::{sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use shared::{
    domain::{FieldId, FileCandidate},
    error::{ErrorCode, ReportApiError},
};
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

use crate::{
    attachments::AttachmentStore,
    transport::{
        HttpTransport, PayloadAttachment, ReportPayload, ReportTransport, SimulatedTransport,
        TransportError,
    },
    validation::FormState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct CapturedPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
struct ServerState {
    parts: Arc<Mutex<Vec<CapturedPart>>>,
}

async fn accept_report(State(state): State<ServerState>, mut multipart: Multipart) -> StatusCode {
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let Ok(bytes) = field.bytes().await else {
            return StatusCode::BAD_REQUEST;
        };
        state.parts.lock().await.push(CapturedPart {
            name,
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }
    StatusCode::OK
}

async fn reject_report() -> (StatusCode, Json<ReportApiError>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ReportApiError::new(
            ErrorCode::Validation,
            "receipt_0 is not readable",
        )),
    )
}

async fn spawn_report_server() -> Result<(Url, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/reports", post(accept_report))
        .route("/rejecting", post(reject_report))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((Url::parse(&format!("http://{addr}/reports"))?, state))
}

fn sample_payload() -> ReportPayload {
    ReportPayload {
        fields: vec![
            (FieldId::NewLeads, "12".to_string()),
            (FieldId::DealAmount, "1500.50".to_string()),
            (FieldId::Comments, String::new()),
        ],
        attachments: vec![PayloadAttachment {
            part_name: "receipt_0".to_string(),
            file_name: "check.png".to_string(),
            mime_type: "image/png".to_string(),
            content: vec![0x89, b'P', b'N', b'G'],
        }],
    }
}

#[tokio::test]
async fn http_transport_posts_fields_and_receipts_as_multipart() {
    let (endpoint, state) = spawn_report_server().await.expect("spawn server");
    let transport = HttpTransport::new(endpoint);

    transport
        .submit(&sample_payload())
        .await
        .expect("report accepted");

    let parts = state.parts.lock().await.clone();
    let text = |name: &str| {
        parts
            .iter()
            .find(|part| part.name == name)
            .map(|part| String::from_utf8_lossy(&part.bytes).to_string())
    };
    assert_eq!(text("newLeads").as_deref(), Some("12"));
    assert_eq!(text("dealAmount").as_deref(), Some("1500.50"));
    assert_eq!(text("comments").as_deref(), Some(""));

    let receipt = parts
        .iter()
        .find(|part| part.name == "receipt_0")
        .expect("receipt part");
    assert_eq!(receipt.file_name.as_deref(), Some("check.png"));
    assert_eq!(receipt.content_type.as_deref(), Some("image/png"));
    assert_eq!(receipt.bytes, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn http_transport_surfaces_api_error_body() {
    let (endpoint, _state) = spawn_report_server().await.expect("spawn server");
    let rejecting = endpoint.join("/rejecting").expect("join url");
    let transport = HttpTransport::new(rejecting);

    let err = transport
        .submit(&sample_payload())
        .await
        .expect_err("endpoint rejects");

    match err {
        TransportError::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert!(message.contains("receipt_0 is not readable"), "{message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn http_transport_reports_unreachable_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let endpoint = Url::parse(&format!("http://{addr}/reports")).expect("url");

    let err = HttpTransport::new(endpoint)
        .submit(&sample_payload())
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, TransportError::Http(_)));
}

#[tokio::test]
async fn simulated_transport_succeeds_or_fails_as_configured() {
    let payload = sample_payload();

    SimulatedTransport::new(Duration::from_millis(5))
        .submit(&payload)
        .await
        .expect("simulated success");

    let err = SimulatedTransport::failing(Duration::from_millis(5))
        .submit(&payload)
        .await
        .expect_err("simulated failure");
    assert!(matches!(err, TransportError::Unavailable(_)));
}

#[test]
fn payload_carries_every_answer_and_numbers_receipts() {
    let mut form = FormState::default();
    form.set_value(FieldId::NewLeads, "7");
    form.set_value(FieldId::Comments, "ok");

    let mut attachments = AttachmentStore::default();
    attachments.replace(vec![
        FileCandidate {
            name: "a.pdf".to_string(),
            size_bytes: 3,
            mime_type: "application/pdf".to_string(),
            content: b"pdf".to_vec(),
        },
        FileCandidate {
            name: "b.jpg".to_string(),
            size_bytes: 3,
            mime_type: "image/jpeg".to_string(),
            content: b"jpg".to_vec(),
        },
    ]);

    let payload = ReportPayload::assemble(&form, &attachments);

    assert_eq!(payload.fields.len(), 10);
    assert_eq!(payload.field(FieldId::NewLeads), Some("7"));
    assert_eq!(payload.field(FieldId::PaidOrders), Some(""));
    assert_eq!(payload.field(FieldId::Receipts), None);
    let parts: Vec<_> = payload
        .attachments
        .iter()
        .map(|attachment| (attachment.part_name.as_str(), attachment.file_name.as_str()))
        .collect();
    assert_eq!(parts, vec![("receipt_0", "a.pdf"), ("receipt_1", "b.jpg")]);
}
