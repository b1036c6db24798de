use std::collections::BTreeMap;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    api::{UploadMode, UploadRequest, UploadResult},
    config::Config,
    error::{ClientError, Result},
    formats::SupportedFormat,
    state::Lifecycle,
};

const NO_SUMMARY: &str = "No summary";

/// Posts single files to the extraction endpoints.
#[derive(Debug, Clone)]
pub struct UploadClient {
    client: reqwest::Client,
    config: Config,
}

impl UploadClient {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    #[instrument(skip_all, fields(mode = %request.mode, file = %request.file_name))]
    pub async fn submit(&self, request: UploadRequest) -> Result<UploadResult> {
        let mut lifecycle = Lifecycle::new("upload");
        lifecycle.validating();

        let format = match request.validate() {
            Ok(format) => format,
            Err(e) => {
                lifecycle.rejected();
                warn!("upload refused before sending: {e}");
                return Err(e.into());
            }
        };

        lifecycle.requesting();
        let outcome = self.send(request, format).await;
        lifecycle.finish(&outcome);

        if let Err(e) = &outcome {
            warn!("upload failed: {e}");
        }
        outcome
    }

    async fn send(&self, request: UploadRequest, format: SupportedFormat) -> Result<UploadResult> {
        let UploadRequest {
            file_name,
            bytes,
            mode,
            ..
        } = request;

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(format.mime())?;
        let form = Form::new().part("file", part);

        let resp = self
            .client
            .post(self.config.endpoint(mode.endpoint()))
            .timeout(self.config.timeout)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            return Err(ClientError::rejected(
                status.as_u16(),
                &body,
                "Error uploading file",
            ));
        }

        let value: Value = serde_json::from_slice(&body)?;
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            info!("server says: {message}");
        }

        Ok(parse_result(mode, &value, &file_name))
    }
}

/// Maps a 2xx JSON body into the result for `mode`, filling in defaults for
/// anything the server left out.
pub fn parse_result(mode: UploadMode, body: &Value, file_name: &str) -> UploadResult {
    let text = |key: &str| {
        body.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    match mode {
        UploadMode::Legacy => UploadResult::Legacy {
            file_name: body
                .get("file_name")
                .and_then(Value::as_str)
                .unwrap_or(file_name)
                .to_string(),
            extracted_text: text("extracted_text"),
        },
        UploadMode::Text => UploadResult::Text {
            extracted_text: text("extracted_text"),
            average_confidence: body
                .get("average_confidence")
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
                .clamp(0.0, 100.0),
        },
        UploadMode::Form => UploadResult::Form {
            fields: body
                .get("form_data")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), flatten(v)))
                        .collect()
                })
                .unwrap_or_else(BTreeMap::new),
        },
        UploadMode::Ai => {
            let info = body.get("summary_and_medicines");
            UploadResult::Ai {
                summary: info
                    .and_then(|i| i.get("summary"))
                    .and_then(Value::as_str)
                    .unwrap_or(NO_SUMMARY)
                    .to_string(),
                medicines: info
                    .and_then(|i| i.get("medicines"))
                    .and_then(Value::as_array)
                    .map(|meds| meds.iter().map(flatten).collect())
                    .unwrap_or_default(),
            }
        }
    }
}

/// Renders a form value as a single string. Lists are joined with `", "`.
fn flatten(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.iter().map(flatten).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::{ErrorKind, ValidationError};

    fn client_for(server: &MockServer) -> UploadClient {
        UploadClient::new(
            reqwest::Client::new(),
            Config::default().with_api_url(&server.uri()),
        )
    }

    fn pdf(mode: UploadMode) -> UploadRequest {
        UploadRequest::new("scan.pdf", b"%PDF-1.4".to_vec(), "application/pdf", mode)
    }

    #[test]
    fn text_defaults_when_fields_missing() {
        let result = parse_result(UploadMode::Text, &json!({}), "x.pdf");
        assert_eq!(
            result,
            UploadResult::Text {
                extracted_text: String::new(),
                average_confidence: 0.0
            }
        );
    }

    #[test]
    fn ai_defaults_when_block_missing() {
        let result = parse_result(UploadMode::Ai, &json!({"other": 1}), "x.pdf");
        assert_eq!(
            result,
            UploadResult::Ai {
                summary: "No summary".into(),
                medicines: vec![]
            }
        );
    }

    #[test]
    fn form_values_are_flattened() {
        let body = json!({"form_data": {
            "names": ["Asha Rao", "Vikram"],
            "emails": [],
            "age": 42,
            "note": null,
            "ward": "B2"
        }});
        let UploadResult::Form { fields } = parse_result(UploadMode::Form, &body, "f.png") else {
            panic!("expected form result");
        };
        assert_eq!(fields["names"], "Asha Rao, Vikram");
        assert_eq!(fields["emails"], "");
        assert_eq!(fields["age"], "42");
        assert_eq!(fields["note"], "");
        assert_eq!(fields["ward"], "B2");
    }

    #[test]
    fn legacy_falls_back_to_uploaded_name_and_confidence_is_clamped() {
        let result = parse_result(UploadMode::Legacy, &json!({"extracted_text": "hi"}), "a.png");
        assert_eq!(
            result,
            UploadResult::Legacy {
                file_name: "a.png".into(),
                extracted_text: "hi".into()
            }
        );

        let result = parse_result(UploadMode::Text, &json!({"average_confidence": 140.2}), "a");
        assert!(matches!(result, UploadResult::Text { average_confidence, .. } if average_confidence == 100.0));
    }

    #[tokio::test]
    async fn unsupported_format_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let req = UploadRequest::new("notes.txt", b"hello".to_vec(), "text/plain", UploadMode::Text);
        let err = client_for(&server).submit(req).await.unwrap_err();

        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::UnsupportedFormat(ref m)) if m == "text/plain"
        ));
    }

    #[tokio::test]
    async fn text_upload_sends_multipart_file_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-text"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .and(body_string_contains("name=\"file\""))
            .and(body_string_contains("filename=\"scan.pdf\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "File uploaded and text extracted successfully",
                "extracted_text": "Paracetamol 500mg\n",
                "average_confidence": 97.5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).submit(pdf(UploadMode::Text)).await.unwrap();
        assert_eq!(
            result,
            UploadResult::Text {
                extracted_text: "Paracetamol 500mg\n".into(),
                average_confidence: 97.5
            }
        );
    }

    #[tokio::test]
    async fn text_upload_without_confidence_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-text"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"extracted_text": "x"})))
            .mount(&server)
            .await;

        let result = client_for(&server).submit(pdf(UploadMode::Text)).await.unwrap();
        assert!(matches!(result, UploadResult::Text { average_confidence, .. } if average_confidence == 0.0));
    }

    #[tokio::test]
    async fn ai_upload_hits_extract_info() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract-info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "summary_and_medicines": {
                    "summary": "Fever, three days",
                    "medicines": ["Paracetamol", "ORS"]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = client_for(&server).submit(pdf(UploadMode::Ai)).await.unwrap();
        assert_eq!(
            result,
            UploadResult::Ai {
                summary: "Fever, three days".into(),
                medicines: vec!["Paracetamol".into(), "ORS".into()]
            }
        );
    }

    #[tokio::test]
    async fn rejection_surfaces_server_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-form"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad file"})))
            .mount(&server)
            .await;

        let err = client_for(&server).submit(pdf(UploadMode::Form)).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::RequestRejected { status: 400, ref detail } if detail == "bad file"
        ));
    }

    #[tokio::test]
    async fn rejection_without_detail_uses_generic_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({})))
            .mount(&server)
            .await;

        let err = client_for(&server).submit(pdf(UploadMode::Legacy)).await.unwrap_err();
        assert_eq!(err.detail(), Some("Error uploading file"));
    }

    #[tokio::test]
    async fn malformed_json_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).submit(pdf(UploadMode::Text)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn slow_extraction_times_out_as_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-text"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"extracted_text": "late"}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = Config::default().with_api_url(&server.uri());
        config.timeout = Duration::from_millis(200);
        let client = UploadClient::new(reqwest::Client::new(), config);

        let started = Instant::now();
        let err = client.submit(pdf(UploadMode::Text)).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = UploadClient::new(
            reqwest::Client::new(),
            Config::default().with_api_url("http://127.0.0.1:1"),
        );
        let err = client.submit(pdf(UploadMode::Text)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
