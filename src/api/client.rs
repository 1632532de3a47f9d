use crate::api::error::ApiError;
use crate::api::types::{
    DownloadBody, FileDescriptor, HealthReport, LookupResponse, SignedLink, UploadResponse,
};
use crate::config::{endpoints, ApiConfig, BackendStatus};
use crate::upload::{FileProcessor, ProgressFn, SelectedFile};
use crate::utils::ProgressTracker;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Thin client over the DropIt REST API. One request per call, no retries.
#[derive(Clone)]
pub struct ShareClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ShareClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("dropit-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn status(&self) -> BackendStatus {
        self.config.status()
    }

    /// Base URL joined with `segments`, each percent-encoded as a single path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.config.base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn upload(
        &self,
        files: &[SelectedFile],
        on_progress: ProgressFn,
    ) -> Result<UploadResponse, ApiError> {
        if files.is_empty() {
            return Err(ApiError::EmptySelection);
        }

        let url = self.endpoint(endpoints::UPLOAD)?;
        let total: u64 = files.iter().map(|f| f.size).sum();
        let tracker = Arc::new(ProgressTracker::new(total));
        let form = FileProcessor::build_form(files, tracker, on_progress).await?;

        log::info!("Uploading {} files ({} bytes) to {}", files.len(), total, url);
        let response = self
            .http
            .post(url)
            .timeout(self.config.timeout())
            .multipart(form)
            .send()
            .await?;

        let response: UploadResponse = Self::read_json(response).await?;
        log::info!(
            "Upload accepted with code {} ({} files)",
            response.code,
            response.files.len()
        );
        Ok(response)
    }

    pub async fn lookup(&self, code: &str) -> Result<LookupResponse, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::EmptyCode);
        }

        let mut segments: Vec<&str> = endpoints::FILE.to_vec();
        segments.push(code);
        let url = self.endpoint(&segments)?;

        log::info!("Looking up files for code {}", code);
        let response = self
            .http
            .get(url)
            .timeout(self.config.timeout())
            .send()
            .await?;

        let lookup: LookupResponse = Self::read_json(response).await?;
        log::info!("Code {} resolved to {} files", code, lookup.count());
        Ok(lookup)
    }

    /// Opens the content of `file`, following a fresh signed link when the
    /// download endpoint answers with one instead of content.
    pub async fn open_download(&self, file: &FileDescriptor) -> Result<DownloadBody, ApiError> {
        if let Some(url) = file.download_url.as_deref().filter(|u| !u.is_empty()) {
            let url = Url::parse(url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
            let response = Self::require_success(self.http.get(url).send().await?).await?;
            return Ok(DownloadBody::Streaming(response));
        }

        let id = file
            .id
            .as_ref()
            .ok_or_else(|| ApiError::InvalidUrl(format!("{} has no download link", file.filename)))?
            .to_string();
        let mut segments: Vec<&str> = endpoints::DOWNLOAD.to_vec();
        segments.push(id.as_str());
        let url = self.endpoint(&segments)?;

        log::debug!("Requesting download of {} via {}", file.filename, url);
        let response = Self::require_success(self.http.get(url).send().await?).await?;
        if !Self::may_carry_link(&response) {
            return Ok(DownloadBody::Streaming(response));
        }

        let body = response.bytes().await?;
        let link = match serde_json::from_slice::<SignedLink>(&body) {
            Ok(link) => link,
            Err(_) => return Ok(DownloadBody::Buffered(body)),
        };

        log::debug!("Following signed link for {}", file.filename);
        let url = Url::parse(&link.download_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let response = Self::require_success(self.http.get(url).send().await?).await?;
        Ok(DownloadBody::Streaming(response))
    }

    pub async fn health(&self) -> HealthReport {
        let url = match self.endpoint(endpoints::HEALTH) {
            Ok(url) => url,
            Err(e) => return HealthReport::Unreachable(e.to_string()),
        };

        let result = self
            .http
            .get(url)
            .timeout(self.config.health_timeout())
            .send()
            .await;

        let report = match result {
            Ok(response) if response.status().is_success() => HealthReport::Reachable {
                status: response.status().as_u16(),
            },
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                HealthReport::Unreachable("Backend not found".to_string())
            }
            Ok(response) => HealthReport::Unreachable(
                ApiError::from_status(response.status(), "").to_string(),
            ),
            Err(e) => match ApiError::from(e) {
                ApiError::Timeout => HealthReport::Unreachable("Connection timeout".to_string()),
                ApiError::Network(_) => HealthReport::Unreachable("Network error".to_string()),
                other => HealthReport::Unreachable(other.to_string()),
            },
        };

        match &report {
            HealthReport::Reachable { status } => log::info!("Backend reachable ({})", status),
            HealthReport::Unreachable(reason) => log::warn!("Backend unreachable: {}", reason),
        }
        report
    }

    /// JSON, plain text, or no content type at all: the body may be a signed link.
    fn may_carry_link(response: &Response) -> bool {
        match response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
        {
            None => true,
            Some(value) => value.contains("json") || value.starts_with("text/plain"),
        }
    }

    async fn require_success(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let response = Self::require_success(response).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::FileId;
    use httpmock::prelude::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    fn client_for(server: &MockServer) -> ShareClient {
        ShareClient::new(ApiConfig {
            base_url: server.base_url(),
            ..ApiConfig::default()
        })
        .unwrap()
    }

    fn write_selection(dir: &TempDir, files: &[(&str, usize)]) -> Vec<SelectedFile> {
        files
            .iter()
            .map(|(name, size)| {
                let path = dir.path().join(name);
                std::fs::write(&path, vec![b'x'; *size]).unwrap();
                FileProcessor::from_path(&path).unwrap()
            })
            .collect()
    }

    #[test]
    fn endpoint_handles_trailing_slash_and_encoding() {
        let client = ShareClient::new(ApiConfig {
            base_url: "http://localhost:5000/".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        let url = client.endpoint(&["api", "file", "a b/c"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/file/a%20b%2Fc");
    }

    #[test]
    fn rejects_invalid_base_url() {
        let result = ShareClient::new(ApiConfig {
            base_url: "not a url".to_string(),
            ..ApiConfig::default()
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn upload_sends_every_file_and_reports_progress() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/upload")
                    .body_contains("name=\"files\"; filename=\"a.txt\"")
                    .body_contains("name=\"files\"; filename=\"b.bin\"");
                then.status(200).json_body(serde_json::json!({
                    "code": "XY12",
                    "downloadURL": "https://dropit.example/d/XY12",
                    "qrCode": "data:image/png;base64,AA",
                    "files": [
                        { "filename": "a.txt", "size": 100 },
                        { "filename": "b.bin", "size": 200000 }
                    ]
                }));
            })
            .await;

        let dir = TempDir::new().unwrap();
        let files = write_selection(&dir, &[("a.txt", 100), ("b.bin", 200_000)]);

        let seen = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink = Arc::clone(&seen);
        let response = client_for(&server)
            .upload(&files, Arc::new(move |p: u8| sink.lock().unwrap().push(p)))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.code, "XY12");
        assert_eq!(response.files.len(), 2);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        assert!(seen.iter().all(|p| *p <= 100));
    }

    #[tokio::test]
    async fn upload_refuses_empty_selection() {
        let server = MockServer::start_async().await;
        let result = client_for(&server).upload(&[], Arc::new(|_: u8| {})).await;
        assert_eq!(result, Err(ApiError::EmptySelection));
    }

    #[tokio::test]
    async fn upload_surfaces_server_error_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload");
                then.status(400)
                    .json_body(serde_json::json!({ "error": "Unsupported file type" }));
            })
            .await;

        let dir = TempDir::new().unwrap();
        let files = write_selection(&dir, &[("a.exe", 10)]);
        let err = client_for(&server)
            .upload(&files, Arc::new(|_: u8| {}))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.upload_message(), "Unsupported file type");
    }

    #[tokio::test]
    async fn upload_times_out() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/upload");
                then.status(200).delay(Duration::from_secs(2));
            })
            .await;

        let client = ShareClient::new(ApiConfig {
            base_url: server.base_url(),
            timeout_ms: 100,
            ..ApiConfig::default()
        })
        .unwrap();
        let dir = TempDir::new().unwrap();
        let files = write_selection(&dir, &[("slow.txt", 10)]);

        let err = client.upload(&files, Arc::new(|_: u8| {})).await.unwrap_err();
        assert_eq!(err, ApiError::Timeout);
    }

    #[tokio::test]
    async fn lookup_trims_code_and_parses_files() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/file/AB12");
                then.status(200).json_body(serde_json::json!({
                    "files": [{
                        "filename": "photo.jpg",
                        "fileSize": 2048,
                        "mimeType": "image/jpeg",
                        "downloadUrl": "https://s3.example/photo.jpg?sig=1"
                    }],
                    "filesCount": 1,
                    "totalSize": 2048
                }));
            })
            .await;

        let lookup = client_for(&server).lookup("  AB12 ").await.unwrap();
        mock.assert_async().await;
        assert_eq!(lookup.count(), 1);
        assert_eq!(lookup.total_size(), 2048);
        assert_eq!(lookup.files[0].mime_label(), "image/jpeg");
    }

    #[tokio::test]
    async fn lookup_reports_missing_code() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/file/NOPE");
                then.status(404)
                    .json_body(serde_json::json!({ "error": "Invalid or expired code" }));
            })
            .await;

        let err = client_for(&server).lookup("NOPE").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.lookup_message(), "Invalid or expired code");
    }

    #[tokio::test]
    async fn lookup_falls_back_to_not_found_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/file/GONE");
                then.status(404).body("Not Found");
            })
            .await;

        let err = client_for(&server).lookup("GONE").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.lookup_message(), "No files found for this code");
    }

    #[tokio::test]
    async fn lookup_rejects_blank_code_without_request() {
        let server = MockServer::start_async().await;
        let err = client_for(&server).lookup("   ").await.unwrap_err();
        assert_eq!(err, ApiError::EmptyCode);
    }

    fn descriptor_with_id(name: &str, id: u64) -> FileDescriptor {
        FileDescriptor {
            filename: name.to_string(),
            file_size: 9,
            mime_type: None,
            download_url: None,
            id: Some(FileId::Number(id)),
        }
    }

    #[tokio::test]
    async fn open_download_follows_signed_link_from_id() {
        let server = MockServer::start_async().await;
        let signed_url = server.url("/signed/doc.pdf");
        let signed = server
            .mock_async(|when, then| {
                when.method(GET).path("/signed/doc.pdf");
                then.status(200)
                    .header("content-type", "application/pdf")
                    .body("pdf-bytes");
            })
            .await;
        let resolver = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/download/42");
                then.status(200)
                    .header("content-type", "application/json; charset=utf-8")
                    .json_body(serde_json::json!({ "downloadUrl": signed_url }));
            })
            .await;

        let body = client_for(&server)
            .open_download(&descriptor_with_id("doc.pdf", 42))
            .await
            .unwrap();
        assert!(matches!(body, DownloadBody::Streaming(_)));
        assert_eq!(&body.bytes().await.unwrap()[..], b"pdf-bytes");
        resolver.assert_async().await;
        signed.assert_async().await;
    }

    #[tokio::test]
    async fn open_download_follows_signed_link_without_content_type() {
        let server = MockServer::start_async().await;
        let signed_url = server.url("/signed/sheet.csv");
        let signed = server
            .mock_async(|when, then| {
                when.method(GET).path("/signed/sheet.csv");
                then.status(200).body("a,b\n1,2\n");
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/download/7");
                then.status(200)
                    .body(serde_json::json!({ "url": signed_url }).to_string());
            })
            .await;

        let body = client_for(&server)
            .open_download(&descriptor_with_id("sheet.csv", 7))
            .await
            .unwrap();
        assert_eq!(&body.bytes().await.unwrap()[..], b"a,b\n1,2\n");
        signed.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn open_download_keeps_unlabelled_content() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/download/8");
                then.status(200).body("plain file content");
            })
            .await;

        let body = client_for(&server)
            .open_download(&descriptor_with_id("notes.txt", 8))
            .await
            .unwrap();
        assert!(matches!(body, DownloadBody::Buffered(_)));
        assert_eq!(&body.bytes().await.unwrap()[..], b"plain file content");
    }

    #[tokio::test]
    async fn open_download_requires_link_or_id() {
        let server = MockServer::start_async().await;
        let file = FileDescriptor {
            filename: "orphan.txt".to_string(),
            file_size: 0,
            mime_type: None,
            download_url: None,
            id: None,
        };
        let err = client_for(&server).open_download(&file).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn health_reports_reachable_backend() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(200).body("ok");
            })
            .await;

        let report = client_for(&server).health().await;
        assert_eq!(report, HealthReport::Reachable { status: 200 });
    }

    #[tokio::test]
    async fn health_reports_missing_backend() {
        let server = MockServer::start_async().await;
        let report = client_for(&server).health().await;
        assert_eq!(report, HealthReport::Unreachable("Backend not found".to_string()));
    }

    #[tokio::test]
    async fn health_reports_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/health");
                then.status(200).delay(Duration::from_secs(2));
            })
            .await;

        let client = ShareClient::new(ApiConfig {
            base_url: server.base_url(),
            health_timeout_ms: 100,
            ..ApiConfig::default()
        })
        .unwrap();
        let report = client.health().await;
        assert_eq!(report, HealthReport::Unreachable("Connection timeout".to_string()));
    }

    #[tokio::test]
    async fn health_reports_network_error() {
        let client = ShareClient::new(ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..ApiConfig::default()
        })
        .unwrap();
        let report = client.health().await;
        assert_eq!(report, HealthReport::Unreachable("Network error".to_string()));
    }
}
