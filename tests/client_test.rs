//! Tests for DiskClient with mocked HTTP responses.

use std::io::Write;

use mockito::{Matcher, Server};
use serde_json::json;
use tempfile::NamedTempFile;
use yandex_disk::{DiskClient, DiskError, Link, OperationStatus};

fn client_for(server: &Server) -> DiskClient {
    DiskClient::builder("test-token")
        .base_url(server.url())
        .build()
        .unwrap()
}

mod transport {
    use super::*;

    #[tokio::test]
    async fn success_with_json_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/resources")
            .match_header("authorization", "OAuth test-token")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/docs".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "docs", "type": "dir", "path": "disk:/docs"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.resource("disk:/docs").get().await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.is_success());
        let body = response.body.expect("valid JSON should be decoded");
        assert_eq!(body["name"], "docs");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn success_with_invalid_json_degrades_to_absent_body() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("this is not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.resource("disk:/docs").get().await.unwrap();

        assert_eq!(response.status, 200);
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn non_2xx_returns_status_without_payload() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message": "Resource not found", "error": "DiskNotFoundError"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client.resource("disk:/missing").get().await.unwrap();

        assert_eq!(response.status, 404);
        assert!(!response.is_success());
        assert!(response.body.is_none());
    }

    #[tokio::test]
    async fn unreachable_host_is_a_typed_error() {
        // Nothing listens on port 1; the call must fail with a transport
        // error, not terminate the process.
        let client = DiskClient::builder("test-token")
            .base_url("http://127.0.0.1:1")
            .max_retries(0)
            .build()
            .unwrap();

        let err = client.resource("disk:/docs").get().await.unwrap_err();
        assert!(matches!(err, DiskError::HttpError(_)));
    }
}

mod operations {
    use super::*;

    #[tokio::test]
    async fn operation_status_decodes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/operations/33895377646")
            .with_status(200)
            .with_body(r#"{"status": "in-progress"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let status = client.operation_status("33895377646").await.unwrap();
        assert_eq!(status, OperationStatus::InProgress);
    }

    #[tokio::test]
    async fn unknown_operation_maps_to_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/operations/nope")
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.operation_status("nope").await.unwrap_err();
        assert!(matches!(err, DiskError::ApiError { status: 404 }));
    }
}

mod disk {
    use super::*;

    #[tokio::test]
    async fn disk_info_decodes() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/")
            .with_status(200)
            .with_body(
                json!({
                    "total_space": 10737418240u64,
                    "used_space": 5368709120u64,
                    "trash_size": 4631577437u64,
                    "is_paid": true
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let info = client.disk_info().await.unwrap();
        assert_eq!(info.total_space, 10737418240);
        assert_eq!(info.is_paid, Some(true));
    }
}

mod sharing {
    use super::*;

    #[tokio::test]
    async fn share_publishes_then_reads_public_url() {
        let mut server = Server::new_async().await;
        let publish = server
            .mock("PUT", "/resources/publish")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/photo.png".into()))
            .with_status(200)
            .with_body(json!({"href": format!("{}/resources?path=disk:/photo.png", server.url())}).to_string())
            .create_async()
            .await;
        let refetch = server
            .mock("GET", "/resources")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/photo.png".into()))
            .with_status(200)
            .with_body(
                json!({
                    "name": "photo.png",
                    "type": "file",
                    "path": "disk:/photo.png",
                    "public_url": "https://yadi.sk/i/abc123"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let url = client.resource("disk:/photo.png").share().await.unwrap();

        assert_eq!(url, "https://yadi.sk/i/abc123");
        publish.assert_async().await;
        refetch.assert_async().await;
    }

    #[tokio::test]
    async fn share_of_missing_resource_is_api_error() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/resources/publish")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.resource("disk:/missing").share().await.unwrap_err();
        assert!(matches!(err, DiskError::ApiError { status: 404 }));
    }

    #[tokio::test]
    async fn unshare_returns_metadata_href() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/resources/unpublish")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/photo.png".into()))
            .with_status(200)
            .with_body(r#"{"href": "https://cloud-api.example/v1/disk/resources?path=disk%3A%2Fphoto.png", "method": "GET"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let href = client.resource("disk:/photo.png").unshare().await.unwrap();
        assert!(href.contains("photo.png"));
    }

    #[tokio::test]
    async fn download_link_extracts_href() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/download")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/a.bin".into()))
            .with_status(200)
            .with_body(r#"{"href": "https://downloader.example/a.bin", "method": "GET", "templated": false}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let href = client.resource("disk:/a.bin").download_link().await.unwrap();
        assert_eq!(href, "https://downloader.example/a.bin");
    }

    #[tokio::test]
    async fn download_link_without_href_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/download")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"method": "GET"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.resource("disk:/a.bin").download_link().await.unwrap_err();
        assert!(matches!(err, DiskError::NotFound(_)));
    }
}

mod upload {
    use super::*;

    #[tokio::test]
    async fn upload_is_two_phase() {
        let mut server = Server::new_async().await;
        let target = server
            .mock("GET", "/resources/upload")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("path".into(), "disk:/in/data.txt".into()),
                Matcher::UrlEncoded("overwrite".into(), "true".into()),
            ]))
            .with_status(200)
            .with_body(json!({"href": format!("{}/upload-target/xyz", server.url()), "method": "PUT"}).to_string())
            .create_async()
            .await;
        let receiver = server
            .mock("PUT", "/upload-target/xyz")
            .with_status(201)
            .create_async()
            .await;

        let mut local = NamedTempFile::new().unwrap();
        local.write_all(b"payload bytes").unwrap();

        let client = client_for(&server);
        let response = client
            .resource("disk:/in/data.txt")
            .overwrite(true)
            .upload(local.path())
            .await
            .unwrap();

        assert_eq!(response.status, 201);
        assert!(response.body.is_none());
        target.assert_async().await;
        receiver.assert_async().await;
    }

    #[tokio::test]
    async fn upload_of_missing_local_file_is_not_found() {
        let server = Server::new_async().await;
        let client = client_for(&server);

        let err = client
            .resource("disk:/in/ghost.txt")
            .upload("/definitely/not/here/ghost.txt")
            .await
            .unwrap_err();
        assert!(matches!(err, DiskError::NotFound(_)));
    }

    #[tokio::test]
    async fn upload_refusal_passes_through() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/upload")
            .match_query(Matcher::Any)
            .with_status(409)
            .create_async()
            .await;

        let mut local = NamedTempFile::new().unwrap();
        local.write_all(b"x").unwrap();

        let client = client_for(&server);
        let response = client
            .resource("disk:/in/exists.txt")
            .upload(local.path())
            .await
            .unwrap();
        assert_eq!(response.status, 409);
    }

    #[tokio::test]
    async fn upload_from_url_posts_source() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/resources/upload")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("path".into(), "disk:/in/pic.png".into()),
                Matcher::UrlEncoded("url".into(), "https://example.com/pic.png".into()),
            ]))
            .with_status(202)
            .with_body(r#"{"href": "https://cloud-api.example/v1/disk/operations/123", "method": "GET"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let response = client
            .resource("disk:/in/pic.png")
            .upload_from_url("https://example.com/pic.png")
            .await
            .unwrap();

        assert_eq!(response.status, 202);
        let link: Link = response.decode().unwrap();
        assert!(link.href.contains("/operations/"));
        mock.assert_async().await;
    }
}

mod download {
    use super::*;

    #[tokio::test]
    async fn download_to_streams_body_into_file() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/resources/download")
            .match_query(Matcher::UrlEncoded("path".into(), "disk:/a.bin".into()))
            .with_status(200)
            .with_body(json!({"href": format!("{}/content/a.bin", server.url())}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", "/content/a.bin")
            .with_status(200)
            .with_body("hello, disk")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.bin");

        let client = client_for(&server);
        let written = client
            .resource("disk:/a.bin")
            .download_to(&dest)
            .await
            .unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "hello, disk");
    }
}
