use assert_matches::assert_matches;
use fotoai_core::artifact::{ArtifactRef, ProviderError};
use fotoai_core::background::BackgroundOption;
use fotoai_core::category::ProcessingType;
use fotoai_core::ports::{ArtifactFetcher, BackgroundGenerator, BackgroundRemover, EnhancementProvider};
use fotoai_core::resolve::ResolvedConfig;
use fotoai_providers::envelope::encode_data_uri;
use fotoai_providers::{FalClient, HttpFetcher, ProviderConfig};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FalClient {
    FalClient::new(&ProviderConfig {
        api_key: "fal-key".to_string(),
        enhance_endpoint: format!("{}/fal-ai/flux-pro/kontext/max", server.uri()),
        rembg_endpoint: format!("{}/fal-ai/rembg", server.uri()),
        background_endpoint: format!("{}/fal-ai/flux/dev", server.uri()),
        timeout_secs: 5,
        model_name: "fal-ai/flux-pro/kontext/max".to_string(),
    })
    .expect("client should build")
}

fn resolved(negative_prompt: Option<&str>) -> ResolvedConfig {
    ResolvedConfig {
        category: ProcessingType::Food,
        background: BackgroundOption::Keep,
        prompt: "Make the dish look appetizing.".to_string(),
        strength: 0.35,
        guidance_scale: 3.5,
        steps: 28,
        negative_prompt: negative_prompt.map(str::to_string),
        scene_prompt: None,
        settings_version: 1,
    }
}

#[tokio::test]
async fn enhance_sends_resolved_parameters_and_reads_images_array() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .and(header("authorization", "Key fal-key"))
        .and(body_json(json!({
            "prompt": "Make the dish look appetizing.",
            "image_url": "https://storage/signed/photo.jpg",
            "image_prompt_strength": 0.35,
            "guidance_scale": 3.5,
            "num_inference_steps": 28,
            "negative_prompt": "blurry"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [{ "url": "https://cdn.fal/result.png", "width": 1024 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(Some("blurry")))
        .await
        .unwrap();

    assert_eq!(artifact, ArtifactRef::Url("https://cdn.fal/result.png".to_string()));
}

#[tokio::test]
async fn enhance_omits_missing_negative_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .and(body_json(json!({
            "prompt": "Make the dish look appetizing.",
            "image_url": "https://storage/signed/photo.jpg",
            "image_prompt_strength": 0.35,
            "guidance_scale": 3.5,
            "num_inference_steps": 28
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image": { "url": "https://cdn.fal/single.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let artifact = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap();

    assert_eq!(artifact.url(), Some("https://cdn.fal/single.png"));
}

#[tokio::test]
async fn success_without_known_field_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "seed": 42,
            "has_nsfw_concepts": [false]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap_err();

    assert_matches!(err, ProviderError::InvalidResponse { .. });
}

#[tokio::test]
async fn non_json_success_is_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ProviderError::Call { status: Some(200), diagnostic } if diagnostic.contains("<html>")
    );
}

#[tokio::test]
async fn non_success_status_is_call_failure_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [{ "msg": "image_url is not reachable" }]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap_err();

    assert_matches!(
        err,
        ProviderError::Call { status: Some(422), diagnostic } if diagnostic.contains("not reachable")
    );
}

#[tokio::test]
async fn error_field_in_success_body_is_call_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "content policy violation",
            "images": []
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap_err();

    assert_matches!(err, ProviderError::Call { diagnostic, .. } if diagnostic.contains("content policy"));
}

#[tokio::test]
async fn data_uri_result_is_decoded_inline() {
    let server = MockServer::start().await;
    let uri = encode_data_uri(&[0x89, b'P', b'N', b'G'], "image/png");
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux-pro/kontext/max"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "images": [{ "url": uri }]
        })))
        .mount(&server)
        .await;

    let artifact = client_for(&server)
        .enhance("https://storage/signed/photo.jpg", &resolved(None))
        .await
        .unwrap();

    assert_matches!(artifact, ArtifactRef::Bytes { bytes, content_type }
        if bytes == vec![0x89, b'P', b'N', b'G'] && content_type.as_deref() == Some("image/png"));
}

#[tokio::test]
async fn remove_background_returns_cutout_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/rembg"))
        .and(body_json(json!({ "image_url": "https://cdn.fal/result.png" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "image": { "url": "https://cdn.fal/cutout.png" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = client_for(&server)
        .remove_background("https://cdn.fal/result.png")
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.fal/cutout.png");
}

#[tokio::test]
async fn generate_background_posts_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fal-ai/flux/dev"))
        .and(body_json(json!({ "prompt": "Green park on a sunny afternoon" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "output": { "tmp_url": "https://cdn.fal/park.png" } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = client_for(&server)
        .generate_background("Green park on a sunny afternoon")
        .await
        .unwrap();

    assert_eq!(url, "https://cdn.fal/park.png");
}

#[tokio::test]
async fn fetcher_downloads_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/result.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8, 2, 3]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/expired.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpFetcher::new(5).unwrap();

    let bytes = fetcher
        .fetch(&format!("{}/files/result.png", server.uri()))
        .await
        .unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);

    let inline = fetcher.fetch(&encode_data_uri(b"abc", "image/png")).await.unwrap();
    assert_eq!(inline, b"abc".to_vec());

    let err = fetcher
        .fetch(&format!("{}/files/expired.png", server.uri()))
        .await
        .unwrap_err();
    assert_matches!(err, ProviderError::Call { status: Some(404), .. });
}
