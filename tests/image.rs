use std::time::Duration;

use bytes::Bytes;
use imagetyperz_client::{
    Error, ImageOptions, ImageSource, ImageTyperzClient, endpoints,
};
use mockito::Matcher;

const TOKEN: &str = "TESTTOKEN";
// base64 of b"captcha-bytes"
const IMAGE_B64: &str = "Y2FwdGNoYS1ieXRlcw==";

async fn client_for(server: &mockito::ServerGuard) -> ImageTyperzClient {
    ImageTyperzClient::builder(TOKEN)
        .with_base_url(server.url())
        .with_poll_interval(Duration::from_millis(10))
        .build()
        .unwrap()
}

#[tokio::test]
async fn image_bytes_are_base64_encoded_with_worker_hints() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::IMAGE_UPLOAD)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "UPLOADCAPTCHA".into()),
            Matcher::UrlEncoded("file".into(), IMAGE_B64.into()),
            Matcher::UrlEncoded("iscase".into(), "1".into()),
            Matcher::UrlEncoded("minlength".into(), "3".into()),
            Matcher::UrlEncoded("maxlength".into(), "8".into()),
            Matcher::UrlEncoded("token".into(), TOKEN.into()),
        ]))
        .with_status(200)
        .with_body("118832")
        .create_async()
        .await;

    let client = client_for(&server).await;
    let options = ImageOptions {
        case_sensitive: true,
        min_length: Some(3),
        max_length: Some(8),
        ..Default::default()
    };
    let source = ImageSource::Bytes(Bytes::from_static(b"captcha-bytes"));
    let job_id = client.submit_image(&source, &options).await.unwrap();

    assert_eq!(job_id.as_str(), "118832");
    mock.assert_async().await;
}

#[tokio::test]
async fn image_by_url_uses_the_url_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::IMAGE_UPLOAD_URL)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("file".into(), "https://example.com/captcha.png".into()),
        ]))
        .with_status(200)
        .with_body("118833")
        .create_async()
        .await;

    let client = client_for(&server).await;
    let source = ImageSource::Url("https://example.com/captcha.png".into());
    let job_id = client
        .submit_image(&source, &ImageOptions::default())
        .await
        .unwrap();

    assert_eq!(job_id.as_str(), "118833");
    mock.assert_async().await;
}

#[tokio::test]
async fn inline_answer_payload_still_yields_the_job_id() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", endpoints::IMAGE_UPLOAD)
        .with_status(200)
        .with_body("118832|dog42")
        .create_async()
        .await;

    let client = client_for(&server).await;
    let source = ImageSource::Base64(IMAGE_B64.into());
    let job_id = client
        .submit_image(&source, &ImageOptions::default())
        .await
        .unwrap();
    assert_eq!(job_id.as_str(), "118832");
}

#[tokio::test]
async fn conflicting_hints_never_reach_the_network() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::IMAGE_UPLOAD)
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server).await;
    let options = ImageOptions {
        digits_only: true,
        letters_only: true,
        ..Default::default()
    };
    let source = ImageSource::Base64(IMAGE_B64.into());
    let err = client.submit_image(&source, &options).await.unwrap_err();

    assert!(matches!(err, Error::InvalidOptions(_)));
    mock.assert_async().await;
}

#[tokio::test]
async fn complete_image_submits_and_polls_to_the_answer() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", endpoints::IMAGE_UPLOAD)
        .with_status(200)
        .with_body("118832")
        .create_async()
        .await;
    let _mock = server
        .mock("GET", endpoints::IMAGE_RESULT)
        .match_query(Matcher::UrlEncoded("captchaid".into(), "118832".into()))
        .with_status(200)
        .with_body("dog42")
        .create_async()
        .await;

    let client = client_for(&server).await;
    let source = ImageSource::Base64(IMAGE_B64.into());
    let answer = client
        .complete_image(&source, &ImageOptions::default())
        .await
        .unwrap();
    assert_eq!(answer, "dog42");
}

#[tokio::test]
async fn bad_image_report_is_acknowledged() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", endpoints::BAD_IMAGE)
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("action".into(), "SETBADIMAGE".into()),
            Matcher::UrlEncoded("imageid".into(), "118832".into()),
        ]))
        .with_status(200)
        .with_body("SUCCESS")
        .create_async()
        .await;

    let client = client_for(&server).await;
    let job_id = imagetyperz_client::JobId::new("118832");
    client.report_bad_image(&job_id).await.unwrap();
    mock.assert_async().await;
}
