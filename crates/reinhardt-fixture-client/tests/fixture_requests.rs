//! Requests built from fixtures, fakes and attachments.

use bytes::Bytes;
use http::Request;
use http_body_util::{BodyExt, Full};
use reinhardt_fixture_builder::prelude::*;
use reinhardt_fixture_client::{ClientError, FixtureRequestFactory};
use rstest::*;
use serde_json::{Value, json};

struct StoreUserRequest;

impl RequestTarget for StoreUserRequest {}

struct UploadAvatarRequest;

impl RequestTarget for UploadAvatarRequest {}

#[derive(Default)]
struct StoreUserFixture;

impl RequestFixture for StoreUserFixture {
	fn definition(&self, _faker: &mut Faker) -> Definition {
		Definition::new()
			.set("name", "Luke Downing")
			.set("company", "Worksome")
			.set(
				"email",
				lazy(|fields| {
					let name = fields.str("name")?.to_lowercase().replace(' ', ".");
					let company = fields.str("company")?.to_lowercase();
					Ok(json!(format!("{name}@{company}.com")))
				}),
			)
	}
}

#[derive(Default)]
struct AvatarFixture;

impl RequestFixture for AvatarFixture {
	fn definition(&self, _faker: &mut Faker) -> Definition {
		Definition::new()
			.set("caption", "Holiday")
			.set("meta", json!({"tags": ["beach", "sun"]}))
	}

	fn files(&self) -> FileAttachments {
		FileAttachments::new().attach(
			"avatar",
			UploadedFile::new("avatar.png", b"\x89PNG".to_vec()).with_content_type("image/png"),
		)
	}
}

#[fixture]
fn fakes() -> FakeRegistry {
	FakeRegistry::new()
}

async fn body_text(request: Request<Full<Bytes>>) -> String {
	let bytes = request.into_body().collect().await.unwrap().to_bytes();
	String::from_utf8_lossy(&bytes).into_owned()
}

async fn body_json(request: Request<Full<Bytes>>) -> Value {
	serde_json::from_str(&body_text(request).await).unwrap()
}

#[rstest]
#[tokio::test]
async fn test_registered_fake_is_injected(fakes: FakeRegistry) {
	StoreUserFixture::factory()
		.state(json!({"name": "Oliver Nybroe"}))
		.fake::<StoreUserRequest>(&fakes)
		.unwrap();

	let request = FixtureRequestFactory::new()
		.with_fakes(fakes)
		.post("/users/")
		.target::<StoreUserRequest>()
		.json(&json!({"email": "luke@worksome.com"}))
		.unwrap()
		.build()
		.unwrap();

	assert_eq!(
		body_json(request).await,
		json!({"name": "Oliver Nybroe", "company": "Worksome", "email": "luke@worksome.com"})
	);
}

#[rstest]
#[tokio::test]
async fn test_dot_paths_expand_over_fakes_like_over_fixtures(fakes: FakeRegistry) {
	AvatarFixture::factory().fake::<StoreUserRequest>(&fakes).unwrap();
	let factory = FixtureRequestFactory::new().with_fakes(fakes);

	let injected = factory
		.post("/users/")
		.target::<StoreUserRequest>()
		.json(&json!({"meta.tags": ["rain"]}))
		.unwrap()
		.payload()
		.unwrap()
		.unwrap();
	let bound = factory
		.post("/users/")
		.fixture(AvatarFixture::factory())
		.json(&json!({"meta.tags": ["rain"]}))
		.unwrap()
		.payload()
		.unwrap()
		.unwrap();

	assert_eq!(injected.data()["meta"], json!({"tags": ["rain"]}));
	assert_eq!(injected.data(), bound.data());
}

#[rstest]
#[tokio::test]
async fn test_target_without_fake_sends_explicit_data_only(fakes: FakeRegistry) {
	let request = FixtureRequestFactory::new()
		.with_fakes(fakes)
		.post("/users/")
		.target::<StoreUserRequest>()
		.json(&json!({"name": "Luke"}))
		.unwrap()
		.build()
		.unwrap();

	assert_eq!(body_json(request).await, json!({"name": "Luke"}));
}

#[rstest]
#[tokio::test]
async fn test_explicit_data_reaches_lazy_fields_of_bound_fixture() {
	let request = FixtureRequestFactory::new()
		.post("/users/")
		.fixture(StoreUserFixture::factory())
		.json(&json!({"name": "Oliver Nybroe"}))
		.unwrap()
		.build()
		.unwrap();

	let body = body_json(request).await;
	assert_eq!(body["email"], json!("oliver.nybroe@worksome.com"));
}

#[rstest]
#[tokio::test]
async fn test_fixture_files_produce_multipart_body(fakes: FakeRegistry) {
	AvatarFixture::factory().fake::<UploadAvatarRequest>(&fakes).unwrap();

	let request = FixtureRequestFactory::new()
		.with_fakes(fakes)
		.post("/avatar/")
		.target::<UploadAvatarRequest>()
		.build()
		.unwrap();

	let content_type = request.headers()[http::header::CONTENT_TYPE]
		.to_str()
		.unwrap()
		.to_string();
	let boundary = content_type
		.strip_prefix("multipart/form-data; boundary=")
		.unwrap()
		.to_string();
	let body = body_text(request).await;

	assert!(body.contains("name=\"caption\"\r\n\r\nHoliday\r\n"));
	assert!(body.contains("name=\"meta[tags][0]\"\r\n\r\nbeach\r\n"));
	assert!(body.contains("name=\"avatar\"; filename=\"avatar.png\"\r\nContent-Type: image/png"));
	assert!(body.ends_with(&format!("--{}--\r\n", boundary)));
}

#[rstest]
#[tokio::test]
async fn test_attached_file_switches_to_multipart() {
	let request = FixtureRequestFactory::new()
		.post("/users/")
		.fixture(StoreUserFixture::factory())
		.attach("documents.cv", UploadedFile::new("cv.txt", "hello").with_content_type("text/plain"))
		.build()
		.unwrap();

	assert!(
		request.headers()[http::header::CONTENT_TYPE]
			.to_str()
			.unwrap()
			.starts_with("multipart/form-data; boundary=")
	);
	let body = body_text(request).await;
	assert!(body.contains("name=\"documents[cv]\"; filename=\"cv.txt\""));
	assert!(body.contains("name=\"email\"\r\n\r\nluke.downing@worksome.com\r\n"));
}

#[rstest]
fn test_fixture_errors_surface_when_building() {
	let error = FixtureRequestFactory::new()
		.post("/users/")
		.fixture(StoreUserFixture::factory().strict().without("nickname"))
		.build()
		.unwrap_err();

	assert!(matches!(
		error,
		ClientError::Fixture(FixtureError::UnresolvableReference { .. })
	));
}

#[rstest]
fn test_default_headers_are_sent() {
	let request = FixtureRequestFactory::new()
		.with_header("X-Requested-With", "XMLHttpRequest")
		.unwrap()
		.delete("/users/1/")
		.build()
		.unwrap();

	assert_eq!(request.headers()["x-requested-with"], "XMLHttpRequest");
	assert_eq!(request.method(), "DELETE");
}
