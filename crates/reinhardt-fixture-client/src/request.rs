//! Request factory for simulated requests carrying fixture payloads.
//!
//! The body of a built request is, in order of precedence:
//!
//! 1. explicit data passed to [`RequestBuilder::json`] or [`RequestBuilder::form`],
//!    laid over
//! 2. the fixture bound with [`RequestBuilder::fixture`], or else the fake
//!    registered for the request's [`target`](RequestBuilder::target).
//!
//! Explicit data reaches a bound fixture as request data, so its lazy fields
//! see it. Any file in the payload switches the body to `multipart/form-data`.

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, Request};
use http_body_util::Full;
use reinhardt_fixture_builder::{
	Definition, FakeRegistry, Files, NestedFixture, RequestTarget, ResolvedPayload, TargetKey,
	UploadedFile,
};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::multipart;

/// Factory for simulated requests.
///
/// # Examples
///
/// ```
/// use reinhardt_fixture_client::FixtureRequestFactory;
///
/// let factory = FixtureRequestFactory::new();
/// let request = factory.get("/api/users/").build().unwrap();
/// assert_eq!(request.method(), "GET");
/// ```
#[derive(Debug, Clone)]
pub struct FixtureRequestFactory {
	default_format: String,
	default_headers: HeaderMap,
	fakes: Option<FakeRegistry>,
}

impl FixtureRequestFactory {
	/// Creates a factory sending JSON bodies.
	pub fn new() -> Self {
		Self {
			default_format: "json".to_string(),
			default_headers: HeaderMap::new(),
			fakes: None,
		}
	}

	/// Injects fakes from `registry` into requests bound to a target.
	pub fn with_fakes(mut self, registry: FakeRegistry) -> Self {
		self.fakes = Some(registry);
		self
	}

	/// Sets the default body format, `json` or `form`.
	pub fn with_format(mut self, format: impl Into<String>) -> Self {
		self.default_format = format.into();
		self
	}

	/// Adds a header sent with every request.
	pub fn with_header(
		mut self,
		name: impl AsRef<str>,
		value: impl AsRef<str>,
	) -> ClientResult<Self> {
		let header_name: http::header::HeaderName = name.as_ref().parse().map_err(|_| {
			ClientError::RequestFailed(format!("Invalid header name: {}", name.as_ref()))
		})?;
		self.default_headers
			.insert(header_name, HeaderValue::from_str(value.as_ref())?);
		Ok(self)
	}

	/// Starts a GET request.
	pub fn get(&self, path: &str) -> RequestBuilder {
		self.request(Method::GET, path)
	}

	/// Starts a POST request.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_client::FixtureRequestFactory;
	/// use serde_json::json;
	///
	/// let request = FixtureRequestFactory::new()
	///     .post("/api/users/")
	///     .json(&json!({"name": "test"}))
	///     .unwrap()
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.headers()["content-type"], "application/json");
	/// ```
	pub fn post(&self, path: &str) -> RequestBuilder {
		self.request(Method::POST, path)
	}

	/// Starts a PUT request.
	pub fn put(&self, path: &str) -> RequestBuilder {
		self.request(Method::PUT, path)
	}

	/// Starts a PATCH request.
	pub fn patch(&self, path: &str) -> RequestBuilder {
		self.request(Method::PATCH, path)
	}

	/// Starts a DELETE request.
	pub fn delete(&self, path: &str) -> RequestBuilder {
		self.request(Method::DELETE, path)
	}

	/// Starts a request with any method.
	pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
		let mut builder = RequestBuilder::new(method, path, &self.default_headers)
			.with_format(&self.default_format);
		builder.fakes = self.fakes.clone();
		builder
	}
}

impl Default for FixtureRequestFactory {
	fn default() -> Self {
		Self::new()
	}
}

/// Builder for one simulated request.
#[derive(Debug)]
pub struct RequestBuilder {
	method: Method,
	path: String,
	headers: HeaderMap,
	query_params: Vec<(String, String)>,
	data: Option<Map<String, Value>>,
	files: Files,
	format: String,
	fixture: Option<NestedFixture>,
	target: Option<TargetKey>,
	fakes: Option<FakeRegistry>,
}

impl RequestBuilder {
	/// Creates a builder with the given default headers.
	pub fn new(method: Method, path: &str, default_headers: &HeaderMap) -> Self {
		Self {
			method,
			path: path.to_string(),
			headers: default_headers.clone(),
			query_params: Vec::new(),
			data: None,
			files: Files::new(),
			format: "json".to_string(),
			fixture: None,
			target: None,
			fakes: None,
		}
	}

	/// Returns the method.
	pub fn method(&self) -> Method {
		self.method.clone()
	}

	/// Returns the path.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Sets the body format, `json` or `form`.
	pub fn with_format(mut self, format: &str) -> Self {
		self.format = format.to_string();
		self
	}

	/// Binds the request to target `T`, so a fake registered for it is injected.
	pub fn target<T: RequestTarget>(mut self) -> Self {
		self.target = Some(TargetKey::of::<T>());
		self
	}

	/// Uses `fixture` as the baseline payload.
	pub fn fixture(mut self, fixture: impl Into<NestedFixture>) -> Self {
		self.fixture = Some(fixture.into());
		self
	}

	/// Adds a header.
	pub fn header(mut self, name: &str, value: &str) -> ClientResult<Self> {
		let header_name: http::header::HeaderName = name
			.parse()
			.map_err(|_| ClientError::RequestFailed(format!("Invalid header name: {}", name)))?;
		self.headers
			.insert(header_name, HeaderValue::from_str(value)?);
		Ok(self)
	}

	/// Adds a query parameter.
	pub fn query(mut self, key: &str, value: &str) -> Self {
		self.query_params.push((key.to_string(), value.to_string()));
		self
	}

	/// Sets explicit data sent as JSON.
	pub fn json<T: Serialize>(self, data: &T) -> ClientResult<Self> {
		self.explicit(data, "json")
	}

	/// Sets explicit data sent as a urlencoded form.
	pub fn form<T: Serialize>(self, data: &T) -> ClientResult<Self> {
		self.explicit(data, "form")
	}

	/// Attaches a file at `field`, which may be a dot-path.
	pub fn attach(mut self, field: &str, file: UploadedFile) -> Self {
		self.files.insert(field, file);
		self
	}

	fn explicit<T: Serialize>(mut self, data: &T, format: &str) -> ClientResult<Self> {
		match serde_json::to_value(data)? {
			Value::Object(map) => {
				self.data = Some(map);
				self.format = format.to_string();
				Ok(self)
			}
			_ => Err(ClientError::RequestFailed(format!(
				"Expected object for {} data",
				format
			))),
		}
	}

	/// Resolves the payload the request will carry, or `None` for no body.
	///
	/// Dot-path keys in explicit data are expanded whenever the data is laid
	/// over a bound fixture or an injected fake. Without either, keys are
	/// sent as written.
	pub fn payload(&self) -> ClientResult<Option<ResolvedPayload>> {
		let explicit = self.data.clone();
		if let Some(fixture) = &self.fixture {
			let request_data = Definition::from(explicit.unwrap_or_default());
			let payload = fixture.resolve(request_data)?;
			return Ok(Some(payload.merged_with(Map::new(), self.files.clone())?));
		}
		if let (Some(target), Some(fakes)) = (&self.target, &self.fakes)
			&& let Some(payload) = fakes.payload_for(
				target,
				explicit.clone().unwrap_or_default(),
				self.files.clone(),
			)? {
			return Ok(Some(payload));
		}
		if explicit.is_none() && self.files.is_empty() {
			return Ok(None);
		}
		Ok(Some(ResolvedPayload::new(
			explicit.unwrap_or_default(),
			self.files.clone(),
		)))
	}

	/// Builds the request.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::{Definition, Faker, RequestFixture};
	/// use reinhardt_fixture_client::FixtureRequestFactory;
	///
	/// #[derive(Default)]
	/// struct LoginFixture;
	///
	/// impl RequestFixture for LoginFixture {
	///     fn definition(&self, _faker: &mut Faker) -> Definition {
	///         Definition::new().set("username", "luke").set("password", "secret")
	///     }
	/// }
	///
	/// let request = FixtureRequestFactory::new()
	///     .post("/login/")
	///     .fixture(LoginFixture::factory())
	///     .build()
	///     .unwrap();
	/// assert_eq!(request.headers()["content-type"], "application/json");
	/// ```
	pub fn build(self) -> ClientResult<Request<Full<Bytes>>> {
		let payload = self.payload()?;

		let mut url = self.path.clone();
		if !self.query_params.is_empty() {
			let query_string = url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(&self.query_params)
				.finish();
			url = format!("{}?{}", url, query_string);
		}

		let mut request = Request::builder().method(self.method.clone()).uri(url);
		for (name, value) in self.headers.iter() {
			request = request.header(name, value);
		}

		let body = match payload {
			Some(payload) => {
				let (data, files) = payload.into_parts();
				tracing::debug!(
					method = %self.method,
					path = %self.path,
					fields = data.len(),
					files = files.len(),
					"building fixture request"
				);
				let (content_type, body) = encode_body(&self.format, data, &files)?;
				request = request.header(http::header::CONTENT_TYPE, content_type);
				body
			}
			None => Bytes::new(),
		};

		Ok(request.body(Full::new(body))?)
	}
}

fn encode_body(format: &str, data: Map<String, Value>, files: &Files) -> ClientResult<(String, Bytes)> {
	if !files.is_empty() {
		let boundary = format!("reinhardt-{}", Uuid::new_v4().simple());
		let body = multipart::encode(&multipart::flatten_fields(&data), files, &boundary);
		return Ok((format!("multipart/form-data; boundary={}", boundary), body));
	}
	match format {
		"form" => {
			let encoded = url::form_urlencoded::Serializer::new(String::new())
				.extend_pairs(multipart::flatten_fields(&data))
				.finish();
			Ok((
				"application/x-www-form-urlencoded".to_string(),
				Bytes::from(encoded),
			))
		}
		"json" => Ok((
			"application/json".to_string(),
			Bytes::from(serde_json::to_vec(&Value::Object(data))?),
		)),
		other => Err(ClientError::RequestFailed(format!(
			"Unsupported body format: {}",
			other
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use http_body_util::BodyExt;
	use reinhardt_fixture_builder::{Faker, RequestFixture};
	use rstest::{fixture, rstest};
	use serde_json::json;

	#[derive(Default)]
	struct CommentFixture;

	impl RequestFixture for CommentFixture {
		fn definition(&self, _faker: &mut Faker) -> Definition {
			Definition::new().set("body", "Nice post").set("author", json!({"name": "Luke"}))
		}
	}

	#[fixture]
	fn factory() -> FixtureRequestFactory {
		FixtureRequestFactory::new()
	}

	async fn body_json(request: Request<Full<Bytes>>) -> Value {
		let bytes = request.into_body().collect().await.unwrap().to_bytes();
		serde_json::from_slice(&bytes).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_explicit_data_overrides_fixture(factory: FixtureRequestFactory) {
		let request = factory
			.post("/comments/")
			.fixture(CommentFixture::factory())
			.json(&json!({"author": {"name": "Oliver"}}))
			.unwrap()
			.build()
			.unwrap();

		assert_eq!(
			body_json(request).await,
			json!({"body": "Nice post", "author": {"name": "Oliver"}})
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_form_body_uses_bracket_notation(factory: FixtureRequestFactory) {
		let request = factory
			.with_format("form")
			.post("/comments/")
			.fixture(CommentFixture::factory())
			.build()
			.unwrap();

		assert_eq!(
			request.headers()[http::header::CONTENT_TYPE],
			"application/x-www-form-urlencoded"
		);
		let bytes = request.into_body().collect().await.unwrap().to_bytes();
		let text = String::from_utf8(bytes.to_vec()).unwrap();
		assert!(text.contains("body=Nice+post"));
		assert!(text.contains("author%5Bname%5D=Luke"));
	}

	#[rstest]
	fn test_no_payload_means_no_body(factory: FixtureRequestFactory) {
		let builder = factory.get("/comments/").query("page", "2");
		assert!(builder.payload().unwrap().is_none());

		let request = builder.build().unwrap();
		assert_eq!(request.uri(), "/comments/?page=2");
		assert!(request.headers().get(http::header::CONTENT_TYPE).is_none());
	}

	#[rstest]
	fn test_non_object_data_is_rejected(factory: FixtureRequestFactory) {
		let error = factory.post("/comments/").json(&json!([1, 2])).unwrap_err();
		assert!(matches!(error, ClientError::RequestFailed(_)));
	}

	#[rstest]
	fn test_invalid_header_name(factory: FixtureRequestFactory) {
		let error = factory.get("/").header("bad header", "x").unwrap_err();
		assert!(matches!(error, ClientError::RequestFailed(_)));
	}

	#[rstest]
	fn test_unknown_format_is_rejected(factory: FixtureRequestFactory) {
		let error = factory
			.with_format("xml")
			.post("/comments/")
			.fixture(CommentFixture::factory())
			.build()
			.unwrap_err();
		assert!(matches!(error, ClientError::RequestFailed(_)));
	}
}
