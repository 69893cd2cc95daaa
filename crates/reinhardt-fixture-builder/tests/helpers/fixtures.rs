//! Fixtures shared by the behavioural tests.

use reinhardt_fixture_builder::prelude::*;
use serde_json::json;

/// `Luke Downing` becomes `luke.downing`.
pub fn slug(value: &str) -> String {
	value
		.split_whitespace()
		.map(str::to_lowercase)
		.collect::<Vec<_>>()
		.join(".")
}

#[derive(Default)]
pub struct AddressFixture;

impl RequestFixture for AddressFixture {
	fn definition(&self, faker: &mut Faker) -> Definition {
		Definition::new()
			.set("line_one", faker.street_name())
			.set("city", faker.city())
			.set("postcode", "AB1 2CD")
			.set(
				"label",
				lazy(|fields| {
					Ok(json!(format!(
						"{}, {}",
						fields.str("line_one")?,
						fields.str("postcode")?
					)))
				}),
			)
	}
}

#[derive(Default)]
pub struct StoreUserRequestFixture;

impl RequestFixture for StoreUserRequestFixture {
	fn definition(&self, faker: &mut Faker) -> Definition {
		Definition::new()
			.set("name", faker.name())
			.set("company", faker.company())
			.set(
				"email",
				lazy(|fields| {
					let name = slug(&fields.str("name")?);
					let company = slug(&fields.str("company")?);
					Ok(json!(format!("{name}@{company}.com")))
				}),
			)
			.set("address", AddressFixture::factory())
	}
}

register_fixture!(StoreUserRequestFixture);

/// Sugar over `state` and `without`, the way project fixtures add their own
/// chainable methods.
pub trait StoreUserRequestFixtureExt: Sized {
	fn working_at(self, company: &str) -> Self;

	fn living_in(self, city: &str) -> Self;

	fn anonymous(self) -> Self;
}

impl StoreUserRequestFixtureExt for FixtureBuilder<StoreUserRequestFixture> {
	fn working_at(self, company: &str) -> Self {
		self.state(json!({"company": company}))
	}

	fn living_in(self, city: &str) -> Self {
		self.state(Definition::new().set("address.city", city))
	}

	fn anonymous(self) -> Self {
		self.without(["name", "email"])
	}
}

/// Plain nested mapping without lazy fields.
#[derive(Default)]
pub struct ProfileFixture;

impl RequestFixture for ProfileFixture {
	fn definition(&self, _faker: &mut Faker) -> Definition {
		Definition::from(json!({
			"name": "Luke Downing",
			"email": "foo@bar.com",
			"address": {"line_one": "X", "postcode": "Y", "city": "Aarhus"},
			"tags": ["a", "b"],
		}))
	}
}

/// Carries file attachments next to its data.
#[derive(Default)]
pub struct AvatarUploadFixture;

impl RequestFixture for AvatarUploadFixture {
	fn definition(&self, _faker: &mut Faker) -> Definition {
		Definition::new().set("caption", "Me").set(
			"has_avatar",
			lazy(|fields| Ok(json!(fields.contains("avatar")))),
		)
	}

	fn files(&self) -> FileAttachments {
		FileAttachments::new()
			.attach(
				"avatar",
				UploadedFile::new("avatar.png", b"\x89PNG".to_vec()).with_content_type("image/png"),
			)
			.attach("documents.cv", UploadedFile::new("cv.pdf", b"%PDF".to_vec()))
	}
}

/// Random token, used to tell seeded from unseeded resolutions apart.
#[derive(Default)]
pub struct TokenFixture;

impl RequestFixture for TokenFixture {
	fn definition(&self, faker: &mut Faker) -> Definition {
		Definition::new()
			.set("token", faker.number_between(0, i64::MAX))
			.set("email", faker.safe_email())
	}
}

#[derive(Default)]
pub struct ImportContactsPayload;

impl RequestFixture for ImportContactsPayload {
	fn definition(&self, _faker: &mut Faker) -> Definition {
		Definition::new().set("source", "csv").set("dry_run", true)
	}
}

pub mod admin {
	use reinhardt_fixture_builder::prelude::*;

	#[derive(Default)]
	pub struct BanUserRequestFixture;

	impl RequestFixture for BanUserRequestFixture {
		fn definition(&self, _faker: &mut Faker) -> Definition {
			Definition::new().set("reason", "spam").set("days", 7)
		}
	}

	register_fixture!(BanUserRequestFixture);
}
