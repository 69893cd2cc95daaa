//! Fake data for fixture definitions.
//!
//! Unseeded fakers draw from OS entropy, so two resolutions differ. A seeded
//! faker produces the same sequence every time.

use fake::Fake;
use fake::faker::address::en::{CityName, PostCode, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName, Name};
use fake::faker::phone_number::en::PhoneNumber;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Random data source handed to [`RequestFixture::definition`].
///
/// [`RequestFixture::definition`]: crate::RequestFixture::definition
pub struct Faker {
	rng: StdRng,
}

impl Faker {
	/// Creates an unseeded faker.
	pub fn new() -> Self {
		Self {
			rng: StdRng::from_entropy(),
		}
	}

	/// Creates a faker producing a reproducible sequence.
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_fixture_builder::Faker;
	///
	/// let a = Faker::seeded(7).name();
	/// let b = Faker::seeded(7).name();
	/// assert_eq!(a, b);
	/// ```
	pub fn seeded(seed: u64) -> Self {
		Self {
			rng: StdRng::seed_from_u64(seed),
		}
	}

	/// Draws a seed for a dependent faker.
	pub fn next_seed(&mut self) -> u64 {
		self.rng.r#gen()
	}

	/// A full name.
	pub fn name(&mut self) -> String {
		Name().fake_with_rng(&mut self.rng)
	}

	/// A first name.
	pub fn first_name(&mut self) -> String {
		FirstName().fake_with_rng(&mut self.rng)
	}

	/// A last name.
	pub fn last_name(&mut self) -> String {
		LastName().fake_with_rng(&mut self.rng)
	}

	/// An email address on a reserved example domain.
	pub fn safe_email(&mut self) -> String {
		SafeEmail().fake_with_rng(&mut self.rng)
	}

	/// A company name.
	pub fn company(&mut self) -> String {
		CompanyName().fake_with_rng(&mut self.rng)
	}

	/// A street name.
	pub fn street_name(&mut self) -> String {
		StreetName().fake_with_rng(&mut self.rng)
	}

	/// A city name.
	pub fn city(&mut self) -> String {
		CityName().fake_with_rng(&mut self.rng)
	}

	/// A post code.
	pub fn post_code(&mut self) -> String {
		PostCode().fake_with_rng(&mut self.rng)
	}

	/// A phone number.
	pub fn phone_number(&mut self) -> String {
		PhoneNumber().fake_with_rng(&mut self.rng)
	}

	/// A sentence of three to eight words.
	pub fn sentence(&mut self) -> String {
		Sentence(3..9).fake_with_rng(&mut self.rng)
	}

	/// An integer in `min..=max`.
	pub fn number_between(&mut self, min: i64, max: i64) -> i64 {
		self.rng.gen_range(min..=max)
	}

	/// A coin flip.
	pub fn boolean(&mut self) -> bool {
		self.rng.r#gen()
	}
}

impl Default for Faker {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_seeded_fakers_agree() {
		let mut a = Faker::seeded(42);
		let mut b = Faker::seeded(42);
		assert_eq!(a.safe_email(), b.safe_email());
		assert_eq!(a.number_between(1, 1000), b.number_between(1, 1000));
		assert_eq!(a.next_seed(), b.next_seed());
	}

	#[rstest]
	#[case(0, 0)]
	#[case(1, 6)]
	#[case(-5, 5)]
	fn test_number_between_is_inclusive(#[case] min: i64, #[case] max: i64) {
		let mut faker = Faker::seeded(1);
		for _ in 0..50 {
			let n = faker.number_between(min, max);
			assert!((min..=max).contains(&n));
		}
	}

	#[rstest]
	fn test_safe_email_has_at_sign() {
		assert!(Faker::new().safe_email().contains('@'));
	}
}
