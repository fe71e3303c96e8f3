//! Random-data source handed to generated attribute layers.

use std::ops::Range;
use std::sync::{Mutex, PoisonError};

use fake::Fake;
use fake::faker::internet::en::{SafeEmail, Username};
use fake::faker::lorem::en::{Paragraph, Sentence, Word};
use fake::faker::name::en::Name;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use uuid::Uuid;

/// Generator handle for one resolution pass.
///
/// `Faker` is an [`RngCore`], so any `fake` dummy works with it directly:
///
/// ```rust,ignore
/// use fake::{Fake, faker::company::en::CompanyName};
///
/// let company: String = CompanyName().fake_with_rng(faker);
/// ```
pub struct Faker {
    rng: StdRng,
}

impl Faker {
    /// Creates a faker with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a faker seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Full person name.
    pub fn name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    /// Email address on a reserved example domain.
    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }

    pub fn username(&mut self) -> String {
        Username().fake_with_rng(&mut self.rng)
    }

    pub fn word(&mut self) -> String {
        Word().fake_with_rng(&mut self.rng)
    }

    /// Sentence with a word count drawn from `words`.
    pub fn sentence(&mut self, words: Range<usize>) -> String {
        Sentence(words).fake_with_rng(&mut self.rng)
    }

    /// Paragraph with a sentence count drawn from `sentences`.
    pub fn paragraph(&mut self, sentences: Range<usize>) -> String {
        Paragraph(sentences).fake_with_rng(&mut self.rng)
    }

    /// Integer in `min..=max`.
    pub fn number_between(&mut self, min: i64, max: i64) -> i64 {
        self.rng.gen_range(min..=max)
    }

    /// True with the given probability.
    pub fn boolean(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Random (v4-shaped) UUID drawn from this faker, so seeded runs repeat.
    pub fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.r#gen()).into_uuid()
    }

    /// Picks one element of `items`, or `None` when empty.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.rng.gen_range(0..items.len()))
    }
}

impl RngCore for Faker {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Master RNG that derives one [`Faker`] per resolution pass.
pub(crate) struct FakerSource {
    master: Mutex<StdRng>,
}

impl FakerSource {
    pub(crate) fn seeded(seed: u64) -> Self {
        Self {
            master: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub(crate) fn from_entropy() -> Self {
        Self {
            master: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub(crate) fn generate(&self) -> Faker {
        let mut master = self.master.lock().unwrap_or_else(PoisonError::into_inner);
        Faker::seeded(master.r#gen())
    }
}
