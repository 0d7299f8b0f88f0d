//! Random payloads for seeding.

use orderdesk_common::Currency;
use rand::distributions::Alphanumeric;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Felipe", "Gabriela", "Heitor", "Isabela", "João",
];

const LAST_NAMES: &[&str] = &[
    "Almeida", "Barbosa", "Costa", "Dias", "Ferreira", "Gomes", "Lima", "Moura", "Rocha", "Souza",
];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "labore", "magna", "aliqua",
];

/// Body for `POST /users`.
#[derive(Debug, Clone, Serialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Body for `POST /orders`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub description: String,
    /// Sent as a JSON number, the way a client form would.
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub currency: Currency,
}

/// Builds users and orders from a seeded RNG.
pub struct Factory {
    rng: StdRng,
    /// Keeps emails unique across runs against the same database.
    run_tag: String,
}

impl Factory {
    pub fn new(mut rng: StdRng) -> Self {
        let run_tag = random_alnum(&mut rng, 6).to_lowercase();
        Self { rng, run_tag }
    }

    pub fn user(&mut self, index: usize) -> UserDraft {
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Ana");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Souza");
        UserDraft {
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}.{}{}@example.com",
                first.to_lowercase(),
                last.to_lowercase(),
                self.run_tag,
                index
            ),
            password: random_alnum(&mut self.rng, 12),
        }
    }

    /// A sentence of six lowercase words, a value between 10.00 and
    /// 1000.00 and a random currency.
    pub fn order(&mut self) -> OrderDraft {
        let words: Vec<&str> = (0..6)
            .filter_map(|_| WORDS.choose(&mut self.rng).copied())
            .collect();
        let mut description = words.join(" ");
        if let Some(first) = description.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        description.push('.');

        let cents: i64 = self.rng.gen_range(1_000..=100_000);
        let currency = *Currency::ALL.choose(&mut self.rng).unwrap_or(&Currency::Brl);

        OrderDraft {
            description,
            value: Decimal::new(cents, 2),
            currency,
        }
    }

    /// Pick one of `ids` at random.
    pub fn pick<T: Copy>(&mut self, ids: &[T]) -> Option<T> {
        ids.choose(&mut self.rng).copied()
    }
}

fn random_alnum(rng: &mut StdRng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}
