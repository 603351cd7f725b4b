use std::sync::{LazyLock, Mutex, PoisonError};
use ulid::{Generator, Ulid};

///
/// GENERATOR is lazily initiated with a Mutex
/// it has to keep state so tokens minted in the same millisecond stay ordered
///

static GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// Generate a ULID using the process-wide monotonic generator.
///
/// Falls back to a fresh random ULID if the random component overflows within
/// one millisecond; ordering is lost for that token but uniqueness is kept.
pub(crate) fn generate() -> Ulid {
    let mut generator = GENERATOR.lock().unwrap_or_else(PoisonError::into_inner);

    generator.generate().unwrap_or_else(|_| Ulid::new())
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ulids_are_monotonic() {
        let a = generate();
        let b = generate();

        assert!(a < b);
    }
}
