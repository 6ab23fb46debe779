use rand::Rng;
use rand::seq::SliceRandom;

/// Returns the endpoints in a random order drawn from `rng`.
///
/// Every worker session connects with its own shuffled copy of the endpoint list, so that the
/// sessions of one run spread over all endpoints instead of all preferring the first one.
/// The input list is left untouched and a seeded `rng` makes the order reproducible.
///
/// # Examples
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let endpoints = ["tcp://db-1:8529", "tcp://db-2:8529", "tcp://db-3:8529"].map(String::from);
///
/// let first = doc_bench::shuffle_endpoints(&endpoints, &mut StdRng::seed_from_u64(7));
/// let second = doc_bench::shuffle_endpoints(&endpoints, &mut StdRng::seed_from_u64(7));
///
/// assert_eq!(first, second);
/// assert_eq!(first.len(), 3);
/// ```
#[must_use]
pub fn shuffle_endpoints<R>(endpoints: &[String], rng: &mut R) -> Vec<String>
where
    R: Rng + ?Sized,
{
    let mut shuffled = endpoints.to_vec();
    shuffled.shuffle(rng);
    shuffled
}
