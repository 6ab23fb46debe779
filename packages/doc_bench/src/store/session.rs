// Per-worker view of the document store.

use rand::Rng;
use tracing::debug;

use crate::shuffle_endpoints;
use crate::store::StoreFacade;

/// The connection a single worker uses for all of its bulk requests.
#[derive(Clone, Debug)]
pub(crate) struct Session {
    endpoints: Vec<String>,
    store: StoreFacade,
}

impl Session {
    /// The endpoints this session connects to, in order of preference.
    pub(crate) fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub(crate) fn store(&self) -> &StoreFacade {
        &self.store
    }
}

/// Opens one session per worker, each with its own shuffled endpoint list.
pub(crate) fn connect_sessions<R>(
    workers: usize,
    endpoints: &[String],
    store: &StoreFacade,
    rng: &mut R,
) -> Box<[Session]>
where
    R: Rng + ?Sized,
{
    (0..workers)
        .map(|worker| {
            let endpoints = shuffle_endpoints(endpoints, rng);

            debug!(worker, preferred = ?endpoints.first(), "session opened");

            Session {
                endpoints,
                store: store.clone(),
            }
        })
        .collect()
}
