// Document store abstraction for the harness.
//
// The workflows only see the `DocumentStore` trait. The three-layer layout is abstraction
// (trait) → facade (enum) → implementation, so that tests can swap in a mock store while
// production code always talks to the in-memory backend.

mod abstractions;
mod facade;
mod memory;
mod session;

pub(crate) use abstractions::*;
pub use abstractions::StoreError;
pub(crate) use facade::*;
pub(crate) use memory::*;
pub(crate) use session::*;
