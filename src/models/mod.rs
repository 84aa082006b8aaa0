//! Response shapes surfaced by the gateway.
//!
//! The object store owns durable state; these types are projections of what
//! it reports back, serialized as JSON via `serde`.

pub mod object;
