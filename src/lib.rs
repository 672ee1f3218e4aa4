// Module layout (Clean Architecture style)
// - bootstrap: configuration and context wiring
// - infrastructure: DB/cache/object-store/collaboration adapters
// - application: ports, access policy and use cases
// - domain: core models

pub mod application;
pub mod bootstrap;
pub mod domain;
pub mod infrastructure;
