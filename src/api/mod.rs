//! Buildly resources and the request/cache/alert cycle over them.

pub mod api_types;
pub mod mutations;
pub mod product_machine;
pub mod queries;
pub mod resource;
pub mod types;

pub use mutations::{MutationClient, MutationError, MutationOptions};
pub use product_machine::{transition, ProductEvent, ProductMachine, ProductState};
pub use queries::QueryClient;
pub use resource::{is_blank, Resource};
