//! Compiles service API descriptions (named shapes plus operations) into a
//! dynamic GraphQL schema whose resolvers forward calls to a backend client.
//!
//! Data flows one way: description → extracted types → deduplicated types
//! and bound endpoints → assembled schema. Compilation happens once at
//! startup; the result is immutable.

pub mod assembly;
pub mod backend;
pub mod binder;
pub mod compiler;
pub mod config;
pub mod dedupe;
pub mod description;
pub mod error;
pub mod extract;
pub mod naming;
pub mod resolver;
pub mod types;

pub use assembly::{assemble, AssembledSchema, QUERY_TYPE, SDK_VERSION_FIELD};
pub use backend::{Backend, MethodRef, ServiceClient};
pub use binder::{bind_operation, BoundEndpoint, BoundOperation};
pub use compiler::{compile, compile_api, select_descriptions, CompiledApi, CompiledService};
pub use config::CompileConfig;
pub use dedupe::{dedupe, DedupeOutcome, DuplicateTypeConflict};
pub use description::{
    load_descriptions, parse_description, Member, Operation, ScalarTag, ServiceApiDescription,
    ServiceMetadata, ShapeDescription, ShapeTable,
};
pub use error::{CompileError, Result, ShapeError, UpstreamCallError};
pub use extract::extract;
pub use naming::method_name;
pub use resolver::{resolve, resolve_concrete, ConcreteShape};
pub use types::*;
