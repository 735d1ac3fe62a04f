//! # ocf-catalog: Catalogs, Profiles, Registry and Resolution
//!
//! Static content and the one computation over it that can be cached:
//!
//! - **Catalog** (`catalog.rs`): arena-flattened control trees.
//! - **Profile** (`profile.rs`): the import/merge/exclude/add/alter
//!   mini-language.
//! - **Registry** (`registry.rs`): permitted values per field-path pattern.
//! - **Resolver** (`resolve.rs`): the profile interpreter producing a
//!   [`ResolvedBaseline`].
//! - **Store** (`store.rs`): immutable [`ContentSnapshot`]s behind an
//!   atomically swapped [`ContentStore`], with a per-profile baseline cache.
//!
//! ## Crate Policy
//!
//! - Depends only on `ocf-core` internally.
//! - No I/O outside `parser.rs` and `ContentSnapshot::load_dir`.
//! - Resolution never iterates an unordered collection.

pub mod catalog;
pub mod error;
pub mod parser;
pub mod profile;
pub mod registry;
pub mod resolve;
pub mod store;

pub use catalog::{Catalog, CatalogSource, Control, ControlSource, Parameter, Part};
pub use error::{CatalogError, CatalogResult, ProfileResolutionError};
pub use profile::{DataFlowRequirement, MergeStrategy, ParameterOverride, Profile, ProfileOp};
pub use registry::{Registry, RegistryEntry};
pub use resolve::{resolve, ControlOrigin, ResolveOptions, ResolvedBaseline, ResolvedControl};
pub use store::{CacheStatus, ContentSnapshot, ContentStore};
