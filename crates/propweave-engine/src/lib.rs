//! Classification and injection planning for change-notification weaving.
//!
//! Given a [`propweave_core::TypeRepository`], the weaver decides per type
//! whether to leave it alone, let it inherit notification from an ancestor, or
//! synthesize the notification members for it.
//!
//! ## Pipeline
//!
//! ```text
//! repository ─▶ InclusionFilter ─▶ ForestBuilder ─▶ NotifierClassifier ─▶ InjectionPlanner
//!                                                         │                      │
//!                                                   inherited nodes        injected nodes
//!                                                         └──────▶ WeaveOutcome ◀┘
//! ```
//!
//! Classification never mutates the repository. Stamping the capability
//! marker is a separate step ([`WeaveOutcome::apply`]) that only runs on a
//! successful outcome.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use propweave_core::TypeRepository;
//! use propweave_engine::{Weaver, WeaverConfig};
//!
//! fn run(repo: &TypeRepository) -> propweave_engine::WeaveResult<()> {
//!     let weaver = Weaver::new(WeaverConfig::default())?;
//!     let outcome = weaver.run(repo)?;
//!     for selected in outcome.selected_types() {
//!         println!("{} ({})", selected.name, selected.origin.label());
//!     }
//!     Ok(())
//! }
//! ```

mod cancel;
mod classify;
pub mod config;
mod error;
mod filter;
mod forest;
mod inject;
mod plan;
mod synthesis;
mod weaver;

pub use cancel::{CancellationSignal, NeverCancel};
pub use classify::{Classification, NotifierClassifier, NotifyNode, NotifyOrigin};
pub use config::{WeaverConfig, WeavingMode, DEFAULT_EVENT_INVOKER};
pub use error::{WeaveError, WeaveResult};
pub use filter::{Inclusion, InclusionFilter};
pub use forest::{Forest, ForestBuilder, TypeNode};
pub use inject::CapabilityInjector;
pub use plan::{Conflict, ConflictPolicy, ConflictReason, InjectionPlan, InjectionPlanner};
pub use synthesis::{InvokerParameter, InvokerPlan, SynthesisPlan, Visibility};
pub use weaver::{SelectedType, WeaveOutcome, Weaver};
