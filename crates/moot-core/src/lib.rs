//! # Moot Core
//!
//! Core types for the Moot debate engine:
//! - [`DebateSession`]: per-debate state with write-once verdict and append-only histories
//! - [`PrecedentArgument`] / [`ChaosArgument`]: structured persona outputs
//! - [`CaseRecord`]: a precedent in the retrieval corpus, with metadata filtering
//!
//! ```rust
//! use moot_core::{ChaosArgument, DebateSession, PrecedentArgument, Winner};
//!
//! let mut session = DebateSession::new("A cat sues its owner.", "The owner", "The cat");
//! session
//!     .record_arguments(
//!         PrecedentArgument::uncited("The owner fed the cat daily."),
//!         ChaosArgument::new("The cat demands tuna reparations!", "Feline outrage"),
//!     )
//!     .unwrap();
//! session.declare_winner(Winner::PersonaBWins).unwrap();
//!
//! assert!(session.is_finished());
//! assert_eq!(session.persona_b_history().len(), 1);
//! ```

pub mod argument;
pub mod precedent;
pub mod session;

pub use argument::{CaseMetadata, ChaosArgument, PrecedentArgument, StructuredArgument};
pub use precedent::{matches_filters, CaseRecord, MetadataFilters};
pub use session::{DebateSession, SessionError, Winner};
