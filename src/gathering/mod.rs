//! Gathering registry and the auto-matchmake workflow
//!
//! The store holds every live gathering, the matcher finds joinable ones,
//! membership keeps participant lists consistent and the manager ties them
//! together under a single lock.

pub mod instance;
pub mod manager;
pub mod matching;
pub mod membership;
pub mod rules;
pub mod store;

pub use instance::GatheringSession;
pub use manager::{GatheringManager, GatheringManagerBuilder, GatheringManagerStats};
pub use matching::{GatheringMatcher, MatchingResult};
pub use membership::RemovalOutcome;
pub use rules::{MatchmakeRules, StandardMatchmakeRules};
pub use store::SessionStore;
