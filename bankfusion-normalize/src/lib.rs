//! bankfusion-normalize: rule suggestion, advisory escalation and the
//! absolute-authority rule ladder that yields canonical transactions.

pub mod advisory;
pub mod channel;
pub mod engine;
pub mod ladder;
pub mod merchant;
pub mod rules;
pub mod safety;
pub mod suggest;
pub mod validate;

pub use advisory::{
    AdvisoryClassifier, AdvisoryRequest, AdvisorySettings, AdvisorySuggestion, OpenAiClassifier,
};
pub use engine::{FALLBACK_CONFIDENCE, Normalizer};
pub use rules::RuleTables;
