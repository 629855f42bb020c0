//! Post-run smoke checks. Observational only: a failed check downgrades the
//! report entry and never triggers a retry.

mod types;
mod verifier;

pub use types::{CheckOutcome, VerificationEntry, VerificationReport, VerificationStatus};
pub use verifier::Verifier;
