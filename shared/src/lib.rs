pub mod error;
pub mod models;
pub mod validation;
pub mod fingerprint;
pub mod eligibility;
pub mod tally;
pub mod user_info;

pub use error::{CoreError, ErrorCode, ErrorResponse, Result, VoteChannel};
pub use models::*;
pub use validation::*;
pub use fingerprint::{DeviceSignals, FINGERPRINT_LENGTH};
pub use eligibility::{check_eligibility, resolve_action, IdentityAction, VoterState};
pub use tally::{count_entries, tally, TallySnapshot};
pub use user_info::*;
