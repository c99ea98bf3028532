pub mod artwork;
pub mod audit;
pub mod donation;
pub mod pointer;
pub mod season;
pub mod user;

pub use artwork::Artwork;
pub use audit::{AdminAction, AdminActionKind};
pub use donation::{Donation, DonationStatus};
pub use pointer::{SubmissionPointer, VotePointer};
pub use season::Season;
pub use user::{Role, UserProfile};
