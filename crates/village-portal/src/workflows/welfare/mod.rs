//! Samurdhi subsidy and microfinance loan applications.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;


pub use domain::{
    ApplicationId, WelfareApplication, WelfareDecision, WelfareProgram, WelfareStatus,
    WelfareSubmission,
};
pub use repository::WelfareRepository;
pub use router::welfare_router;
pub use service::{WelfareError, WelfareService};
