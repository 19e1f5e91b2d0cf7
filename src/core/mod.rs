pub mod error;
pub mod loading;

pub use error::{
    AppError, AppResult, BatchFailure, BatchReport, ErrorCode, ErrorKind, FieldIssue,
};
pub use loading::LoadingState;
