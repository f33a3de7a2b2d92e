pub(crate) mod de;
pub mod grade;
pub mod loaders;
pub mod paper;
pub mod submission;
pub mod user;

pub use grade::Grade;
pub use loaders::{load_all_paper_files, load_paper_file, PaperFile};
pub use paper::{NewQuestionPaper, PaperPattern, PaperRequest, QuestionPaper};
pub use submission::{
    EvaluateRequest, Evaluation, EvaluationUpdate, NewSubmission, StudentSubmission,
};
pub use user::{AuthResponse, LoginRequest, Role, SignupRequest, User};
