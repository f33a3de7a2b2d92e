pub mod analytics;
pub mod llm_service;

pub use analytics::{DashboardStats, PaperSummary, SubjectPerformance, SubjectStats, TrendPoint};
pub use llm_service::LlmService;
