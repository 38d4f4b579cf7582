pub mod attempt;
pub mod card;
pub mod category;
pub mod quiz_session;
pub mod stats;

pub use attempt::Attempt;
pub use card::Card;
pub use category::Category;
pub use quiz_session::{QuizMode, QuizSession, QuizState, Verdict};
pub use stats::StatsReport;
