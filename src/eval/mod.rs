pub mod evaluate;
pub mod score;

pub use evaluate::{cross_validate, evaluate};
pub use score::{LabelBreakdown, Score, ScoreSummary};
