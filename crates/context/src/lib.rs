//! PaperDigest context engine
//!
//! Turns retrieved and full paper text into generated output:
//! - Section detection and prompt templates
//! - Summaries, highlights and grounded answers
//! - Multi-paper comparison
//! - Report export
//! - The [`ResearchAssistant`] facade tying the pipeline together

pub mod assistant;
pub mod comparison;
pub mod export;
pub mod prompts;
pub mod sections;
pub mod summarizer;

pub use assistant::{Answer, ResearchAssistant};
pub use comparison::{Comparator, INSUFFICIENT_PAPERS};
pub use sections::{HeuristicSectionSplitter, SectionSplitter, WholeDocument};
pub use summarizer::{check_highlights, HighlightCheck, Summarizer};
