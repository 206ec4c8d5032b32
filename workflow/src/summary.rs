use common::models::{SentenceAnalysis, SentenceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub initially_correct: usize,
    pub learner_corrected: usize,
    pub accuracy_percent: u32,
}

impl Summary {
    pub fn encouragement(&self) -> &'static str {
        match self.accuracy_percent {
            80.. => "Flott jobbet!",
            60..=79 => "Bra arbeid!",
            _ => "Fortsett å øve!",
        }
    }
}

/// Aggregates sentence statuses. Zero sentences yield 0% accuracy.
pub fn summarize(sentences: &[SentenceAnalysis]) -> Summary {
    let count = |status: SentenceStatus| sentences.iter().filter(|s| s.status == status).count();
    let total = sentences.len();
    let initially_correct = count(SentenceStatus::InitiallyCorrect);
    let learner_corrected = count(SentenceStatus::CorrectedByLearner);
    let accuracy_percent = if total == 0 {
        0
    } else {
        (100.0 * (initially_correct + learner_corrected) as f64 / total as f64).round() as u32
    };

    Summary {
        total,
        initially_correct,
        learner_corrected,
        accuracy_percent,
    }
}
