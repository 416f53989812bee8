//! Conversation starters: sample queries offered before the first submission.

use rand::Rng;
use rand::seq::IndexedRandom;

/// Number of starters shown on the welcome screen.
pub const STARTER_COUNT: usize = 4;

pub const SAMPLE_QUERIES: &[&str] = &[
    "What is AAPL doing today?",
    "Compare the latest earnings of MSFT and GOOGL",
    "Summarize today's news for NVDA",
    "Give me a technical summary of TSLA",
    "How did the S&P 500 close yesterday?",
    "What are analysts saying about AMZN this week?",
    "Which semiconductor stocks beat earnings last quarter?",
    "Compare the P/E ratios of JPM and BAC",
    "What moved the oil majors this morning?",
    "Is META above its 50-day moving average?",
];

/// Picks `count` distinct queries at random, in random order.
pub fn pick<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<String> {
    SAMPLE_QUERIES
        .choose_multiple(rng, count)
        .map(|q| q.to_string())
        .collect()
}
