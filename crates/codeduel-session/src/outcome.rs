//! Head-to-head outcome: compares two results and writes each player's
//! personalised message.
//!
//! Ranking rules:
//! - both won → the faster time wins; equal times are a draw
//! - exactly one won → that player wins
//! - neither won (failed or timed out) → nobody wins

use codeduel_protocol::GameResult;

/// The verdict from one player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Win,
    Lose,
    Draw,
    NoWinner,
}

impl Verdict {
    /// The headline line of the outcome message.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Win => "You win!",
            Self::Lose => "You lose",
            Self::Draw => "Draw",
            Self::NoWinner => "Noone wins",
        }
    }
}

/// Decides the verdicts for `(first, second)`.
pub fn verdicts(first: &GameResult, second: &GameResult) -> (Verdict, Verdict) {
    match (first.is_win, second.is_win) {
        (true, true) => match first.elapsed_ms.cmp(&second.elapsed_ms) {
            std::cmp::Ordering::Less => (Verdict::Win, Verdict::Lose),
            std::cmp::Ordering::Greater => (Verdict::Lose, Verdict::Win),
            std::cmp::Ordering::Equal => (Verdict::Draw, Verdict::Draw),
        },
        (true, false) => (Verdict::Win, Verdict::Lose),
        (false, true) => (Verdict::Lose, Verdict::Win),
        (false, false) => (Verdict::NoWinner, Verdict::NoWinner),
    }
}

/// One line summarising a single result.
pub fn score_line(result: &GameResult) -> String {
    if result.is_timeout {
        return "Time out\n".to_string();
    }
    format!(
        "{}, Attempts: {}, Time: {:.3} seconds\n",
        if result.is_win { "Success" } else { "Failure" },
        result.attempts,
        result.elapsed_ms as f64 / 1000.0
    )
}

/// Builds the outcome text each player receives, in `(first, second)` order.
pub fn outcome_messages(first: &GameResult, second: &GameResult) -> (String, String) {
    let (first_verdict, second_verdict) = verdicts(first, second);
    let first_line = score_line(first);
    let second_line = score_line(second);
    (
        message(first_verdict, &first_line, &second_line),
        message(second_verdict, &second_line, &first_line),
    )
}

fn message(verdict: Verdict, own: &str, opponent: &str) -> String {
    format!(
        "{}\n\nYour score\n{own}\nOponent score\n{opponent}",
        verdict.headline()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faster_winner_wins() {
        let a = GameResult::finished(true, 5, 12_000);
        let b = GameResult::finished(true, 7, 15_000);
        assert_eq!(verdicts(&a, &b), (Verdict::Win, Verdict::Lose));
        assert_eq!(verdicts(&b, &a), (Verdict::Lose, Verdict::Win));
    }

    #[test]
    fn test_equal_winning_times_draw() {
        let a = GameResult::finished(true, 3, 20_000);
        let b = GameResult::finished(true, 9, 20_000);
        assert_eq!(verdicts(&a, &b), (Verdict::Draw, Verdict::Draw));
    }

    #[test]
    fn test_only_winner_wins_regardless_of_time() {
        let slow_win = GameResult::finished(true, 10, 170_000);
        let fast_loss = GameResult::finished(false, 10, 30_000);
        assert_eq!(verdicts(&slow_win, &fast_loss), (Verdict::Win, Verdict::Lose));
        assert_eq!(
            verdicts(&GameResult::forfeit(), &slow_win),
            (Verdict::Lose, Verdict::Win)
        );
    }

    #[test]
    fn test_no_winner_when_both_fail() {
        let (a, b) = verdicts(&GameResult::forfeit(), &GameResult::forfeit());
        assert_eq!((a, b), (Verdict::NoWinner, Verdict::NoWinner));
    }

    #[test]
    fn test_score_line_formats() {
        assert_eq!(
            score_line(&GameResult::finished(true, 5, 12_000)),
            "Success, Attempts: 5, Time: 12.000 seconds\n"
        );
        assert_eq!(
            score_line(&GameResult::finished(false, 10, 61_234)),
            "Failure, Attempts: 10, Time: 61.234 seconds\n"
        );
        assert_eq!(score_line(&GameResult::forfeit()), "Time out\n");
    }

    #[test]
    fn test_outcome_messages_are_personalised() {
        let a = GameResult::finished(true, 5, 12_000);
        let b = GameResult::finished(true, 7, 15_000);
        let (to_a, to_b) = outcome_messages(&a, &b);

        assert!(to_a.starts_with("You win!"));
        assert!(to_b.starts_with("You lose"));
        let own_a = to_a.split("Oponent score").next().unwrap();
        assert!(own_a.contains("Attempts: 5"));
        let own_b = to_b.split("Oponent score").next().unwrap();
        assert!(own_b.contains("Attempts: 7"));
    }

    #[test]
    fn test_both_timed_out_messages() {
        let (to_a, to_b) =
            outcome_messages(&GameResult::forfeit(), &GameResult::forfeit());
        for text in [to_a, to_b] {
            assert!(text.starts_with("Noone wins"));
            assert_eq!(text.matches("Time out").count(), 2);
        }
    }
}
