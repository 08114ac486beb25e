//! Prompt and announcement templates.
//!
//! All text the engine synthesizes lives here: the kickoff announcement, the
//! per-turn system instruction, failure notices, and the closing summary.
//! Keeping them in one place makes the engine logic read as control flow and
//! the wording reviewable in isolation.

use crate::session::transcript::TranscriptEntry;

/// Template builder for engine-synthesized text.
pub struct PromptTemplate;

impl PromptTemplate {
    /// Kickoff announcement persisted as the session's first SYSTEM message.
    pub fn kickoff(topic: &str, participant_names: &[String], max_rounds: u32) -> String {
        format!(
            "Welcome to the roundtable discussion!\n\
             \n\
             Topic: {topic}\n\
             \n\
             Participants: {participants}\n\
             \n\
             Rules:\n\
             1. Each participant speaks in turn\n\
             2. Participants may agree or push back on points raised by others\n\
             3. The goal is to converge on the best answer together\n\
             4. The discussion runs for at most {max_rounds} rounds\n\
             \n\
             Let's begin!",
            topic = topic,
            participants = participant_names.join(", "),
            max_rounds = max_rounds,
        )
    }

    /// System instruction for one participant's turn.
    ///
    /// Names the speaker, the topic, the other voices at the table, and the
    /// round position so the model can pace itself across the session.
    pub fn turn_instruction(
        name: &str,
        topic: &str,
        other_names: &[String],
        current_round: u32,
        max_rounds: u32,
    ) -> String {
        format!(
            "You are {name}, participating in a roundtable discussion with other AI assistants.\n\
             \n\
             Topic: {topic}\n\
             \n\
             Guidelines:\n\
             1. Share your own perspective on the topic\n\
             2. Respond to points made by other participants when you agree or disagree\n\
             3. Be constructive and work towards consensus\n\
             4. Keep your response concise (2-4 paragraphs)\n\
             5. Address other participants by name when responding to them\n\
             6. Aim to find common ground and converge on a unified answer\n\
             \n\
             Other participants: {others}\n\
             \n\
             Current round: {current_round} of {max_rounds}",
            name = name,
            topic = topic,
            others = other_names.join(", "),
            current_round = current_round,
            max_rounds = max_rounds,
        )
    }

    /// Body of the SYSTEM failure notice persisted when a turn fails.
    pub fn generation_failure(name: &str, error: &str) -> String {
        format!("[{} encountered an error: {}]", name, error)
    }

    /// Deterministic closing summary: statistics plus up to three excerpts
    /// per participant, ending with the consensus line.
    pub fn summary(
        topic: &str,
        total_rounds: u32,
        participant_names: &[String],
        transcript: &[TranscriptEntry],
        consensus_percentage: f64,
    ) -> String {
        let mut summary = format!(
            "## Discussion Summary\n\
             \n\
             **Topic**: {topic}\n\
             \n\
             **Statistics**:\n\
             - Rounds: {rounds}\n\
             - Participants: {participants}\n\
             - Messages: {messages}\n\
             \n\
             **Key positions**:\n",
            topic = topic,
            rounds = total_rounds,
            participants = participant_names.join(", "),
            messages = transcript.len(),
        );

        for name in participant_names {
            let own: Vec<&TranscriptEntry> = transcript
                .iter()
                .filter(|entry| entry.speaker.as_deref() == Some(name.as_str()))
                .collect();
            if own.is_empty() {
                continue;
            }
            summary.push_str(&format!("\n**{}**:\n", name));
            for (i, entry) in own.iter().take(3).enumerate() {
                summary.push_str(&format!("{}. {}\n", i + 1, excerpt(&entry.body, 100)));
            }
        }

        summary.push_str(&format!(
            "\n**Consensus**: {:.1}%\n\nThanks to all participants for their contributions!",
            consensus_percentage
        ));
        summary
    }
}

/// First `max_chars` characters of `text`, with an ellipsis when truncated.
/// Counts characters, not bytes, so multi-byte text never splits mid-glyph.
fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_kickoff_names_topic_participants_and_budget() {
        let text = PromptTemplate::kickoff("Remote work", &names(&["Claude", "GPT-4"]), 3);
        assert!(text.contains("Topic: Remote work"));
        assert!(text.contains("Participants: Claude, GPT-4"));
        assert!(text.contains("at most 3 rounds"));
    }

    #[test]
    fn test_turn_instruction_excludes_self_and_counts_rounds() {
        let text =
            PromptTemplate::turn_instruction("Claude", "Remote work", &names(&["GPT-4"]), 2, 5);
        assert!(text.starts_with("You are Claude"));
        assert!(text.contains("Other participants: GPT-4"));
        assert!(text.contains("Current round: 2 of 5"));
    }

    #[test]
    fn test_generation_failure_notice_format() {
        assert_eq!(
            PromptTemplate::generation_failure("Claude", "timeout"),
            "[Claude encountered an error: timeout]"
        );
    }

    #[test]
    fn test_summary_takes_three_excerpts_per_speaker() {
        let transcript = vec![
            TranscriptEntry::assistant("Claude", "a".repeat(150)),
            TranscriptEntry::assistant("Claude", "second"),
            TranscriptEntry::assistant("Claude", "third"),
            TranscriptEntry::assistant("Claude", "fourth"),
            TranscriptEntry::assistant("GPT-4", "short point"),
            TranscriptEntry::user("moderator note"),
        ];
        let text = PromptTemplate::summary(
            "Remote work",
            3,
            &names(&["Claude", "GPT-4"]),
            &transcript,
            100.0,
        );

        assert!(text.contains("- Rounds: 3"));
        assert!(text.contains("- Messages: 6"));
        // Long first excerpt truncated at 100 chars with ellipsis
        assert!(text.contains(&format!("1. {}...", "a".repeat(100))));
        assert!(text.contains("3. third"));
        // Only three excerpts per participant
        assert!(!text.contains("fourth"));
        assert!(text.contains("**GPT-4**:\n1. short point"));
        assert!(text.contains("**Consensus**: 100.0%"));
    }

    #[test]
    fn test_summary_skips_silent_participants() {
        let text = PromptTemplate::summary("t", 1, &names(&["Quiet"]), &[], 0.0);
        assert!(!text.contains("**Quiet**:"));
    }

    #[test]
    fn test_excerpt_counts_characters_not_bytes() {
        // Multi-byte glyphs must not be split
        let text = "あ".repeat(120);
        let cut = excerpt(&text, 100);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 103);
    }
}
