use crate::model::character::Character;
use crate::model::journey::JourneyRecord;
use crate::model::participant::Participant;
use crate::model::scenario::{DecisionPoint, Scenario};

/// Builds every prompt sent to the agent.
/// Formatting only: no parsing, no networking, no journey state.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Persona instructions that precede the whole conversation.
    pub fn persona(participant: &Participant) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "You are {}, taking part in a study. Stay in character for every answer.\n\n",
            participant.name
        ));

        prompt.push_str("ABOUT YOU\n");
        if let Some(age) = participant.age {
            prompt.push_str(&format!("Age: {}\n", age));
        }
        if !participant.nationality.is_empty() {
            prompt.push_str(&format!("Nationality: {}\n", participant.nationality));
        }
        prompt.push_str(&format!("Occupation: {}\n", participant.occupation));
        prompt.push_str(&format!("Residence: {}\n\n", participant.residence));

        push_list(&mut prompt, "Personality:", &participant.personality_traits);
        push_list(&mut prompt, "Interests:", &participant.professional_interests);

        if !participant.preferences.is_empty() {
            prompt.push_str("Preferences:\n");
            for (key, value) in &participant.preferences {
                prompt.push_str(&format!("- {}: {}\n", key.replace('_', " "), value));
            }
            prompt.push('\n');
        }

        prompt.push_str(
            "Answer the way this person honestly would, including hesitation or discomfort.\n",
        );

        prompt
    }

    pub fn character_selection(characters: &[Character]) -> String {
        let mut prompt = String::new();

        prompt.push_str("You are participating in a bystander intervention training module.\n\n");
        prompt.push_str(&format!(
            "You see {} character options to experience scenarios through:\n\n",
            characters.len()
        ));

        for (i, character) in characters.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {}: {}\n   Perspective: {}\n\n",
                i + 1,
                character.name,
                character.description,
                character.perspective
            ));
        }

        prompt.push_str(
            "Based on your background and personality, which character would you choose?\n\n",
        );
        push_response_format(
            &mut prompt,
            "[character name]",
            "[your reasoning in 2-3 sentences]",
        );

        prompt
    }

    pub fn decision(scenario: &Scenario, point: &DecisionPoint) -> String {
        let mut prompt = String::new();

        prompt.push_str("SCENARIO CONTEXT:\n");
        prompt.push_str(&scenario.context);
        prompt.push_str("\n\n");

        prompt.push_str(&point.prompt);
        prompt.push_str("\n\n");

        prompt.push_str("OPTIONS:\n");
        prompt.push_str(&format_options(point));
        prompt.push_str("\n\n");

        prompt.push_str(
            "Based on your personality traits and prior experience, which option would you choose?\n\
Consider:\n\
- Your comfort level with confrontation\n\
- Your intervention style preferences\n\
- What feels authentic to who you are\n\
- What you think would be most effective\n\n",
        );

        let labels = point.legal_labels();
        push_response_format(
            &mut prompt,
            &format!("[{}]", join_alternatives(&labels)),
            "[Explain your choice in 2-4 sentences, relating it to your personality and values]",
        );

        prompt
    }

    /// Closing survey, parameterised with the finished journey.
    pub fn survey(
        journey: &JourneyRecord,
        participant: &Participant,
        scenario_names: &[&str],
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "You just completed a trauma-informed, gamified bystander intervention training \
module for preventing gender-based violence on campus.\n\n",
        );

        push_journey_summary(&mut prompt, journey, participant, scenario_names.len());

        prompt.push_str(
            "Please provide honest, detailed feedback based on your personality, cultural background, and experience.\n\
Be specific and constructive - this feedback will help improve the training for diverse students.\n\n",
        );

        push_rating_questions(&mut prompt);
        push_open_questions(&mut prompt, scenario_names);

        prompt.push_str("Respond in a structured format with each question number clearly marked.\n");

        prompt
    }
}

/// `"<label>. <text>"`, one option per line, in catalog order.
pub fn format_options(point: &DecisionPoint) -> String {
    point
        .options
        .iter()
        .map(|(label, option)| format!("{}. {}", label, option.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_list(prompt: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    prompt.push_str(title);
    prompt.push('\n');
    for item in items {
        prompt.push_str(&format!("- {}\n", item));
    }
    prompt.push('\n');
}

fn push_response_format(prompt: &mut String, choice: &str, reasoning: &str) {
    prompt.push_str("Respond in this format:\n");
    prompt.push_str(&format!("CHOICE: {}\n", choice));
    prompt.push_str(&format!("REASONING: {}\n", reasoning));
}

fn push_journey_summary(
    prompt: &mut String,
    journey: &JourneyRecord,
    participant: &Participant,
    scenario_total: usize,
) {
    let minutes = f64::from(journey.total_seconds()) / 60.0;

    prompt.push_str("YOUR JOURNEY SUMMARY:\n");
    prompt.push_str(&format!(
        "- Character perspective: {}\n",
        journey.character_selection.character_selected
    ));
    prompt.push_str(&format!("- Total time: {:.1} minutes\n", minutes));
    prompt.push_str(&format!(
        "- Scenarios completed: {}/{}\n",
        journey.scenarios.len(),
        scenario_total
    ));
    prompt.push_str(&format!(
        "- Skills developed: {} total skill points across {} intervention areas\n",
        journey.final_skills.total(),
        journey.final_skills.areas()
    ));
    prompt.push_str(&format!(
        "- Your intervention style: {}\n",
        participant.intervention_style()
    ));
    prompt.push_str(&format!(
        "- Your comfort with confrontation: {}\n\n",
        participant.comfort_with_confrontation()
    ));
}

fn push_rating_questions(prompt: &mut String) {
    prompt.push_str(
        "1. REALISM: How realistic and relatable were the scenarios? (1=very unrealistic, 5=very realistic)\n\
Rate: [1-5]\n\
Explain: Did the scenarios reflect situations you might actually encounter on campus?\n\
Were the characters and dialogue authentic? [2-3 sentences]\n\n\
2. SAFETY & TRAUMA-INFORMED DESIGN: Did you feel emotionally safe and respected throughout? (1=not at all, 5=very much)\n\
Rate: [1-5]\n\
Explain: Did the training handle sensitive topics appropriately? Were trigger warnings adequate?\n\
Did you feel any content was re-traumatizing or insensitive? [2-3 sentences]\n\n\
3. FEEDBACK QUALITY: Was the feedback after your choices helpful and instructive? (1=not helpful, 5=very helpful)\n\
Rate: [1-5]\n\
Explain: Did the feedback explain WHY your choice worked or what alternatives exist?\n\
Did it teach you practical strategies? [2-3 sentences]\n\n\
4. RECOMMENDATION: Would you recommend this to other students? (1=definitely not, 5=definitely yes)\n\
Rate: [1-5]\n\
Explain: Why or why not? What types of students would benefit most?\n\
Are there students who might find it unhelpful or problematic? [2-3 sentences]\n\n\
5. CONFIDENCE CHANGE: How confident do you feel now in intervening as a bystander? (1=not confident, 5=very confident)\n\
Rate: [1-5]\n\
Explain: What specific skills or insights increased your confidence?\n\
What barriers to intervention do you still feel? [2-3 sentences]\n\n",
    );
}

fn push_open_questions(prompt: &mut String, scenario_names: &[&str]) {
    prompt.push_str(&format!(
        "6. MOST VALUABLE SCENARIO: Which scenario was most valuable to you and why?\n\
Answer: [Name the specific scenario ({}) and explain in 3-4 sentences what made it impactful.\n\
Consider: Did it teach you something new? Did it relate to your experiences? Was the approach practical?]\n\n",
        join_alternatives(scenario_names)
    ));

    prompt.push_str(
        "7. LIKELY STRATEGY: Which intervention strategy (Direct, Distraction, Delegation, or Delay) are you most likely to actually use in real life?\n\
Answer: [Name the strategy and explain in 3-4 sentences why it fits your personality and comfort level.\n\
Give an example of when you might use it.]\n\n\
8. WHAT WORKED WELL: What aspects of this training were most effective?\n\
Answer: [List 3-4 specific things that worked well. Consider: Gamification elements (character choice, skills),\n\
scenario diversity, cultural relevance, choice feedback, pace, engagement, trauma-informed approach, etc.]\n\n\
9. IMPROVEMENTS NEEDED: What could be improved to make this training more effective?\n\
Answer: [Provide 3-4 specific, constructive suggestions. Consider: More diverse scenarios,\n\
better representation of different identities, clearer instructions, more nuanced choices,\n\
additional resources, accessibility concerns, etc.]\n\n\
10. CULTURAL RELEVANCE: How well did this training account for diverse cultural perspectives and identities?\n\
Answer: [2-3 sentences about whether the training felt inclusive of your background and identity.\n\
Were there cultural considerations that were missing or well-handled?]\n\n",
    );
}

/// "A, B, C, or D"
fn join_alternatives<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} or {}", first.as_ref(), second.as_ref()),
        [init @ .., last] => {
            let head: Vec<&str> = init.iter().map(|s| s.as_ref()).collect();
            format!("{}, or {}", head.join(", "), last.as_ref())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::scenario::{ChoiceOption, OptionSet};

    fn point() -> DecisionPoint {
        let mut options = OptionSet::default();
        for (label, text) in [("B", "Walk away"), ("A", "Check in")] {
            options.insert(
                label,
                ChoiceOption {
                    text: text.into(),
                    skills: vec![],
                    feedback: String::new(),
                },
            );
        }
        DecisionPoint {
            id: "1a".into(),
            prompt: "What do you do?".into(),
            options,
        }
    }

    #[test]
    fn options_are_listed_in_catalog_order() {
        assert_eq!(format_options(&point()), "B. Walk away\nA. Check in");
    }

    #[test]
    fn decision_prompt_lists_legal_labels() {
        let scenario = Scenario {
            id: "1".into(),
            name: "Party Observation".into(),
            context: "A crowded party.".into(),
            decision_points: vec![point()],
        };
        let prompt = PromptBuilder::decision(&scenario, &scenario.decision_points[0]);
        assert!(prompt.starts_with("SCENARIO CONTEXT:\nA crowded party."));
        assert!(prompt.contains("CHOICE: [B or A]"));
    }

    #[test]
    fn alternatives() {
        assert_eq!(join_alternatives(&["A", "B", "C", "D"]), "A, B, C, or D");
        assert_eq!(join_alternatives::<&str>(&[]), "");
    }
}
