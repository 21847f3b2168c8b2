//! Greeting selection and first-message assembly.
//!
//! Builds the two strings handed to the conversational agent: a context block
//! describing the persona and the opening line itself, with `{{char}}` and
//! `{{user}}` placeholders substituted in both.

use crate::card::CharacterCard;
use rand::Rng;

/// Placeholder tokens, substituted by literal text replacement (no escaping).
pub const CHAR_PLACEHOLDER: &str = "{{char}}";
pub const USER_PLACEHOLDER: &str = "{{user}}";

const GENERIC_CHAR_NAME: &str = "Character";
const GENERIC_USER_NAME: &str = "User";

/// How the opening line is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingPolicy {
    /// Always the resolved first message.
    Fixed,
    /// Uniform pick over the first message plus every alternate greeting.
    Random,
    /// 1-based pick from the alternate greetings; out of range silently
    /// falls back to the first message.
    Indexed(usize),
}

/// Build the initial `(context, greeting)` pair using the process RNG.
pub fn initial_message(
    card: &CharacterCard,
    user_name: &str,
    policy: GreetingPolicy,
) -> (String, String) {
    initial_message_with_rng(card, user_name, policy, &mut rand::thread_rng())
}

/// [`initial_message`] with an injected RNG, for deterministic selection.
pub fn initial_message_with_rng<R: Rng>(
    card: &CharacterCard,
    user_name: &str,
    policy: GreetingPolicy,
    rng: &mut R,
) -> (String, String) {
    let char_name = match card.resolved_name() {
        "" => GENERIC_CHAR_NAME,
        name => name,
    };
    let user_name = if user_name.is_empty() {
        GENERIC_USER_NAME
    } else {
        user_name
    };

    let base = match card.resolved_first_mes() {
        "" => format!("Hello, I am {}.", char_name),
        first_mes => first_mes.to_string(),
    };

    let alternates = &card.data.alternate_greetings;
    let greeting = match policy {
        GreetingPolicy::Fixed => base,
        GreetingPolicy::Random => {
            // The pool always contains the base greeting, so it is never
            // empty.
            let pool: Vec<&str> = std::iter::once(base.as_str())
                .chain(alternates.iter().map(String::as_str))
                .collect();
            pool[rng.gen_range(0..pool.len())].to_string()
        }
        GreetingPolicy::Indexed(n) => {
            if n >= 1 && n <= alternates.len() {
                alternates[n - 1].clone()
            } else {
                base
            }
        }
    };

    let context = context_block(card);
    (
        substitute(&context, char_name, user_name),
        substitute(&greeting, char_name, user_name),
    )
}

/// Labeled context paragraphs inside a fixed frame; a stand-in sentence when
/// the card describes nothing at all.
fn context_block(card: &CharacterCard) -> String {
    let mut parts = Vec::new();

    let description = card.resolved_description();
    if !description.is_empty() {
        parts.push(format!("Description: {}", description));
    }
    let personality = card.resolved_personality();
    if !personality.is_empty() {
        parts.push(format!("Personality (Summary): {}", personality));
    }
    let scenario = card.resolved_scenario();
    if !scenario.is_empty() {
        parts.push(format!("Scenario: {}", scenario));
    }
    let mes_example = card.resolved_mes_example();
    if !mes_example.is_empty() {
        parts.push(format!("Example Messages:\n{}", mes_example));
    }

    let mut block = String::from("[Character Context]\n---\n");
    if parts.is_empty() {
        block.push_str("No specific context provided.\n---\n\n");
    } else {
        block.push_str(&parts.join("\n\n"));
        block.push_str("\n---\n\n");
    }
    block
}

fn substitute(text: &str, char_name: &str, user_name: &str) -> String {
    text.replace(CHAR_PLACEHOLDER, char_name)
        .replace(USER_PLACEHOLDER, user_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sample_card() -> CharacterCard {
        let mut card = CharacterCard::default();
        card.data.name = "Asha".to_string();
        card.data.first_mes = "Greetings, {{user}}. I am {{char}}.".to_string();
        card.data.alternate_greetings =
            vec!["Alt one from {{char}}".to_string(), "Alt two".to_string()];
        card.data.description = "A wandering cartographer.".to_string();
        card
    }

    #[test]
    fn fixed_policy_uses_first_message() {
        let (_, greeting) = initial_message(&sample_card(), "Lin", GreetingPolicy::Fixed);
        assert_eq!(greeting, "Greetings, Lin. I am Asha.");
    }

    #[test]
    fn indexed_in_range_is_one_based() {
        let (_, greeting) = initial_message(&sample_card(), "Lin", GreetingPolicy::Indexed(1));
        assert_eq!(greeting, "Alt one from Asha");
    }

    #[test]
    fn indexed_out_of_range_falls_back() {
        let card = sample_card();
        let (context, greeting) = initial_message(&card, "Lin", GreetingPolicy::Indexed(5));
        assert_eq!(greeting, "Greetings, Lin. I am Asha.");
        // Substitution still ran on both outputs.
        assert!(context.contains("A wandering cartographer."));
        assert!(!context.contains("{{"));
    }

    #[test]
    fn random_is_deterministic_with_seeded_rng() {
        let card = sample_card();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let (_, g1) = initial_message_with_rng(&card, "Lin", GreetingPolicy::Random, &mut a);
        let (_, g2) = initial_message_with_rng(&card, "Lin", GreetingPolicy::Random, &mut b);
        assert_eq!(g1, g2);
    }

    #[test]
    fn random_pool_includes_base_and_alternates() {
        let card = sample_card();
        let expected = [
            "Greetings, Lin. I am Asha.",
            "Alt one from Asha",
            "Alt two",
        ];
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..32 {
            let (_, g) = initial_message_with_rng(&card, "Lin", GreetingPolicy::Random, &mut rng);
            assert!(expected.contains(&g.as_str()), "unexpected greeting {g:?}");
        }
    }

    #[test]
    fn empty_card_synthesizes_greeting() {
        let card = CharacterCard::default();
        let (context, greeting) = initial_message(&card, "", GreetingPolicy::Fixed);
        assert_eq!(greeting, "Hello, I am Character.");
        assert!(context.contains("No specific context provided."));
    }

    #[test]
    fn context_parts_in_fixed_order() {
        let mut card = sample_card();
        card.data.personality = "curious".to_string();
        card.data.scenario = "a drowned library".to_string();
        card.data.mes_example = "{{user}}: hi\n{{char}}: hello".to_string();

        let (context, _) = initial_message(&card, "Lin", GreetingPolicy::Fixed);
        let d = context.find("Description:").unwrap();
        let p = context.find("Personality (Summary):").unwrap();
        let s = context.find("Scenario:").unwrap();
        let e = context.find("Example Messages:").unwrap();
        assert!(d < p && p < s && s < e);
        assert!(context.starts_with("[Character Context]\n---\n"));
        assert!(context.contains("Lin: hi\nAsha: hello"));
    }
}
