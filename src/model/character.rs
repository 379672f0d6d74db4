use serde::{Deserialize, Serialize};

/// A perspective a participant can experience the module through.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Character {
    pub name: String,
    pub description: String,
    pub perspective: String,
}

impl Character {
    fn new(name: &str, description: &str, perspective: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            perspective: perspective.into(),
        }
    }
}

pub fn default_characters() -> Vec<Character> {
    vec![
        Character::new(
            "Alex Chen",
            "International student, engineering major, resident advisor",
            "Navigating cultural differences, campus leadership role",
        ),
        Character::new(
            "Jordan Williams",
            "Student athlete (soccer team), junior, active in campus life",
            "Team dynamics, sports culture, male ally",
        ),
        Character::new(
            "Sam Rivera",
            "Art student, non-binary, involved in LGBTQ+ student group",
            "Diverse identities, creative communities, advocacy",
        ),
    ]
}
