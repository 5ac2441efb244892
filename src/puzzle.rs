//! Puzzle script: the mayor's lines and the clue rounds.

use crate::types::{canonicalize, Clue, Round};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Puzzle {
    /// Opening announcement
    pub intro: String,
    /// Closing announcement
    pub outro: String,
    /// Said when a clue times out and others remain
    pub come_back_later: String,
    pub rounds: Vec<Round>,
}

#[derive(Debug, thiserror::Error)]
pub enum PuzzleError {
    #[error("Failed to read puzzle file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse puzzle file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Puzzle round {0} has no clues")]
    EmptyRound(usize),
}

impl Puzzle {
    /// Load a puzzle from JSON; answers are canonicalized on load
    pub fn from_json(json: &str) -> Result<Self, PuzzleError> {
        let mut puzzle: Puzzle = serde_json::from_str(json)?;
        for round in &mut puzzle.rounds {
            for clue in &mut round.clues {
                clue.answer = canonicalize(&clue.answer);
            }
        }
        puzzle.validate()?;
        Ok(puzzle)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PuzzleError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), PuzzleError> {
        match self.rounds.iter().position(Round::is_empty) {
            Some(index) => Err(PuzzleError::EmptyRound(index + 1)),
            None => Ok(()),
        }
    }

    pub fn clue_count(&self) -> usize {
        self.rounds.iter().map(Round::len).sum()
    }

    /// The town-hall meeting shipped with the game
    pub fn town_hall() -> Self {
        Self {
            intro: "Settle down, you varmints! I’m callin’ this here town hall meeting \
                    to order!! I’m yer mayor, and let me tell you, I have never seen a \
                    town hall this full of chitter-chatter. I can barely hear what \
                    anyone’s sayin!"
                .to_string(),
            outro: "Thanks for participating in tonight’s debate. As your participation \
                    prize, have some toy BAZOOKAS."
                .to_string(),
            come_back_later: "All right, we'll come back to that one later.".to_string(),
            rounds: vec![
                Round::new(vec![
                    Clue::new(
                        "Anyway, the first agenda item! Last Wednesday, Miss Elizabeth over \
                         at the Rusty Nail performed one of my favorite ditties, “If I Could \
                         Turn Back Time”.  How would you describe exactly what it is that she \
                         did? [4 4]",
                        "SANG CHER",
                        "That’s right, you French little devil! She SANG CHER. Glad to see \
                         you’re pickin’ up some of our language in this here town!",
                    ),
                    Clue::new(
                        "Second item -- the schoolhouse is gettin’ a new shipment of books \
                         in. I think a bunch of ‘em is by that Russian fella -- Doc Tolstoy, \
                         I reckon? What was that famous one that he published in 1869? \
                         [3 3 5]",
                        "WAR AND PEACE",
                        "Professor, you talk too high an’ mighty for my tastes, but you got \
                         it. WAR AND PEACE!",
                    ),
                    Clue::new(
                        "Third item. Our sheep is gettin’ rustled and eaten by that big grey \
                         furry son-of-a-gun that lives up there by them hills. I got a right \
                         mind to go over there, fill him with some buckshot, and throw him \
                         into a pot and enjoy some of what? [4 4]",
                        "WOLF STEW",
                        "I can never understand a word that’s comin’ out of yer mouth, kid, \
                         but I agree. WOLF STEW.",
                    ),
                ]),
                Round::new(vec![
                    Clue::new(
                        "Fourth item -- Madame Zoosa, over in the fortune teller’s booth, \
                         says that she can see a future with movin’ pictures, where people \
                         will give awards for the best movin’ pictures around. She says in \
                         1997, this one might get that award... [3 7 7]",
                        "THE ENGLISH PATIENT",
                        "No idea what that means, but the Madame says that THE ENGLISH \
                         PATIENT is correct!",
                    ),
                    Clue::new(
                        "Miss Jenkins over at the General Store got a shipment of ladies \
                         underthings last month, but they are not flying off the shelves the \
                         way she had hoped.  She’s trying to clear inventory, so what would \
                         we call what she is running now? [4 4]",
                        "BRAS SALE",
                        "Yeah, I guess we could say she was running a BRAS SALE. Correct!",
                    ),
                    Clue::new(
                        "Sixth item. We got some rascals from the Cutler Gang messin’ up our \
                         dogs and cats, those no-good varmints. They done came into town and \
                         took a knife to poor Mr. Walter’s dog’s feet! And Miss Kent’s cat, \
                         too! What would y’all say that they do? [4 6 4]",
                        "STAB ANIMAL PAWS",
                        "Yeah, those Cutler boys got nothin’ better to do, it seems, than \
                         STAB ANIMAL PAWS.",
                    ),
                ]),
                Round::new(vec![
                    Clue::new(
                        "On the grapevine, it looks like Old Tom and the widow Jensen are \
                         gettin’ mighty close. I wouldn’t say they’re a couple, but more like \
                         they like to hang out, and take advantage of each other’s company, \
                         if you get my meanin’. What would you call an arrangement like \
                         that? [7 4 8]",
                        "FRIENDS WITH BENEFITS",
                        "FRIENDS WITH BENEFITS, that’s a good name for it.",
                    ),
                    Clue::new(
                        "The scouts we sent out gone and done somethin’ stupid. They spilled \
                         a pot of coffee all over them constellation charts they’ve been \
                         usin’ to navigate. Now what does poor Lettie the Cartographer got to \
                         do? [6 4 4]",
                        "REDRAW STAR MAPS",
                        "Yeah, I reckon she’s gonna have to REDRAW STAR MAPS.",
                    ),
                    Clue::new(
                        "Over at the bank, they’ve been lookin’ to mint some new money. I \
                         can’t say I really agree with them -- they want to mint money that’s \
                         twenty-five to the dollar! You ever hear of somethin’ as crazy as \
                         all that? What would you even call those? [4 4 5]",
                        "FOUR CENT COINS",
                        "FOUR CENT COINS! That’s right.",
                    ),
                ]),
            ],
        }
    }
}

impl Default for Puzzle {
    fn default() -> Self {
        Self::town_hall()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_town_hall_shape() {
        let puzzle = Puzzle::town_hall();
        assert_eq!(puzzle.rounds.len(), 3);
        assert_eq!(puzzle.clue_count(), 9);
        assert!(puzzle.validate().is_ok());
        assert_eq!(puzzle.rounds[0].clues[1].answer, "WAR AND PEACE");
    }

    #[test]
    fn test_from_json_canonicalizes_answers() {
        let json = r#"{
            "intro": "hi",
            "outro": "bye",
            "come_back_later": "later",
            "rounds": [[{"text": "q?", "answer": "war, and peace", "response": "yes"}]]
        }"#;
        let puzzle = Puzzle::from_json(json).unwrap();
        assert_eq!(puzzle.rounds[0].clues[0].answer, "WAR AND PEACE");
        assert_eq!(puzzle.rounds[0].clues[0].text, "q?");
    }

    #[test]
    fn test_from_json_rejects_empty_round() {
        let json = r#"{"intro": "", "outro": "", "come_back_later": "", "rounds": [[]]}"#;
        assert!(matches!(
            Puzzle::from_json(json),
            Err(PuzzleError::EmptyRound(1))
        ));
    }
}
