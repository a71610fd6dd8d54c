//! Card list sources (projects, talks, teaching, ...).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardError {
    #[error("Invalid card list: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Card #{0} has an empty title")]
    EmptyTitle(usize),
}

/// One card as written in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub title: String,

    #[serde(default)]
    pub subtitle: Option<String>,

    /// Markdown
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub date: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

/// Parse a YAML list of cards. Blank input is an empty list.
pub fn parse_cards(text: &str) -> Result<Vec<Card>, CardError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    let cards: Vec<Card> = serde_yaml::from_str(text)?;
    if let Some(index) = cards.iter().position(|c| c.title.trim().is_empty()) {
        return Err(CardError::EmptyTitle(index + 1));
    }

    Ok(cards)
}
