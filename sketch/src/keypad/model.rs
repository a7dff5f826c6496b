//! Catégories et éléments du keypad

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::colour::Colour;
use crate::SketchError;

/// Élément sélectionnable d'une catégorie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Identifiant en base (`None` tant que non persisté)
    #[serde(default)]
    pub id: Option<i64>,
    pub text: String,
}

impl Item {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: None,
            text: text.into(),
        }
    }
}

/// Groupe ordonné d'éléments, nommé et coloré
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub selected: bool,
    pub colour: Colour,
    #[serde(default)]
    pub items: Vec<Item>,
}

impl Category {
    pub fn new(name: impl Into<String>, colour: Colour) -> Self {
        Self {
            id: None,
            name: name.into(),
            selected: false,
            colour,
            items: Vec::new(),
        }
    }

    /// Crée une catégorie depuis une liste d'éléments séparés par des virgules
    ///
    /// Les éléments vides sont ignorés.
    pub fn with_item_list(name: impl Into<String>, colour: Colour, list: &str) -> Self {
        let mut category = Self::new(name, colour);
        category.items = parse_item_list(list).into_iter().map(Item::new).collect();
        category
    }

    pub fn with_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Item::new));
        self
    }

    pub fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    pub fn item_texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|i| i.text.as_str())
    }

    pub(crate) fn position_of(&self, text: &str) -> Option<usize> {
        self.items.iter().position(|i| i.text == text)
    }
}

/// Découpe une saisie `a, b, c` en éléments
pub fn parse_item_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sens d'un déplacement dans une liste ordonnée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(format!("Invalid direction: {}. Use: up, down", s)),
        }
    }
}

/// Échange l'élément `index` avec son voisin, sans effet aux bornes
///
/// Retourne vrai si l'ordre a changé.
pub(crate) fn swap_neighbour<T>(list: &mut [T], index: usize, direction: Direction) -> bool {
    match direction {
        Direction::Up if index > 0 => {
            list.swap(index, index - 1);
            true
        }
        Direction::Down if index + 1 < list.len() => {
            list.swap(index, index + 1);
            true
        }
        _ => false,
    }
}

impl TryFrom<(&str, bool, &str, &[&str])> for Category {
    type Error = SketchError;

    fn try_from(
        (name, selected, colour, items): (&str, bool, &str, &[&str]),
    ) -> Result<Self, Self::Error> {
        Ok(Category::new(name, Colour::parse(colour)?)
            .selected(selected)
            .with_items(items.iter().copied()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_list() {
        assert_eq!(
            parse_item_list(" Frost_, Fire_ ,,Snow_ "),
            vec!["Frost_", "Fire_", "Snow_"]
        );
        assert_eq!(parse_item_list("Weeds_"), vec!["Weeds_"]);
        assert!(parse_item_list("  ").is_empty());
    }

    #[test]
    fn test_swap_neighbour_bounds() {
        let mut list = vec![1, 2, 3];
        assert!(!swap_neighbour(&mut list, 0, Direction::Up));
        assert!(!swap_neighbour(&mut list, 2, Direction::Down));
        assert_eq!(list, vec![1, 2, 3]);

        assert!(swap_neighbour(&mut list, 1, Direction::Up));
        assert_eq!(list, vec![2, 1, 3]);
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("UP".parse::<Direction>(), Ok(Direction::Up));
        assert!("left".parse::<Direction>().is_err());
    }

    #[test]
    fn test_category_from_tuple() {
        let items: &[&str] = &["a", "b"];
        let cat = Category::try_from(("X", true, "#010203", items)).unwrap();
        assert!(cat.selected);
        assert_eq!(cat.item_texts().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(Category::try_from(("X", true, "bad", items)).is_err());
    }
}
