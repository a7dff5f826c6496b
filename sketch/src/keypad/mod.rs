//! Keypad : catégories ordonnées d'éléments, éditées sur une copie de travail
//!
//! Les modifications portent toujours sur la copie de travail ouverte par
//! [`KeypadStore::begin_edit`]. [`KeypadStore::apply`] persiste la copie puis
//! la promeut en état validé ; [`KeypadStore::discard`] l'abandonne. L'état
//! validé n'est donc jamais partiellement modifié.
//!
//! Les recherches infructueuses laissent l'état intact et retournent
//! [`SketchError::NotFound`], que l'appelant peut ignorer.

pub mod defaults;
pub mod model;

use tracing::{debug, info};

use crate::colour::Colour;
use crate::SketchError;

pub use defaults::default_categories;
pub use model::{parse_item_list, Category, Direction, Item};

/// Stockage durable d'un keypad
pub trait KeypadPersistence {
    type Error;

    /// Charge les catégories dans l'ordre d'insertion
    fn load(&self) -> Result<Vec<Category>, Self::Error>;

    /// Remplace tout le contenu stocké, retourne les catégories avec leurs nouveaux identifiants
    fn save(&self, categories: &[Category]) -> Result<Vec<Category>, Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypadStore {
    committed: Vec<Category>,
    working: Option<Vec<Category>>,
}

impl KeypadStore {
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            committed: categories,
            working: None,
        }
    }

    /// Store initialisé avec le keypad par défaut
    pub fn with_defaults() -> Result<Self, SketchError> {
        Ok(Self::new(default_categories()?))
    }

    /// Store initialisé depuis le stockage durable
    pub fn load_from<P: KeypadPersistence>(persistence: &P) -> Result<Self, P::Error> {
        Ok(Self::new(persistence.load()?))
    }

    /// État validé
    pub fn categories(&self) -> &[Category] {
        &self.committed
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.committed.iter().find(|c| c.name == name)
    }

    /// Catégories validées cochées, dans l'ordre
    ///
    /// L'itérateur est clonable : il peut être repris depuis le début.
    pub fn selected_categories(&self) -> impl Iterator<Item = &Category> + Clone + '_ {
        self.committed.iter().filter(|c| c.selected)
    }

    pub fn is_editing(&self) -> bool {
        self.working.is_some()
    }

    pub fn working_copy(&self) -> Option<&[Category]> {
        self.working.as_deref()
    }

    /// Ouvre une session d'édition sur une copie profonde de l'état validé
    ///
    /// Une copie déjà ouverte est remplacée.
    pub fn begin_edit(&mut self) {
        self.working = Some(self.committed.clone());
    }

    fn working_mut(&mut self) -> Result<&mut Vec<Category>, SketchError> {
        self.working.as_mut().ok_or(SketchError::NotEditing)
    }

    fn find_mut(&mut self, name: &str) -> Result<&mut Category, SketchError> {
        self.working_mut()?
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| SketchError::category_not_found(name))
    }

    /// Ajoute une catégorie en fin de liste, refusée si le nom existe déjà
    pub fn add_category(&mut self, category: Category) -> Result<(), SketchError> {
        let working = self.working_mut()?;
        if working.iter().any(|c| c.name == category.name) {
            debug!(category = %category.name, "Duplicate category ignored");
            return Err(SketchError::DuplicateCategory(category.name));
        }
        working.push(category);
        Ok(())
    }

    pub fn add_item(&mut self, category_name: &str, item: Item) -> Result<(), SketchError> {
        self.find_mut(category_name)?.items.push(item);
        Ok(())
    }

    /// Supprime la catégorie et tous ses éléments
    pub fn remove_category(&mut self, name: &str) -> Result<(), SketchError> {
        let working = self.working_mut()?;
        let before = working.len();
        working.retain(|c| c.name != name);
        if working.len() == before {
            return Err(SketchError::category_not_found(name));
        }
        Ok(())
    }

    /// Supprime tous les éléments portant ce texte, retourne leur nombre
    pub fn remove_item(&mut self, category_name: &str, text: &str) -> Result<usize, SketchError> {
        let category = self.find_mut(category_name)?;
        let before = category.items.len();
        category.items.retain(|i| i.text != text);
        match before - category.items.len() {
            0 => Err(SketchError::item_not_found(category_name, text)),
            removed => Ok(removed),
        }
    }

    /// Renomme tous les éléments portant ce texte, retourne leur nombre
    pub fn rename_item(
        &mut self,
        category_name: &str,
        old_text: &str,
        new_text: &str,
    ) -> Result<usize, SketchError> {
        let category = self.find_mut(category_name)?;
        let mut renamed = 0;
        for item in category.items.iter_mut().filter(|i| i.text == old_text) {
            item.text = new_text.to_string();
            renamed += 1;
        }
        if renamed == 0 {
            return Err(SketchError::item_not_found(category_name, old_text));
        }
        Ok(renamed)
    }

    /// Échange la catégorie avec sa voisine, retourne faux aux bornes
    pub fn move_category(&mut self, name: &str, direction: Direction) -> Result<bool, SketchError> {
        let working = self.working_mut()?;
        let index = working
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| SketchError::category_not_found(name))?;
        Ok(model::swap_neighbour(working, index, direction))
    }

    /// Échange le premier élément portant ce texte avec son voisin
    pub fn move_item(
        &mut self,
        category_name: &str,
        text: &str,
        direction: Direction,
    ) -> Result<bool, SketchError> {
        let category = self.find_mut(category_name)?;
        let index = category
            .position_of(text)
            .ok_or_else(|| SketchError::item_not_found(category_name, text))?;
        Ok(model::swap_neighbour(&mut category.items, index, direction))
    }

    pub fn set_category_selected(&mut self, name: &str, selected: bool) -> Result<(), SketchError> {
        self.find_mut(name)?.selected = selected;
        Ok(())
    }

    pub fn set_category_colour(&mut self, name: &str, colour: Colour) -> Result<(), SketchError> {
        self.find_mut(name)?.colour = colour;
        Ok(())
    }

    /// Persiste la copie de travail puis la promeut en état validé
    ///
    /// Sans session d'édition, rien n'est écrit. En cas d'échec du stockage,
    /// l'état validé et la copie de travail restent inchangés.
    pub fn apply<P: KeypadPersistence>(&mut self, persistence: &P) -> Result<(), P::Error> {
        let Some(working) = self.working.as_deref() else {
            return Ok(());
        };
        let persisted = persistence.save(working)?;
        self.promote(persisted);
        Ok(())
    }

    /// Remplace l'état validé par un instantané déjà persisté et ferme la session
    pub fn promote(&mut self, persisted: Vec<Category>) {
        info!(categories = persisted.len(), "Keypad applied");
        self.committed = persisted;
        self.working = None;
    }

    /// Abandonne la copie de travail
    pub fn discard(&mut self) {
        if self.working.take().is_some() {
            debug!("Keypad edits discarded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Stockage en mémoire qui renumérote comme la base
    #[derive(Default)]
    struct MemoryPersistence {
        saved: RefCell<Vec<Category>>,
        fail: bool,
    }

    impl KeypadPersistence for MemoryPersistence {
        type Error = String;

        fn load(&self) -> Result<Vec<Category>, String> {
            Ok(self.saved.borrow().clone())
        }

        fn save(&self, categories: &[Category]) -> Result<Vec<Category>, String> {
            if self.fail {
                return Err("disk full".to_string());
            }
            let mut next_item = 1;
            let rekeyed: Vec<Category> = categories
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let mut c = c.clone();
                    c.id = Some(i as i64 + 1);
                    for item in &mut c.items {
                        item.id = Some(next_item);
                        next_item += 1;
                    }
                    c
                })
                .collect();
            *self.saved.borrow_mut() = rekeyed.clone();
            Ok(rekeyed)
        }
    }

    fn names(categories: &[Category]) -> Vec<&str> {
        categories.iter().map(|c| c.name.as_str()).collect()
    }

    fn small_store() -> KeypadStore {
        KeypadStore::new(vec![
            Category::new("A", Colour::rgb(1, 1, 1)).with_items(["a1", "a2", "a3"]),
            Category::new("B", Colour::rgb(2, 2, 2)).selected(true),
            Category::new("C", Colour::rgb(3, 3, 3)).with_items(["c1"]),
        ])
    }

    #[test]
    fn test_mutation_requires_edit_session() {
        let mut store = small_store();
        assert_eq!(
            store.add_item("A", Item::new("x")),
            Err(SketchError::NotEditing)
        );
    }

    #[test]
    fn test_working_copy_is_deep() {
        let mut store = small_store();
        store.begin_edit();
        store.add_item("A", Item::new("a4")).unwrap();
        store.rename_item("A", "a1", "first").unwrap();

        assert_eq!(store.category("A").unwrap().items.len(), 3);
        assert_eq!(store.category("A").unwrap().items[0].text, "a1");
        assert_eq!(store.working_copy().unwrap()[0].items.len(), 4);
    }

    #[test]
    fn test_add_category_rejects_duplicates() {
        let mut store = small_store();
        store.begin_edit();
        let err = store
            .add_category(Category::new("B", Colour::default()))
            .unwrap_err();
        assert_eq!(err, SketchError::DuplicateCategory("B".to_string()));

        store.add_category(Category::new("D", Colour::default())).unwrap();
        assert_eq!(names(store.working_copy().unwrap()), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_move_category_involution_and_bounds() {
        let mut store = small_store();
        store.begin_edit();
        let original = store.working_copy().unwrap().to_vec();

        assert!(store.move_category("B", Direction::Up).unwrap());
        assert_eq!(names(store.working_copy().unwrap()), vec!["B", "A", "C"]);
        assert!(store.move_category("B", Direction::Down).unwrap());
        assert_eq!(store.working_copy().unwrap(), original.as_slice());

        assert!(!store.move_category("A", Direction::Up).unwrap());
        assert!(!store.move_category("C", Direction::Down).unwrap());
        assert_eq!(store.working_copy().unwrap(), original.as_slice());
    }

    #[test]
    fn test_move_item_involution_and_bounds() {
        let mut store = small_store();
        store.begin_edit();

        assert!(store.move_item("A", "a2", Direction::Down).unwrap());
        assert!(store.move_item("A", "a2", Direction::Up).unwrap());
        let texts: Vec<_> = store.working_copy().unwrap()[0].item_texts().collect();
        assert_eq!(texts, vec!["a1", "a2", "a3"]);

        assert!(!store.move_item("A", "a1", Direction::Up).unwrap());
        assert!(!store.move_item("C", "c1", Direction::Down).unwrap());
        assert!(matches!(
            store.move_item("A", "zz", Direction::Up),
            Err(SketchError::NotFound { .. })
        ));
    }

    #[test]
    fn test_remove_item_removes_all_matches() {
        let mut store = KeypadStore::new(vec![
            Category::new("A", Colour::default()).with_items(["x", "y", "x"])
        ]);
        store.begin_edit();
        assert_eq!(store.remove_item("A", "x"), Ok(2));
        assert!(store.remove_item("A", "x").is_err());
        assert!(store.remove_item("Z", "y").is_err());
    }

    #[test]
    fn test_remove_category_drops_items() {
        let mut store = small_store();
        store.begin_edit();
        store.remove_category("A").unwrap();
        assert!(store.remove_category("A").is_err());
        assert_eq!(names(store.working_copy().unwrap()), vec!["B", "C"]);
    }

    #[test]
    fn test_apply_promotes_working_copy() {
        let persistence = MemoryPersistence::default();
        let mut store = small_store();
        store.begin_edit();
        store.set_category_selected("A", true).unwrap();
        store.set_category_colour("C", Colour::rgb(9, 9, 9)).unwrap();
        let expected: Vec<_> = store.working_copy().unwrap().to_vec();

        store.apply(&persistence).unwrap();
        assert!(!store.is_editing());
        assert_eq!(names(store.categories()), names(&expected));
        assert!(store.category("A").unwrap().selected);
        assert_eq!(store.category("C").unwrap().colour, Colour::rgb(9, 9, 9));
        assert_eq!(store.category("A").unwrap().id, Some(1));
        assert_eq!(persistence.load().unwrap(), store.categories());
    }

    #[test]
    fn test_failed_apply_keeps_both_states() {
        let persistence = MemoryPersistence {
            fail: true,
            ..Default::default()
        };
        let mut store = small_store();
        let before = store.categories().to_vec();
        store.begin_edit();
        store.remove_category("A").unwrap();

        assert!(store.apply(&persistence).is_err());
        assert_eq!(store.categories(), before.as_slice());
        assert!(store.is_editing());
    }

    #[test]
    fn test_discard_restores_committed() {
        let mut store = small_store();
        let before = store.clone();
        store.begin_edit();
        store.remove_category("B").unwrap();
        store.discard();
        assert_eq!(store, before);
    }

    #[test]
    fn test_selected_categories_is_restartable() {
        let store = small_store();
        let selected = store.selected_categories();
        assert_eq!(selected.clone().count(), 1);
        assert_eq!(selected.map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["B"]);
    }

    #[test]
    fn test_bmad_scenario() {
        let persistence = MemoryPersistence::default();
        let mut store = KeypadStore::default();
        store.begin_edit();
        store
            .add_category(Category::new("BMAD", Colour::parse("#C8B5F4").unwrap()))
            .unwrap();
        store.add_item("BMAD", Item::new("Discolour")).unwrap();
        store.apply(&persistence).unwrap();

        let saved = persistence.load().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "BMAD");
        assert_eq!(saved[0].item_texts().collect::<Vec<_>>(), vec!["Discolour"]);
    }
}
