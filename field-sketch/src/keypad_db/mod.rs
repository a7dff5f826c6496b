//! Persistance SQLite du keypad
//!
//! Deux tables : `categories` (ordre = `cat_id`) et `items` (ordre =
//! `item_id`). Chaque application réécrit tout le contenu en une transaction
//! et remet les séquences à zéro, les identifiants suivent donc l'ordre
//! d'affichage.

pub mod worker;

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use serde::Serialize;
use sketch::keypad::default_categories;
use sketch::{Category, Colour, Item, KeypadPersistence};
use tracing::{debug, info};

pub use worker::KeypadWorker;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS categories (
    cat_id INTEGER PRIMARY KEY AUTOINCREMENT,
    category TEXT NOT NULL,
    selected BOOLEAN NOT NULL,
    colour TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL,
    item TEXT NOT NULL,
    FOREIGN KEY(category_id) REFERENCES categories(cat_id)
);
";

/// Élément d'une catégorie sélectionnée
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedItem {
    pub item: String,
    pub selected: bool,
    pub colour: String,
}

/// Base du keypad
#[derive(Debug)]
pub struct KeypadDb {
    conn: Connection,
}

impl KeypadDb {
    /// Ouvre (ou crée) la base, schéma compris
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .context(format!("Failed to open keypad database: {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Ouvre la base et charge le keypad par défaut si les tables n'existent
    /// pas encore
    ///
    /// Un keypad vidé par l'utilisateur reste vide.
    pub fn open_or_seed(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .context(format!("Failed to open keypad database: {}", path.display()))?;
        let existed = has_schema(&conn)?;
        let db = Self::from_connection(conn)?;
        if !existed {
            info!(path = %path.display(), "New keypad database, loading defaults");
            db.seed_defaults()?;
        }
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Crée les tables si elles n'existent pas
    pub fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .context("Failed to create keypad schema")
    }

    pub fn is_empty(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    /// Recrée les tables et charge le keypad par défaut
    pub fn seed_defaults(&self) -> Result<Vec<Category>> {
        self.conn
            .execute_batch("DROP TABLE IF EXISTS items; DROP TABLE IF EXISTS categories;")
            .context("Failed to drop keypad tables")?;
        self.init_schema()?;
        self.reset_and_update(&default_categories()?)
    }

    /// Catégories et éléments dans l'ordre d'affichage
    pub fn load(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT cat_id, category, selected, colour FROM categories ORDER BY cat_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut categories = Vec::new();
        let mut index_by_id = HashMap::new();
        for row in rows {
            let (id, name, selected, colour) = row?;
            let colour = Colour::parse(&colour)
                .context(format!("Invalid colour for category {}", name))?;

            index_by_id.insert(id, categories.len());
            let mut category = Category::new(name, colour).selected(selected);
            category.id = Some(id);
            categories.push(category);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT item_id, category_id, item FROM items ORDER BY item_id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (id, category_id, text) = row?;
            match index_by_id.get(&category_id) {
                Some(&index) => categories[index].items.push(Item { id: Some(id), text }),
                None => debug!(item_id = id, category_id, "Orphan keypad item ignored"),
            }
        }

        debug!(categories = categories.len(), "Keypad loaded");
        Ok(categories)
    }

    /// Remplace tout le contenu, en une transaction
    ///
    /// Les séquences sont remises à zéro : les identifiants repartent de 1
    /// dans l'ordre fourni. Retourne l'instantané renuméroté.
    pub fn reset_and_update(&self, categories: &[Category]) -> Result<Vec<Category>> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute_batch(
            "DELETE FROM items;
             DELETE FROM categories;
             DELETE FROM sqlite_sequence WHERE name = 'categories';
             DELETE FROM sqlite_sequence WHERE name = 'items';",
        )
        .context("Failed to clear keypad tables")?;

        let mut persisted = Vec::with_capacity(categories.len());
        {
            let mut insert_category = tx.prepare_cached(
                "INSERT INTO categories (category, selected, colour) VALUES (?1, ?2, ?3)",
            )?;
            let mut insert_item =
                tx.prepare_cached("INSERT INTO items (category_id, item) VALUES (?1, ?2)")?;

            for category in categories {
                insert_category.execute(params![
                    category.name,
                    category.selected,
                    category.colour.to_string()
                ])?;
                let cat_id = tx.last_insert_rowid();

                let mut rekeyed = category.clone();
                rekeyed.id = Some(cat_id);
                for item in &mut rekeyed.items {
                    insert_item.execute(params![cat_id, item.text])?;
                    item.id = Some(tx.last_insert_rowid());
                }
                persisted.push(rekeyed);
            }
        }

        tx.commit().context("Failed to commit keypad update")?;
        info!(categories = persisted.len(), "Keypad database updated");
        Ok(persisted)
    }

    /// Éléments des catégories sélectionnées, dans l'ordre d'affichage
    pub fn selected_items(&self) -> Result<Vec<SelectedItem>> {
        let mut stmt = self.conn.prepare(
            "SELECT i.item, c.selected, c.colour
             FROM items AS i
             INNER JOIN categories AS c ON i.category_id = c.cat_id
             WHERE c.selected = 1
             ORDER BY c.cat_id, i.item_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SelectedItem {
                item: row.get(0)?,
                selected: row.get(1)?,
                colour: row.get(2)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("Failed to query selected keypad items")
    }
}

impl KeypadPersistence for KeypadDb {
    type Error = anyhow::Error;

    fn load(&self) -> Result<Vec<Category>> {
        KeypadDb::load(self)
    }

    fn save(&self, categories: &[Category]) -> Result<Vec<Category>> {
        self.reset_and_update(categories)
    }
}

fn has_schema(conn: &Connection) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'categories'",
        [],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sketch::{Direction, KeypadStore};

    fn category(name: &str, items: &[&str]) -> Category {
        Category::new(name, Colour::rgb(0x12, 0x34, 0x56)).with_items(items.iter().copied())
    }

    #[test]
    fn test_seed_defaults() {
        let db = KeypadDb::open_in_memory().unwrap();
        assert!(db.is_empty().unwrap());

        let seeded = db.seed_defaults().unwrap();
        let loaded = db.load().unwrap();

        assert_eq!(seeded, loaded);
        assert_eq!(loaded.len(), default_categories().unwrap().len());
        assert_eq!(loaded[0].name, "BMAD");
        assert_eq!(loaded[0].colour.to_hex(), "#FFC0CB");
    }

    #[test]
    fn test_ids_follow_order_after_update() {
        let db = KeypadDb::open_in_memory().unwrap();
        db.reset_and_update(&[category("A", &["a1", "a2"]), category("B", &["b1"])])
            .unwrap();

        let persisted = db
            .reset_and_update(&[category("B", &["b1"]), category("A", &["a2", "a1"])])
            .unwrap();

        let ids: Vec<_> = persisted.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
        assert_eq!(persisted[1].items[0].id, Some(2));

        let loaded = db.load().unwrap();
        assert_eq!(loaded, persisted);
        assert_eq!(loaded[0].name, "B");
        assert_eq!(loaded[1].items[0].text, "a2");
    }

    #[test]
    fn test_selected_items() {
        let db = KeypadDb::open_in_memory().unwrap();
        db.reset_and_update(&[
            category("A", &["a1", "a2"]),
            category("B", &["b1"]).selected(true),
            category("C", &["c1", "c2"]).selected(true),
        ])
        .unwrap();

        let selected = db.selected_items().unwrap();
        let texts: Vec<_> = selected.iter().map(|s| s.item.as_str()).collect();
        assert_eq!(texts, vec!["b1", "c1", "c2"]);
        assert!(selected.iter().all(|s| s.selected));
        assert_eq!(selected[0].colour, "#123456");
    }

    #[test]
    fn test_store_apply_through_db() {
        let db = KeypadDb::open_in_memory().unwrap();
        db.seed_defaults().unwrap();

        let mut store = KeypadStore::load_from(&db).unwrap();
        store.begin_edit();
        store.move_category("EUCS", Direction::Up).unwrap();
        store.set_category_selected("EUCS", true).unwrap();
        store.apply(&db).unwrap();

        let reloaded = db.load().unwrap();
        assert_eq!(reloaded, store.categories());
        assert_eq!(reloaded[0].name, "EUCS");
        assert_eq!(reloaded[0].id, Some(1));
        assert_eq!(db.selected_items().unwrap().len(), reloaded[0].items.len());
    }

    #[test]
    fn test_open_or_seed_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keypad.sqlite");

        {
            let db = KeypadDb::open_or_seed(&path).unwrap();
            db.reset_and_update(&[category("Only", &["x"])]).unwrap();
        }

        let db = KeypadDb::open_or_seed(&path).unwrap();
        let loaded = db.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Only");
    }

    #[test]
    fn test_emptied_keypad_stays_empty_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keypad.sqlite");

        {
            let db = KeypadDb::open_or_seed(&path).unwrap();
            assert_eq!(db.load().unwrap().len(), default_categories().unwrap().len());
            db.reset_and_update(&[]).unwrap();
        }

        let db = KeypadDb::open_or_seed(&path).unwrap();
        assert!(db.is_empty().unwrap());
        assert!(db.load().unwrap().is_empty());
    }
}
