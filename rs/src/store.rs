//! Core RecipeStore implementation

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::model::{
    Ingredient, IngredientInput, LineInput, MAX_INSTRUCTIONS, MAX_QUANTITY, MAX_UNIT, Recipe, RecipeInput, RecipeLine,
    clip,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ingredients (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL UNIQUE,
    unit    TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS recipes (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    instructions  TEXT NOT NULL DEFAULT '',
    created_at    INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS recipe_ingredients (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    recipe_id      INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
    ingredient_id  INTEGER NOT NULL REFERENCES ingredients(id),
    quantity       TEXT NOT NULL,
    unit_override  TEXT,
    UNIQUE (recipe_id, ingredient_id)
);

CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_ingredient ON recipe_ingredients(ingredient_id);
"#;

/// Row counts for the `stats` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub ingredients: usize,
    pub recipes: usize,
    pub lines: usize,
}

/// The main recipe store
pub struct RecipeStore {
    conn: Connection,
}

impl RecipeStore {
    /// Open or create a store at the given database path
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "RecipeStore::open: opened database");
        Self::init(conn)
    }

    /// Open a throwaway in-memory store
    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("RecipeStore::open_in_memory: called");
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // === Ingredients ===

    /// All ingredients ordered by name
    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        debug!("list_ingredients: called");
        let mut stmt = self.conn.prepare("SELECT id, name, unit FROM ingredients ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Ingredient {
                id: row.get(0)?,
                name: row.get(1)?,
                unit: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn get_ingredient(&self, id: i64) -> Result<Option<Ingredient>, StoreError> {
        debug!(%id, "get_ingredient: called");
        load_ingredient(&self.conn, id)
    }

    pub fn create_ingredient(&mut self, input: &IngredientInput) -> Result<Ingredient, StoreError> {
        debug!(?input, "create_ingredient: called");
        input.check(false)?;

        let name = input.name.as_deref().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(StoreError::invalid("Ingredient name is required"));
        }
        if find_ingredient_by_name(&self.conn, &name)?.is_some() {
            debug!(%name, "create_ingredient: duplicate name");
            return Err(StoreError::DuplicateIngredient(name));
        }
        let unit = clip(input.unit.as_deref().unwrap_or_default(), MAX_UNIT);

        self.conn
            .execute("INSERT INTO ingredients (name, unit) VALUES (?1, ?2)", params![name, unit])?;
        let id = self.conn.last_insert_rowid();
        info!(%id, %name, "Created ingredient");
        Ok(Ingredient { id, name, unit })
    }

    /// Partial update; `Ok(None)` when the ingredient does not exist
    pub fn update_ingredient(&mut self, id: i64, input: &IngredientInput) -> Result<Option<Ingredient>, StoreError> {
        debug!(%id, ?input, "update_ingredient: called");
        input.check(true)?;

        let Some(mut ingredient) = load_ingredient(&self.conn, id)? else {
            debug!(%id, "update_ingredient: not found");
            return Ok(None);
        };

        if let Some(name) = &input.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(StoreError::invalid("Ingredient name cannot be empty"));
            }
            if let Some(existing) = find_ingredient_by_name(&self.conn, &name)?
                && existing != id
            {
                return Err(StoreError::DuplicateIngredient(name));
            }
            ingredient.name = name;
        }
        if let Some(unit) = &input.unit {
            ingredient.unit = clip(unit, MAX_UNIT);
        }

        self.conn.execute(
            "UPDATE ingredients SET name = ?1, unit = ?2 WHERE id = ?3",
            params![ingredient.name, ingredient.unit, id],
        )?;
        info!(%id, name = %ingredient.name, "Updated ingredient");
        Ok(Some(ingredient))
    }

    /// Delete an unused ingredient; `Ok(false)` when it does not exist
    pub fn delete_ingredient(&mut self, id: i64) -> Result<bool, StoreError> {
        debug!(%id, "delete_ingredient: called");
        if load_ingredient(&self.conn, id)?.is_none() {
            return Ok(false);
        }

        let uses: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        if uses > 0 {
            debug!(%id, uses, "delete_ingredient: still referenced");
            return Err(StoreError::IngredientInUse);
        }

        self.conn.execute("DELETE FROM ingredients WHERE id = ?1", params![id])?;
        info!(%id, "Deleted ingredient");
        Ok(true)
    }

    // === Recipes ===

    /// All recipes, newest first
    pub fn list_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        debug!("list_recipes: called");
        let ids: Vec<i64> = {
            let mut stmt = self
                .conn
                .prepare("SELECT id FROM recipes ORDER BY created_at DESC, id DESC")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };

        let mut recipes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(recipe) = load_recipe(&self.conn, id)? {
                recipes.push(recipe);
            }
        }
        Ok(recipes)
    }

    pub fn get_recipe(&self, id: i64) -> Result<Option<Recipe>, StoreError> {
        debug!(%id, "get_recipe: called");
        load_recipe(&self.conn, id)
    }

    pub fn create_recipe(&mut self, input: &RecipeInput) -> Result<Recipe, StoreError> {
        debug!(?input, "create_recipe: called");
        input.check(false)?;

        let name = input.name.as_deref().unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(StoreError::invalid("Recipe name is required"));
        }
        let instructions = clip(input.instructions.as_deref().unwrap_or_default(), MAX_INSTRUCTIONS);

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO recipes (name, instructions, created_at) VALUES (?1, ?2, ?3)",
            params![name, instructions, Utc::now().timestamp_millis()],
        )?;
        let id = tx.last_insert_rowid();
        replace_lines(&tx, id, input.ingredients.as_deref().unwrap_or_default())?;
        let recipe = load_recipe(&tx, id)?.ok_or(StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        tx.commit()?;

        info!(%id, %name, lines = recipe.ingredients.len(), "Created recipe");
        Ok(recipe)
    }

    /// Partial update; a present `ingredients` list replaces every line
    pub fn update_recipe(&mut self, id: i64, input: &RecipeInput) -> Result<Option<Recipe>, StoreError> {
        debug!(%id, ?input, "update_recipe: called");
        input.check(true)?;

        let tx = self.conn.transaction()?;
        if load_recipe(&tx, id)?.is_none() {
            debug!(%id, "update_recipe: not found");
            return Ok(None);
        }

        if let Some(name) = &input.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(StoreError::invalid("Recipe name cannot be empty"));
            }
            tx.execute("UPDATE recipes SET name = ?1 WHERE id = ?2", params![name, id])?;
        }
        if let Some(instructions) = &input.instructions {
            tx.execute(
                "UPDATE recipes SET instructions = ?1 WHERE id = ?2",
                params![clip(instructions, MAX_INSTRUCTIONS), id],
            )?;
        }
        if let Some(lines) = &input.ingredients {
            replace_lines(&tx, id, lines)?;
        }

        let recipe = load_recipe(&tx, id)?;
        tx.commit()?;
        info!(%id, "Updated recipe");
        Ok(recipe)
    }

    /// Delete a recipe and its lines; `Ok(false)` when it does not exist
    pub fn delete_recipe(&mut self, id: i64) -> Result<bool, StoreError> {
        debug!(%id, "delete_recipe: called");
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM recipes WHERE id = ?1", params![id])?;
        tx.commit()?;
        if removed > 0 {
            info!(%id, "Deleted recipe");
        }
        Ok(removed > 0)
    }

    pub fn stats(&self) -> Result<StoreStats, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok(StoreStats {
            ingredients: count("ingredients")?,
            recipes: count("recipes")?,
            lines: count("recipe_ingredients")?,
        })
    }
}

fn load_ingredient(conn: &Connection, id: i64) -> Result<Option<Ingredient>, StoreError> {
    let ingredient = conn
        .query_row("SELECT id, name, unit FROM ingredients WHERE id = ?1", params![id], |row| {
            Ok(Ingredient {
                id: row.get(0)?,
                name: row.get(1)?,
                unit: row.get(2)?,
            })
        })
        .optional()?;
    Ok(ingredient)
}

fn find_ingredient_by_name(conn: &Connection, name: &str) -> Result<Option<i64>, StoreError> {
    let id = conn
        .query_row("SELECT id FROM ingredients WHERE name = ?1", params![name], |row| row.get(0))
        .optional()?;
    Ok(id)
}

fn load_recipe(conn: &Connection, id: i64) -> Result<Option<Recipe>, StoreError> {
    let head = conn
        .query_row(
            "SELECT id, name, instructions, created_at FROM recipes WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((id, name, instructions, created_ms)) = head else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT ri.ingredient_id, i.name, ri.quantity, i.unit, ri.unit_override
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?1
         ORDER BY ri.id",
    )?;
    let lines = stmt
        .query_map(params![id], |row| {
            let ingredient_unit: String = row.get(3)?;
            let unit_override: Option<String> = row.get(4)?;
            Ok(RecipeLine {
                ingredient_id: row.get(0)?,
                ingredient_name: row.get(1)?,
                quantity: row.get(2)?,
                unit: unit_override.clone().unwrap_or(ingredient_unit),
                unit_override,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(Recipe {
        id,
        name,
        instructions,
        created_at: DateTime::from_timestamp_millis(created_ms).unwrap_or_default(),
        ingredients: lines,
    }))
}

/// Replace every line of a recipe; fails without partial writes inside the caller's transaction
fn replace_lines(conn: &Connection, recipe_id: i64, lines: &[LineInput]) -> Result<(), StoreError> {
    debug!(%recipe_id, count = lines.len(), "replace_lines: called");
    conn.execute("DELETE FROM recipe_ingredients WHERE recipe_id = ?1", params![recipe_id])?;

    let mut seen = HashSet::new();
    for line in lines {
        let ingredient_id = line
            .ingredient_id
            .ok_or_else(|| StoreError::invalid("ingredient_id is required for each ingredient"))?;
        if load_ingredient(conn, ingredient_id)?.is_none() {
            return Err(StoreError::invalid(format!("Ingredient id {} not found", ingredient_id)));
        }
        if !seen.insert(ingredient_id) {
            return Err(StoreError::invalid(format!(
                "Ingredient id {} listed more than once",
                ingredient_id
            )));
        }

        let quantity = clip(line.quantity.as_deref().unwrap_or_default(), MAX_QUANTITY);
        if quantity.is_empty() {
            return Err(StoreError::invalid("Quantity is required for each ingredient"));
        }
        let unit_override = line
            .unit_override
            .as_deref()
            .map(|u| clip(u, MAX_UNIT))
            .filter(|u| !u.is_empty());

        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit_override)
             VALUES (?1, ?2, ?3, ?4)",
            params![recipe_id, ingredient_id, quantity, unit_override],
        )?;
    }
    Ok(())
}
