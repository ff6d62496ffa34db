//! SQLite adapter for [`EstimateStore`]
//!
//! Schema notes:
//! - ownership edges carry `ON DELETE CASCADE`, so deleting an area drops
//!   its groups, line items, and options in one statement
//! - order index columns (`index_in_category`, `index_in_group`) are
//!   nullable to represent legacy rows; the engine rejects a NULL index
//!   as malformed and reconciles only numeric drift
//! - `apply_index_updates` and `select_option` run inside explicit
//!   transactions, so a reorder either fully commits or fully rolls back

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use crate::domain::{
    Area, AreaTemplate, Category, EstimateStore, Group, GroupPatch, IndexEntity, IndexUpdate,
    LineItem, LineItemOption, LineItemOptionPatch, LineItemPatch, OptionTier, Project,
    ProjectPatch,
};
use crate::error::{Result, StorageError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    start_date  TEXT,
    end_date    TEXT
);

CREATE TABLE IF NOT EXISTS project_clients (
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    client_id  TEXT NOT NULL,
    PRIMARY KEY (project_id, client_id)
);

CREATE TABLE IF NOT EXISTS project_users (
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS project_stars (
    project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id    TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS templates (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS areas (
    id          TEXT PRIMARY KEY,
    project_id  TEXT REFERENCES projects(id) ON DELETE CASCADE,
    template_id TEXT REFERENCES templates(id) ON DELETE CASCADE,
    name        TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS categories (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS item_groups (
    id                TEXT PRIMARY KEY,
    area_id           TEXT NOT NULL REFERENCES areas(id) ON DELETE CASCADE,
    category_id       TEXT NOT NULL REFERENCES categories(id),
    index_in_category INTEGER,
    is_open           INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS line_items (
    id             TEXT PRIMARY KEY,
    group_id       TEXT NOT NULL REFERENCES item_groups(id) ON DELETE CASCADE,
    name           TEXT NOT NULL,
    quantity       REAL NOT NULL DEFAULT 0,
    margin_decimal REAL NOT NULL DEFAULT 0,
    unit           TEXT,
    index_in_group INTEGER
);

CREATE TABLE IF NOT EXISTS option_tiers (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    tier_level INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS line_item_options (
    id                          TEXT PRIMARY KEY,
    line_item_id                TEXT NOT NULL REFERENCES line_items(id) ON DELETE CASCADE,
    description                 TEXT NOT NULL,
    price_adjustment_multiplier REAL NOT NULL DEFAULT 1,
    exact_cost_per_unit         REAL,
    low_cost_per_unit           REAL,
    high_cost_per_unit          REAL,
    is_selected                 INTEGER NOT NULL DEFAULT 0,
    tier_id                     TEXT REFERENCES option_tiers(id)
);

CREATE INDEX IF NOT EXISTS idx_areas_project ON areas(project_id);
CREATE INDEX IF NOT EXISTS idx_groups_area ON item_groups(area_id);
CREATE INDEX IF NOT EXISTS idx_line_items_group ON line_items(group_id);
CREATE INDEX IF NOT EXISTS idx_options_line_item ON line_item_options(line_item_id);
"#;

/// SQLite-backed [`EstimateStore`]
///
/// The connection sits behind a `Mutex`: the workload is request-scoped
/// and every operation is a short burst of statements.
pub struct SqliteEstimateStore {
    conn: Mutex<Connection>,
}

impl SqliteEstimateStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::database("connection mutex poisoned"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Row loading
// ═══════════════════════════════════════════════════════════════════════════

fn load_area(conn: &Connection, area_id: &str) -> Result<Area> {
    let mut area = conn
        .query_row(
            "SELECT id, project_id, template_id, name FROM areas WHERE id = ?1",
            params![area_id],
            |row| {
                Ok(Area {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    template_id: row.get(2)?,
                    name: row.get(3)?,
                    groups: Vec::new(),
                })
            },
        )
        .optional()?
        .ok_or_else(|| StorageError::area_not_found(area_id))?;
    area.groups = load_groups(conn, area_id)?;
    Ok(area)
}

fn load_groups(conn: &Connection, area_id: &str) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.area_id, g.category_id, c.name, g.index_in_category, g.is_open
         FROM item_groups g
         JOIN categories c ON c.id = g.category_id
         WHERE g.area_id = ?1
         ORDER BY g.category_id, g.index_in_category",
    )?;
    let rows = stmt.query_map(params![area_id], |row| {
        Ok(Group {
            id: row.get(0)?,
            area_id: row.get(1)?,
            category: Category {
                id: row.get(2)?,
                name: row.get(3)?,
            },
            index_in_category: row.get(4)?,
            is_open: row.get(5)?,
            line_items: Vec::new(),
        })
    })?;
    let mut groups = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    for group in &mut groups {
        group.line_items = load_line_items(conn, &group.id)?;
    }
    Ok(groups)
}

fn load_group(conn: &Connection, group_id: &str) -> Result<Group> {
    let mut group = conn
        .query_row(
            "SELECT g.id, g.area_id, g.category_id, c.name, g.index_in_category, g.is_open
             FROM item_groups g
             JOIN categories c ON c.id = g.category_id
             WHERE g.id = ?1",
            params![group_id],
            |row| {
                Ok(Group {
                    id: row.get(0)?,
                    area_id: row.get(1)?,
                    category: Category {
                        id: row.get(2)?,
                        name: row.get(3)?,
                    },
                    index_in_category: row.get(4)?,
                    is_open: row.get(5)?,
                    line_items: Vec::new(),
                })
            },
        )
        .optional()?
        .ok_or_else(|| StorageError::group_not_found(group_id))?;
    group.line_items = load_line_items(conn, group_id)?;
    Ok(group)
}

fn load_line_items(conn: &Connection, group_id: &str) -> Result<Vec<LineItem>> {
    let mut stmt = conn.prepare(
        "SELECT id, group_id, name, quantity, margin_decimal, unit, index_in_group
         FROM line_items WHERE group_id = ?1
         ORDER BY index_in_group",
    )?;
    let rows = stmt.query_map(params![group_id], |row| {
        Ok(LineItem {
            id: row.get(0)?,
            group_id: row.get(1)?,
            name: row.get(2)?,
            quantity: row.get(3)?,
            margin_decimal: row.get(4)?,
            unit: row.get(5)?,
            index_in_group: row.get(6)?,
            options: Vec::new(),
        })
    })?;
    let mut items = rows.collect::<std::result::Result<Vec<_>, _>>()?;
    for item in &mut items {
        item.options = load_options(conn, &item.id)?;
    }
    Ok(items)
}

fn load_options(conn: &Connection, line_item_id: &str) -> Result<Vec<LineItemOption>> {
    let mut stmt = conn.prepare(
        "SELECT o.id, o.line_item_id, o.description, o.price_adjustment_multiplier,
                o.exact_cost_per_unit, o.low_cost_per_unit, o.high_cost_per_unit,
                o.is_selected, t.id, t.name, t.tier_level
         FROM line_item_options o
         LEFT JOIN option_tiers t ON t.id = o.tier_id
         WHERE o.line_item_id = ?1
         ORDER BY t.tier_level, o.id",
    )?;
    let rows = stmt.query_map(params![line_item_id], |row| {
        let tier = match row.get::<_, Option<String>>(8)? {
            Some(tier_id) => Some(OptionTier {
                id: tier_id,
                name: row.get(9)?,
                tier_level: row.get(10)?,
            }),
            None => None,
        };
        Ok(LineItemOption {
            id: row.get(0)?,
            line_item_id: row.get(1)?,
            description: row.get(2)?,
            price_adjustment_multiplier: row.get(3)?,
            exact_cost_per_unit: row.get(4)?,
            low_cost_per_unit: row.get(5)?,
            high_cost_per_unit: row.get(6)?,
            is_selected: row.get(7)?,
            tier,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ═══════════════════════════════════════════════════════════════════════════
// Tree insertion
// ═══════════════════════════════════════════════════════════════════════════

fn insert_area_tree(tx: &Transaction<'_>, area: &Area) -> Result<()> {
    tx.execute(
        "INSERT INTO areas (id, project_id, template_id, name) VALUES (?1, ?2, ?3, ?4)",
        params![area.id, area.project_id, area.template_id, area.name],
    )?;
    for group in &area.groups {
        tx.execute(
            "INSERT OR IGNORE INTO categories (id, name) VALUES (?1, ?2)",
            params![group.category.id, group.category.name],
        )?;
        tx.execute(
            "INSERT INTO item_groups (id, area_id, category_id, index_in_category, is_open)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                group.id,
                group.area_id,
                group.category.id,
                group.index_in_category,
                group.is_open
            ],
        )?;
        for item in &group.line_items {
            tx.execute(
                "INSERT INTO line_items
                 (id, group_id, name, quantity, margin_decimal, unit, index_in_group)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    item.id,
                    item.group_id,
                    item.name,
                    item.quantity,
                    item.margin_decimal,
                    item.unit,
                    item.index_in_group
                ],
            )?;
            for option in &item.options {
                if let Some(tier) = &option.tier {
                    tx.execute(
                        "INSERT OR IGNORE INTO option_tiers (id, name, tier_level)
                         VALUES (?1, ?2, ?3)",
                        params![tier.id, tier.name, tier.tier_level],
                    )?;
                }
                tx.execute(
                    "INSERT INTO line_item_options
                     (id, line_item_id, description, price_adjustment_multiplier,
                      exact_cost_per_unit, low_cost_per_unit, high_cost_per_unit,
                      is_selected, tier_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        option.id,
                        option.line_item_id,
                        option.description,
                        option.price_adjustment_multiplier,
                        option.exact_cost_per_unit,
                        option.low_cost_per_unit,
                        option.high_cost_per_unit,
                        option.is_selected,
                        option.tier.as_ref().map(|t| t.id.as_str()),
                    ],
                )?;
            }
        }
    }
    Ok(())
}

fn ids_for(conn: &Connection, sql: &str, key: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![key], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ═══════════════════════════════════════════════════════════════════════════
// Port implementation
// ═══════════════════════════════════════════════════════════════════════════

#[async_trait]
impl EstimateStore for SqliteEstimateStore {
    async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let conn = self.conn()?;
        let mut project = conn
            .query_row(
                "SELECT id, name, description, start_date, end_date
                 FROM projects WHERE id = ?1",
                params![project_id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        start_date: row.get(3)?,
                        end_date: row.get(4)?,
                        client_ids: Vec::new(),
                        user_ids: Vec::new(),
                        starred_by: Vec::new(),
                        areas: Vec::new(),
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StorageError::project_not_found(project_id))?;

        project.client_ids = ids_for(
            &conn,
            "SELECT client_id FROM project_clients WHERE project_id = ?1 ORDER BY client_id",
            project_id,
        )?;
        project.user_ids = ids_for(
            &conn,
            "SELECT user_id FROM project_users WHERE project_id = ?1 ORDER BY user_id",
            project_id,
        )?;
        project.starred_by = ids_for(
            &conn,
            "SELECT user_id FROM project_stars WHERE project_id = ?1 ORDER BY user_id",
            project_id,
        )?;

        let area_ids = ids_for(
            &conn,
            "SELECT id FROM areas WHERE project_id = ?1 ORDER BY id",
            project_id,
        )?;
        for area_id in area_ids {
            project.areas.push(load_area(&conn, &area_id)?);
        }
        Ok(project)
    }

    async fn fetch_area(&self, area_id: &str) -> Result<Area> {
        let conn = self.conn()?;
        load_area(&conn, area_id)
    }

    async fn fetch_group(&self, group_id: &str) -> Result<Group> {
        let conn = self.conn()?;
        load_group(&conn, group_id)
    }

    async fn fetch_group_for_line_item(&self, line_item_id: &str) -> Result<Group> {
        let conn = self.conn()?;
        let group_id: String = conn
            .query_row(
                "SELECT group_id FROM line_items WHERE id = ?1",
                params![line_item_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StorageError::line_item_not_found(line_item_id))?;
        load_group(&conn, &group_id)
    }

    async fn fetch_template(&self, template_id: &str) -> Result<AreaTemplate> {
        let conn = self.conn()?;
        let (id, name): (String, String) = conn
            .query_row(
                "SELECT id, name FROM templates WHERE id = ?1",
                params![template_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or_else(|| StorageError::template_not_found(template_id))?;
        let area_id: String = conn
            .query_row(
                "SELECT id FROM areas WHERE template_id = ?1",
                params![template_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                StorageError::template_not_found(format!("{} (no backing area)", template_id))
            })?;
        let area = load_area(&conn, &area_id)?;
        Ok(AreaTemplate { id, name, area })
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (id, name, description, start_date, end_date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                project.description,
                project.start_date,
                project.end_date
            ],
        )?;
        for client_id in &project.client_ids {
            tx.execute(
                "INSERT INTO project_clients (project_id, client_id) VALUES (?1, ?2)",
                params![project.id, client_id],
            )?;
        }
        for user_id in &project.user_ids {
            tx.execute(
                "INSERT INTO project_users (project_id, user_id) VALUES (?1, ?2)",
                params![project.id, user_id],
            )?;
        }
        for user_id in &project.starred_by {
            tx.execute(
                "INSERT INTO project_stars (project_id, user_id) VALUES (?1, ?2)",
                params![project.id, user_id],
            )?;
        }
        for area in &project.areas {
            insert_area_tree(&tx, area)?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn insert_area(&self, area: &Area) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        insert_area_tree(&tx, area)?;
        tx.commit()?;
        Ok(())
    }

    async fn insert_template(&self, template: &AreaTemplate) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO templates (id, name) VALUES (?1, ?2)",
            params![template.id, template.name],
        )?;
        insert_area_tree(&tx, &template.area)?;
        tx.commit()?;
        Ok(())
    }

    async fn delete_area(&self, area_id: &str) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM areas WHERE id = ?1", params![area_id])?;
        if deleted == 0 {
            return Err(StorageError::area_not_found(area_id));
        }
        Ok(())
    }

    async fn apply_index_updates(&self, updates: &[IndexUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for update in updates {
            let sql = match update.entity {
                IndexEntity::Group => "UPDATE item_groups SET index_in_category = ?1 WHERE id = ?2",
                IndexEntity::LineItem => "UPDATE line_items SET index_in_group = ?1 WHERE id = ?2",
            };
            let changed = tx.execute(sql, params![update.new_index, update.id])?;
            if changed != 1 {
                // Dropping the transaction rolls the whole batch back
                return Err(StorageError::transaction(format!(
                    "index batch rolled back: {} not found: {}",
                    update.entity, update.id
                )));
            }
        }
        tx.commit()?;
        Ok(())
    }

    async fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM projects WHERE id = ?1",
                params![project_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::project_not_found(project_id));
        }
        if let Some(name) = &patch.name {
            tx.execute(
                "UPDATE projects SET name = ?1 WHERE id = ?2",
                params![name, project_id],
            )?;
        }
        if let Some(description) = &patch.description {
            tx.execute(
                "UPDATE projects SET description = ?1 WHERE id = ?2",
                params![description, project_id],
            )?;
        }
        if let Some(start_date) = &patch.start_date {
            tx.execute(
                "UPDATE projects SET start_date = ?1 WHERE id = ?2",
                params![start_date, project_id],
            )?;
        }
        if let Some(end_date) = &patch.end_date {
            tx.execute(
                "UPDATE projects SET end_date = ?1 WHERE id = ?2",
                params![end_date, project_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn update_group(&self, group_id: &str, patch: &GroupPatch) -> Result<()> {
        let conn = self.conn()?;
        if let Some(is_open) = patch.is_open {
            let changed = conn.execute(
                "UPDATE item_groups SET is_open = ?1 WHERE id = ?2",
                params![is_open, group_id],
            )?;
            if changed == 0 {
                return Err(StorageError::group_not_found(group_id));
            }
        }
        Ok(())
    }

    async fn update_line_item(&self, line_item_id: &str, patch: &LineItemPatch) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM line_items WHERE id = ?1",
                params![line_item_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::line_item_not_found(line_item_id));
        }
        if let Some(name) = &patch.name {
            tx.execute(
                "UPDATE line_items SET name = ?1 WHERE id = ?2",
                params![name, line_item_id],
            )?;
        }
        if let Some(quantity) = patch.quantity {
            tx.execute(
                "UPDATE line_items SET quantity = ?1 WHERE id = ?2",
                params![quantity, line_item_id],
            )?;
        }
        if let Some(margin) = patch.margin_decimal {
            tx.execute(
                "UPDATE line_items SET margin_decimal = ?1 WHERE id = ?2",
                params![margin, line_item_id],
            )?;
        }
        if let Some(unit) = &patch.unit {
            tx.execute(
                "UPDATE line_items SET unit = ?1 WHERE id = ?2",
                params![unit, line_item_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn update_line_item_option(
        &self,
        option_id: &str,
        patch: &LineItemOptionPatch,
    ) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM line_item_options WHERE id = ?1",
                params![option_id],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(StorageError::option_not_found(option_id));
        }
        if let Some(description) = &patch.description {
            tx.execute(
                "UPDATE line_item_options SET description = ?1 WHERE id = ?2",
                params![description, option_id],
            )?;
        }
        if let Some(multiplier) = patch.price_adjustment_multiplier {
            tx.execute(
                "UPDATE line_item_options SET price_adjustment_multiplier = ?1 WHERE id = ?2",
                params![multiplier, option_id],
            )?;
        }
        if let Some(exact) = &patch.exact_cost_per_unit {
            tx.execute(
                "UPDATE line_item_options SET exact_cost_per_unit = ?1 WHERE id = ?2",
                params![exact, option_id],
            )?;
        }
        if let Some(low) = &patch.low_cost_per_unit {
            tx.execute(
                "UPDATE line_item_options SET low_cost_per_unit = ?1 WHERE id = ?2",
                params![low, option_id],
            )?;
        }
        if let Some(high) = &patch.high_cost_per_unit {
            tx.execute(
                "UPDATE line_item_options SET high_cost_per_unit = ?1 WHERE id = ?2",
                params![high, option_id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn select_option(&self, line_item_id: &str, option_id: &str) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let item_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM line_items WHERE id = ?1",
                params![line_item_id],
                |row| row.get(0),
            )
            .optional()?;
        if item_exists.is_none() {
            return Err(StorageError::line_item_not_found(line_item_id));
        }
        let option_exists: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM line_item_options WHERE id = ?1 AND line_item_id = ?2",
                params![option_id, line_item_id],
                |row| row.get(0),
            )
            .optional()?;
        if option_exists.is_none() {
            return Err(StorageError::option_not_found(option_id));
        }
        tx.execute(
            "UPDATE line_item_options SET is_selected = 0 WHERE line_item_id = ?1",
            params![line_item_id],
        )?;
        tx.execute(
            "UPDATE line_item_options SET is_selected = 1 WHERE id = ?1",
            params![option_id],
        )?;
        tx.commit()?;
        Ok(())
    }
}
