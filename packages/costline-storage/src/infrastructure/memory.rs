//! In-memory adapter
//!
//! A fake [`EstimateStore`] backed by plain vectors behind an `RwLock`.
//! Used by engine and service tests in place of SQLite; also records every
//! index batch it applies so tests can assert on exactly what was
//! persisted.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{
    Area, AreaTemplate, EstimateStore, Group, GroupPatch, IndexEntity, IndexUpdate, LineItem,
    LineItemOptionPatch, LineItemPatch, Project, ProjectPatch,
};
use crate::error::{Result, StorageError};

#[derive(Default)]
struct State {
    /// Projects with their `areas` field kept empty; areas live below
    projects: Vec<Project>,
    areas: Vec<Area>,
    templates: Vec<AreaTemplate>,
    /// Every batch passed to `apply_index_updates`, flattened
    index_update_log: Vec<IndexUpdate>,
}

impl State {
    fn areas_mut(&mut self) -> impl Iterator<Item = &mut Area> {
        self.areas
            .iter_mut()
            .chain(self.templates.iter_mut().map(|t| &mut t.area))
    }

    fn areas_ref(&self) -> impl Iterator<Item = &Area> {
        self.areas.iter().chain(self.templates.iter().map(|t| &t.area))
    }

    fn group_mut(&mut self, group_id: &str) -> Option<&mut Group> {
        self.areas_mut()
            .flat_map(|a| a.groups.iter_mut())
            .find(|g| g.id == group_id)
    }

    fn line_item_mut(&mut self, line_item_id: &str) -> Option<&mut LineItem> {
        self.areas_mut()
            .flat_map(|a| a.groups.iter_mut())
            .flat_map(|g| g.line_items.iter_mut())
            .find(|li| li.id == line_item_id)
    }

    fn has_group(&self, group_id: &str) -> bool {
        self.areas_ref()
            .flat_map(|a| a.groups.iter())
            .any(|g| g.id == group_id)
    }

    fn has_line_item(&self, line_item_id: &str) -> bool {
        self.areas_ref()
            .flat_map(|a| a.groups.iter())
            .flat_map(|g| g.line_items.iter())
            .any(|li| li.id == line_item_id)
    }
}

/// In-memory [`EstimateStore`] fake
#[derive(Default)]
pub struct MemoryEstimateStore {
    state: RwLock<State>,
}

impl MemoryEstimateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All index updates applied so far, in application order
    pub fn applied_index_updates(&self) -> Result<Vec<IndexUpdate>> {
        Ok(self.read()?.index_update_log.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StorageError::database("state lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StorageError::database("state lock poisoned"))
    }
}

#[async_trait]
impl EstimateStore for MemoryEstimateStore {
    async fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let state = self.read()?;
        let mut project = state
            .projects
            .iter()
            .find(|p| p.id == project_id)
            .cloned()
            .ok_or_else(|| StorageError::project_not_found(project_id))?;
        project.areas = state
            .areas
            .iter()
            .filter(|a| a.project_id.as_deref() == Some(project_id))
            .cloned()
            .collect();
        Ok(project)
    }

    async fn fetch_area(&self, area_id: &str) -> Result<Area> {
        let state = self.read()?;
        let area = state
            .areas_ref()
            .find(|a| a.id == area_id)
            .cloned()
            .ok_or_else(|| StorageError::area_not_found(area_id));
        area
    }

    async fn fetch_group(&self, group_id: &str) -> Result<Group> {
        let state = self.read()?;
        let group = state
            .areas_ref()
            .flat_map(|a| a.groups.iter())
            .find(|g| g.id == group_id)
            .cloned()
            .ok_or_else(|| StorageError::group_not_found(group_id));
        group
    }

    async fn fetch_group_for_line_item(&self, line_item_id: &str) -> Result<Group> {
        let state = self.read()?;
        let group = state
            .areas_ref()
            .flat_map(|a| a.groups.iter())
            .find(|g| g.line_items.iter().any(|li| li.id == line_item_id))
            .cloned()
            .ok_or_else(|| StorageError::line_item_not_found(line_item_id));
        group
    }

    async fn fetch_template(&self, template_id: &str) -> Result<AreaTemplate> {
        let state = self.read()?;
        state
            .templates
            .iter()
            .find(|t| t.id == template_id)
            .cloned()
            .ok_or_else(|| StorageError::template_not_found(template_id))
    }

    async fn insert_project(&self, project: &Project) -> Result<()> {
        let mut state = self.write()?;
        let mut stored = project.clone();
        let areas = std::mem::take(&mut stored.areas);
        state.projects.push(stored);
        state.areas.extend(areas);
        Ok(())
    }

    async fn insert_area(&self, area: &Area) -> Result<()> {
        let mut state = self.write()?;
        state.areas.push(area.clone());
        Ok(())
    }

    async fn insert_template(&self, template: &AreaTemplate) -> Result<()> {
        let mut state = self.write()?;
        state.templates.push(template.clone());
        Ok(())
    }

    async fn delete_area(&self, area_id: &str) -> Result<()> {
        let mut state = self.write()?;
        let before = state.areas.len();
        state.areas.retain(|a| a.id != area_id);
        if state.areas.len() == before {
            return Err(StorageError::area_not_found(area_id));
        }
        Ok(())
    }

    async fn apply_index_updates(&self, updates: &[IndexUpdate]) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut state = self.write()?;

        // Validate the whole batch before touching anything, so a bad id
        // cannot leave a half-applied reorder behind
        for update in updates {
            let exists = match update.entity {
                IndexEntity::Group => state.has_group(&update.id),
                IndexEntity::LineItem => state.has_line_item(&update.id),
            };
            if !exists {
                return Err(StorageError::transaction(format!(
                    "index batch rolled back: {} not found: {}",
                    update.entity, update.id
                )));
            }
        }

        for update in updates {
            match update.entity {
                IndexEntity::Group => {
                    if let Some(group) = state.group_mut(&update.id) {
                        group.index_in_category = Some(update.new_index);
                    }
                }
                IndexEntity::LineItem => {
                    if let Some(item) = state.line_item_mut(&update.id) {
                        item.index_in_group = Some(update.new_index);
                    }
                }
            }
        }
        state.index_update_log.extend(updates.iter().cloned());
        Ok(())
    }

    async fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<()> {
        let mut state = self.write()?;
        let project = state
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| StorageError::project_not_found(project_id))?;
        patch.apply(project);
        Ok(())
    }

    async fn update_group(&self, group_id: &str, patch: &GroupPatch) -> Result<()> {
        let mut state = self.write()?;
        let group = state
            .group_mut(group_id)
            .ok_or_else(|| StorageError::group_not_found(group_id))?;
        patch.apply(group);
        Ok(())
    }

    async fn update_line_item(&self, line_item_id: &str, patch: &LineItemPatch) -> Result<()> {
        let mut state = self.write()?;
        let item = state
            .line_item_mut(line_item_id)
            .ok_or_else(|| StorageError::line_item_not_found(line_item_id))?;
        patch.apply(item);
        Ok(())
    }

    async fn update_line_item_option(
        &self,
        option_id: &str,
        patch: &LineItemOptionPatch,
    ) -> Result<()> {
        let mut state = self.write()?;
        let option = state
            .areas_mut()
            .flat_map(|a| a.groups.iter_mut())
            .flat_map(|g| g.line_items.iter_mut())
            .flat_map(|li| li.options.iter_mut())
            .find(|o| o.id == option_id)
            .ok_or_else(|| StorageError::option_not_found(option_id))?;
        patch.apply(option);
        Ok(())
    }

    async fn select_option(&self, line_item_id: &str, option_id: &str) -> Result<()> {
        let mut state = self.write()?;
        let item = state
            .line_item_mut(line_item_id)
            .ok_or_else(|| StorageError::line_item_not_found(line_item_id))?;
        if !item.options.iter().any(|o| o.id == option_id) {
            return Err(StorageError::option_not_found(option_id));
        }
        for option in &mut item.options {
            option.is_selected = option.id == option_id;
        }
        Ok(())
    }
}
