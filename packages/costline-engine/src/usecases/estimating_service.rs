//! Estimating service
//!
//! The outer surface of the engine, driven in-process by route handlers.
//! Constructed with an [`EstimateStore`] (explicit dependency injection;
//! tests substitute the in-memory fake).
//!
//! Reads self-heal: any fetch of an area runs the consistency reconciler
//! first, so callers always observe contiguous `0..n` indices even after
//! concurrent or partial writes drifted the persisted ones. All index
//! corrections for one operation are persisted as a single atomic batch.

use costline_storage::{
    Area, EstimateStore, Group, GroupPatch, IndexUpdate, LineItem, LineItemOptionPatch,
    LineItemPatch, ProjectPatch,
};
use tracing::warn;
use uuid::Uuid;

use crate::errors::{EngineError, Result};
use crate::ordering::{move_to_index, partition_by_key, reindex, Correction, Ordered};
use crate::pricing::{self, CostRange};

/// Normalize every order index inside an area, in memory
///
/// Groups are re-indexed per category partition (ordering in category A
/// never disturbs category B); line items are re-indexed within each
/// group. Returns the corrections to persist. The area's groups end up
/// ordered category by category (first-encounter order), each category's
/// groups sorted by index.
pub fn reconcile_area(area: &mut Area) -> Result<Vec<IndexUpdate>> {
    let mut updates = Vec::new();

    let groups = std::mem::take(&mut area.groups);
    let mut category_order: Vec<String> = Vec::new();
    for group in &groups {
        if !category_order.contains(&group.category.id) {
            category_order.push(group.category.id.clone());
        }
    }
    let mut partitions = partition_by_key(groups, |g: &Group| g.category.id.clone());
    for category_id in category_order {
        if let Some(mut siblings) = partitions.remove(&category_id) {
            for correction in reindex(&mut siblings)? {
                updates.push(IndexUpdate::group(correction.id, correction.new_index));
            }
            area.groups.append(&mut siblings);
        }
    }

    for group in &mut area.groups {
        for correction in reindex(&mut group.line_items)? {
            updates.push(IndexUpdate::line_item(correction.id, correction.new_index));
        }
    }
    Ok(updates)
}

fn apply_corrections<T: Ordered>(items: &mut [T], corrections: &[Correction]) {
    for correction in corrections {
        if let Some(item) = items.iter_mut().find(|i| i.item_id() == correction.id) {
            item.set_order_index(correction.new_index);
        }
    }
}

/// Estimating operations over an injected persistence port
pub struct EstimatingService<S> {
    store: S,
}

impl<S: EstimateStore> EstimatingService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reads (self-healing)
    // ═══════════════════════════════════════════════════════════════════════

    /// Fetch an area, repairing any drifted order indices on the way out
    ///
    /// The returned tree always carries contiguous `0..n` indices; the
    /// corrections (if any) are persisted as one atomic batch before the
    /// area is returned.
    pub async fn area_with_consistent_indices(&self, area_id: &str) -> Result<Area> {
        let mut area = self.store.fetch_area(area_id).await?;
        let updates = reconcile_area(&mut area)?;
        if !updates.is_empty() {
            warn!(
                area_id,
                corrections = updates.len(),
                "repairing drifted order indices on read"
            );
            self.store.apply_index_updates(&updates).await?;
        }
        Ok(area)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reordering
    // ═══════════════════════════════════════════════════════════════════════

    /// Move a group to `new_index` among siblings sharing its category
    ///
    /// Returns the updated sibling set in its new order.
    pub async fn move_group(&self, group_id: &str, new_index: i64) -> Result<Vec<Group>> {
        let group = self.store.fetch_group(group_id).await?;
        let area = self.area_with_consistent_indices(&group.area_id).await?;
        let mut siblings: Vec<Group> = area
            .groups
            .into_iter()
            .filter(|g| g.category.id == group.category.id)
            .collect();

        let corrections = move_to_index(&siblings, group_id, new_index)?;
        let updates: Vec<IndexUpdate> = corrections
            .iter()
            .map(|c| IndexUpdate::group(c.id.clone(), c.new_index))
            .collect();
        self.store.apply_index_updates(&updates).await?;

        apply_corrections(&mut siblings, &corrections);
        siblings.sort_by_key(|g| g.index_in_category);
        Ok(siblings)
    }

    /// Move a line item to `new_index` within its group
    ///
    /// Returns the group's line items in their new order.
    pub async fn move_line_item(
        &self,
        line_item_id: &str,
        new_index: i64,
    ) -> Result<Vec<LineItem>> {
        let mut group = self.store.fetch_group_for_line_item(line_item_id).await?;

        // Heal drift inside the group before computing the move
        let heal: Vec<IndexUpdate> = reindex(&mut group.line_items)?
            .into_iter()
            .map(|c| IndexUpdate::line_item(c.id, c.new_index))
            .collect();
        if !heal.is_empty() {
            warn!(
                group_id = %group.id,
                corrections = heal.len(),
                "repairing drifted line item indices before move"
            );
            self.store.apply_index_updates(&heal).await?;
        }

        let corrections = move_to_index(&group.line_items, line_item_id, new_index)?;
        let updates: Vec<IndexUpdate> = corrections
            .iter()
            .map(|c| IndexUpdate::line_item(c.id.clone(), c.new_index))
            .collect();
        self.store.apply_index_updates(&updates).await?;

        let mut siblings = group.line_items;
        apply_corrections(&mut siblings, &corrections);
        siblings.sort_by_key(|li| li.index_in_group);
        Ok(siblings)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cost ranges
    // ═══════════════════════════════════════════════════════════════════════

    /// Low/high price range for an area, ceil'd to whole dollars
    ///
    /// The range is a minimum bound: line items with no selected priced
    /// option contribute zero.
    pub async fn area_cost_range(&self, area_id: &str) -> Result<CostRange> {
        let area = self.area_with_consistent_indices(area_id).await?;
        pricing::area_cost_range(&area)
    }

    /// Low/high price range across all of a project's areas
    pub async fn project_cost_range(&self, project_id: &str) -> Result<CostRange> {
        let mut project = self.store.fetch_project(project_id).await?;
        let mut updates = Vec::new();
        for area in &mut project.areas {
            updates.extend(reconcile_area(area)?);
        }
        if !updates.is_empty() {
            warn!(
                project_id,
                corrections = updates.len(),
                "repairing drifted order indices on project read"
            );
            self.store.apply_index_updates(&updates).await?;
        }
        pricing::project_cost_range(&project)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Creation / deletion
    // ═══════════════════════════════════════════════════════════════════════

    /// Create an empty area inside a project
    pub async fn create_blank_area(&self, project_id: &str, name: &str) -> Result<Area> {
        let area = Area::for_project(Uuid::new_v4().to_string(), project_id, name);
        self.store.insert_area(&area).await?;
        Ok(area)
    }

    /// Create an area inside a project by deep-copying a template
    ///
    /// Every entity in the copied subtree gets a fresh id; order indices,
    /// open states, and option selections are preserved.
    pub async fn duplicate_area_from_template(
        &self,
        template_id: &str,
        project_id: &str,
    ) -> Result<Area> {
        let template = self.store.fetch_template(template_id).await?;
        let area = deep_copy_area(&template.area, project_id);
        self.store.insert_area(&area).await?;
        Ok(area)
    }

    /// Delete an area; storage cascades to its whole subtree
    pub async fn delete_area(&self, area_id: &str) -> Result<()> {
        self.store.delete_area(area_id).await?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Partial updates
    // ═══════════════════════════════════════════════════════════════════════

    pub async fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<()> {
        self.store.update_project(project_id, patch).await?;
        Ok(())
    }

    /// Persist a group's expand/collapse state
    pub async fn update_group(&self, group_id: &str, patch: &GroupPatch) -> Result<()> {
        self.store.update_group(group_id, patch).await?;
        Ok(())
    }

    /// Update line item fields, validating margin and quantity first
    ///
    /// An out-of-range margin is rejected, never clamped: a clamped value
    /// would silently corrupt every price computed from it.
    pub async fn update_line_item(&self, line_item_id: &str, patch: &LineItemPatch) -> Result<()> {
        if let Some(margin) = patch.margin_decimal {
            if !(0.0..1.0).contains(&margin) {
                return Err(EngineError::InvalidMargin(margin));
            }
        }
        if let Some(quantity) = patch.quantity {
            if quantity < 0.0 {
                return Err(EngineError::InvalidQuantity(quantity));
            }
        }
        self.store.update_line_item(line_item_id, patch).await?;
        Ok(())
    }

    pub async fn update_line_item_option(
        &self,
        option_id: &str,
        patch: &LineItemOptionPatch,
    ) -> Result<()> {
        self.store.update_line_item_option(option_id, patch).await?;
        Ok(())
    }

    /// Select a pricing option; storage deselects siblings transactionally
    pub async fn select_option(&self, line_item_id: &str, option_id: &str) -> Result<()> {
        self.store.select_option(line_item_id, option_id).await?;
        Ok(())
    }
}

fn deep_copy_area(source: &Area, project_id: &str) -> Area {
    let area_id = Uuid::new_v4().to_string();
    let mut area = Area {
        id: area_id.clone(),
        project_id: Some(project_id.to_string()),
        template_id: None,
        name: source.name.clone(),
        groups: Vec::with_capacity(source.groups.len()),
    };
    for group in &source.groups {
        let group_id = Uuid::new_v4().to_string();
        let mut group_copy = Group {
            id: group_id.clone(),
            area_id: area_id.clone(),
            category: group.category.clone(),
            index_in_category: group.index_in_category,
            is_open: group.is_open,
            line_items: Vec::with_capacity(group.line_items.len()),
        };
        for item in &group.line_items {
            let item_id = Uuid::new_v4().to_string();
            let mut item_copy = LineItem {
                id: item_id.clone(),
                group_id: group_id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                margin_decimal: item.margin_decimal,
                unit: item.unit.clone(),
                index_in_group: item.index_in_group,
                options: Vec::with_capacity(item.options.len()),
            };
            for option in &item.options {
                let mut option_copy = option.clone();
                option_copy.id = Uuid::new_v4().to_string();
                option_copy.line_item_id = item_id.clone();
                item_copy.options.push(option_copy);
            }
            group_copy.line_items.push(item_copy);
        }
        area.groups.push(group_copy);
    }
    area
}

#[cfg(test)]
mod tests {
    use super::*;
    use costline_storage::{Category, LineItemOption};

    fn group_in(area_id: &str, id: &str, category: &Category, index: i64) -> Group {
        Group::new(id, area_id, category.clone(), index)
    }

    #[test]
    fn test_reconcile_partitions_per_category() {
        let products = Category::new("c1", "Products");
        let labor = Category::new("c2", "Labor");

        let mut area = Area::for_project("a1", "p1", "Kitchen");
        // Products drifted (3, 9); labor already contiguous (0, 1)
        area.groups.push(group_in("a1", "g1", &products, 3));
        area.groups.push(group_in("a1", "g2", &labor, 0));
        area.groups.push(group_in("a1", "g3", &products, 9));
        area.groups.push(group_in("a1", "g4", &labor, 1));

        let updates = reconcile_area(&mut area).unwrap();

        // Only the drifted category produces corrections
        let touched: Vec<&str> = updates.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(touched, vec!["g1", "g3"]);

        let products_indices: Vec<i64> = area
            .groups
            .iter()
            .filter(|g| g.category.id == "c1")
            .filter_map(|g| g.index_in_category)
            .collect();
        assert_eq!(products_indices, vec![0, 1]);
    }

    #[test]
    fn test_reconcile_reindexes_line_items() {
        let mut area = Area::for_project("a1", "p1", "Kitchen");
        let mut group = group_in("a1", "g1", &Category::new("c1", "Products"), 0);
        group.line_items.push(LineItem::new("li1", "g1", "A", 5));
        group.line_items.push(LineItem::new("li2", "g1", "B", 2));
        area.groups.push(group);

        let updates = reconcile_area(&mut area).unwrap();
        assert_eq!(updates.len(), 2);

        let items = &area.groups[0].line_items;
        assert_eq!(items[0].id, "li2");
        assert_eq!(items[0].index_in_group, Some(0));
        assert_eq!(items[1].id, "li1");
        assert_eq!(items[1].index_in_group, Some(1));
    }

    #[test]
    fn test_reconcile_clean_area_is_noop() {
        let mut area = Area::for_project("a1", "p1", "Kitchen");
        let category = Category::new("c1", "Products");
        area.groups.push(group_in("a1", "g1", &category, 0));
        area.groups.push(group_in("a1", "g2", &category, 1));

        let updates = reconcile_area(&mut area).unwrap();
        assert!(updates.is_empty());
    }

    #[test]
    fn test_deep_copy_gets_fresh_ids() {
        let mut source = Area::for_template("ta", "t1", "Standard bath");
        let mut group = group_in("ta", "tg", &Category::new("c1", "Products"), 0);
        let mut item = LineItem::new("tli", "tg", "Vanity", 0);
        item.options.push(
            LineItemOption::new("to", "tli", "stock")
                .with_exact_cost(300.0)
                .selected(),
        );
        group.line_items.push(item);
        source.groups.push(group);

        let copy = deep_copy_area(&source, "p1");

        assert_ne!(copy.id, source.id);
        assert_eq!(copy.project_id.as_deref(), Some("p1"));
        assert!(copy.template_id.is_none());

        let copied_group = &copy.groups[0];
        assert_ne!(copied_group.id, "tg");
        assert_eq!(copied_group.area_id, copy.id);

        let copied_item = &copied_group.line_items[0];
        assert_ne!(copied_item.id, "tli");
        assert_eq!(copied_item.group_id, copied_group.id);

        let copied_option = &copied_item.options[0];
        assert_ne!(copied_option.id, "to");
        assert_eq!(copied_option.line_item_id, copied_item.id);
        // Cost fields and selection survive the copy
        assert_eq!(copied_option.exact_cost_per_unit, Some(300.0));
        assert!(copied_option.is_selected);
    }
}
