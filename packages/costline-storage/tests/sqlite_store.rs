//! Integration tests for the SQLite adapter

#![cfg(feature = "sqlite")]

use costline_storage::{
    Area, AreaTemplate, Category, EstimateStore, Group, GroupPatch, IndexUpdate, LineItem,
    LineItemOption, LineItemOptionPatch, LineItemPatch, OptionTier, Project, ProjectPatch,
    SqliteEstimateStore,
};

fn sample_area(area_id: &str, project_id: &str) -> Area {
    let mut area = Area::for_project(area_id, project_id, "Kitchen");

    let products = Category::new("cat-products", "Products");
    let labor = Category::new("cat-labor", "Labor");

    let mut cabinets_group = Group::new("g1", area_id, products.clone(), 0);
    let mut cabinets = LineItem::new("li1", "g1", "Cabinets", 0);
    cabinets.quantity = 2.0;
    cabinets.unit = Some("each".to_string());
    let mut stock = LineItemOption::new("o1", "li1", "stock")
        .with_exact_cost(1200.0)
        .selected();
    stock.tier = Some(OptionTier::new("tier-designer", "Designer", 2));
    cabinets.options.push(stock);
    cabinets
        .options
        .push(LineItemOption::new("o2", "li1", "custom").with_cost_range(2000.0, 3000.0));
    cabinets_group.line_items.push(cabinets);

    let mut install_group = Group::new("g2", area_id, labor, 0);
    let mut install = LineItem::new("li2", "g2", "Installation", 0);
    install.quantity = 16.0;
    install.unit = Some("hour".to_string());
    install
        .options
        .push(LineItemOption::new("o3", "li2", "standard crew").with_cost_range(40.0, 65.0));
    install_group.line_items.push(install);

    area.groups.push(cabinets_group);
    area.groups.push(install_group);
    area
}

async fn store_with_project() -> SqliteEstimateStore {
    let store = SqliteEstimateStore::open_in_memory().unwrap();
    let mut project = Project::new("p1", "Remodel");
    project.client_ids.push("client-1".to_string());
    project.user_ids.push("user-1".to_string());
    store.insert_project(&project).await.unwrap();
    store.insert_area(&sample_area("a1", "p1")).await.unwrap();
    store
}

#[tokio::test]
async fn area_round_trips_through_sqlite() {
    let store = store_with_project().await;

    let area = store.fetch_area("a1").await.unwrap();
    assert_eq!(area.id, "a1");
    assert_eq!(area.project_id.as_deref(), Some("p1"));
    assert_eq!(area.groups.len(), 2);

    let cabinets_group = area.groups.iter().find(|g| g.id == "g1").unwrap();
    assert_eq!(cabinets_group.category.name, "Products");
    assert_eq!(cabinets_group.line_items.len(), 1);

    let cabinets = &cabinets_group.line_items[0];
    assert_eq!(cabinets.quantity, 2.0);
    assert_eq!(cabinets.options.len(), 2);

    let stock = cabinets.options.iter().find(|o| o.id == "o1").unwrap();
    assert!(stock.is_selected);
    assert_eq!(stock.exact_cost_per_unit, Some(1200.0));
    let tier = stock.tier.as_ref().unwrap();
    assert_eq!(tier.name, "Designer");
    assert_eq!(tier.tier_level, 2);
}

#[tokio::test]
async fn project_fetch_includes_associations_and_areas() {
    let store = store_with_project().await;

    let project = store.fetch_project("p1").await.unwrap();
    assert_eq!(project.client_ids, vec!["client-1".to_string()]);
    assert_eq!(project.user_ids, vec!["user-1".to_string()]);
    assert_eq!(project.areas.len(), 1);
    assert_eq!(project.areas[0].groups.len(), 2);
}

#[tokio::test]
async fn fetch_group_for_line_item_resolves_owner() {
    let store = store_with_project().await;

    let group = store.fetch_group_for_line_item("li2").await.unwrap();
    assert_eq!(group.id, "g2");
    assert_eq!(group.category.id, "cat-labor");

    let err = store.fetch_group_for_line_item("ghost").await.unwrap_err();
    assert_eq!(err.kind, costline_storage::ErrorKind::LineItemNotFound);
}

#[tokio::test]
async fn delete_area_cascades_to_descendants() {
    let store = store_with_project().await;

    store.delete_area("a1").await.unwrap();

    assert!(store.fetch_area("a1").await.is_err());
    assert!(store.fetch_group("g1").await.is_err());
    assert!(store.fetch_group_for_line_item("li1").await.is_err());
}

#[tokio::test]
async fn index_batch_commits_atomically() {
    let store = store_with_project().await;

    store
        .apply_index_updates(&[IndexUpdate::group("g1", 4), IndexUpdate::line_item("li1", 7)])
        .await
        .unwrap();

    let area = store.fetch_area("a1").await.unwrap();
    let g1 = area.groups.iter().find(|g| g.id == "g1").unwrap();
    assert_eq!(g1.index_in_category, Some(4));
    assert_eq!(g1.line_items[0].index_in_group, Some(7));
}

#[tokio::test]
async fn index_batch_rolls_back_on_unknown_id() {
    let store = store_with_project().await;

    let err = store
        .apply_index_updates(&[IndexUpdate::group("g1", 9), IndexUpdate::group("ghost", 0)])
        .await
        .unwrap_err();
    assert_eq!(err.kind, costline_storage::ErrorKind::Transaction);

    // The earlier update in the batch must not have been committed
    let area = store.fetch_area("a1").await.unwrap();
    let g1 = area.groups.iter().find(|g| g.id == "g1").unwrap();
    assert_eq!(g1.index_in_category, Some(0));
}

#[tokio::test]
async fn select_option_leaves_exactly_one_selected() {
    let store = store_with_project().await;

    store.select_option("li1", "o2").await.unwrap();

    let group = store.fetch_group("g1").await.unwrap();
    let selected: Vec<&str> = group.line_items[0]
        .options
        .iter()
        .filter(|o| o.is_selected)
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(selected, vec!["o2"]);

    let err = store.select_option("li1", "o3").await.unwrap_err();
    assert_eq!(err.kind, costline_storage::ErrorKind::OptionNotFound);
}

#[tokio::test]
async fn patches_update_only_named_fields() {
    let store = store_with_project().await;

    store
        .update_line_item(
            "li1",
            &LineItemPatch {
                quantity: Some(3.0),
                margin_decimal: Some(0.25),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .update_group(
            "g1",
            &GroupPatch {
                is_open: Some(false),
            },
        )
        .await
        .unwrap();
    store
        .update_line_item_option(
            "o1",
            &LineItemOptionPatch {
                exact_cost_per_unit: Some(None),
                low_cost_per_unit: Some(Some(900.0)),
                high_cost_per_unit: Some(Some(1500.0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    store
        .update_project(
            "p1",
            &ProjectPatch {
                description: Some(Some("full gut".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let group = store.fetch_group("g1").await.unwrap();
    assert!(!group.is_open);
    let item = &group.line_items[0];
    assert_eq!(item.quantity, 3.0);
    assert_eq!(item.margin_decimal, 0.25);
    assert_eq!(item.name, "Cabinets");
    assert_eq!(item.unit.as_deref(), Some("each"));

    let o1 = item.options.iter().find(|o| o.id == "o1").unwrap();
    assert!(o1.exact_cost_per_unit.is_none());
    assert_eq!(o1.low_cost_per_unit, Some(900.0));
    assert_eq!(o1.high_cost_per_unit, Some(1500.0));

    let project = store.fetch_project("p1").await.unwrap();
    assert_eq!(project.description.as_deref(), Some("full gut"));
}

#[tokio::test]
async fn template_round_trips_with_backing_area() {
    let store = SqliteEstimateStore::open_in_memory().unwrap();

    let mut area = Area::for_template("ta1", "t1", "Standard bath");
    let mut group = Group::new("tg1", "ta1", Category::new("cat-products", "Products"), 0);
    group
        .line_items
        .push(LineItem::new("tli1", "tg1", "Vanity", 0));
    area.groups.push(group);
    let template = AreaTemplate::new("t1", "Standard bath", area);

    store.insert_template(&template).await.unwrap();

    let fetched = store.fetch_template("t1").await.unwrap();
    assert_eq!(fetched.name, "Standard bath");
    assert_eq!(fetched.area.id, "ta1");
    assert_eq!(fetched.area.groups.len(), 1);
}

#[tokio::test]
async fn store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimates.db");

    {
        let store = SqliteEstimateStore::open(&path).unwrap();
        store.insert_project(&Project::new("p1", "Remodel")).await.unwrap();
        store.insert_area(&sample_area("a1", "p1")).await.unwrap();
    }

    let store = SqliteEstimateStore::open(&path).unwrap();
    let area = store.fetch_area("a1").await.unwrap();
    assert_eq!(area.groups.len(), 2);
}
