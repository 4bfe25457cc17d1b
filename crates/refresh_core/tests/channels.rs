use pretty_assertions::assert_eq;
use refresh_core::{ChannelSelectionSet, ChannelSummary};

fn channel(id: i64, title: &str, is_active: bool) -> ChannelSummary {
    ChannelSummary {
        id,
        title: title.to_string(),
        username: Some(format!("ch{id}")),
        is_active,
    }
}

fn catalog() -> Vec<ChannelSummary> {
    vec![
        channel(1, "News", true),
        channel(2, "Archive", false),
        channel(3, "Sports", true),
    ]
}

#[test]
fn only_active_channels_are_offered() {
    let set = ChannelSelectionSet::from_catalog(catalog());
    let ids: Vec<i64> = set.available().iter().map(|ch| ch.id).collect();
    assert_eq!(ids, vec![1, 3]);
    assert!(set.is_all_active());
}

#[test]
fn toggle_ignores_inactive_and_unknown_ids() {
    let mut set = ChannelSelectionSet::from_catalog(catalog());
    assert_eq!(set.toggle(&[2, 3, 99]), 1);
    assert_eq!(set.channel_ids().into_iter().collect::<Vec<_>>(), vec![3]);

    assert_eq!(set.toggle(&[3]), 1);
    assert!(set.is_all_active());
}

#[test]
fn select_all_then_none() {
    let mut set = ChannelSelectionSet::from_catalog(catalog());
    set.select_all();
    assert_eq!(set.channel_ids().into_iter().collect::<Vec<_>>(), vec![1, 3]);
    set.deselect_all();
    assert!(set.channel_ids().is_empty());
}

#[test]
fn reloading_catalog_drops_deactivated_selections() {
    let mut set = ChannelSelectionSet::from_catalog(catalog());
    set.select_all();
    set.replace_catalog(vec![channel(1, "News", false), channel(3, "Sports", true)]);
    let titles: Vec<&str> = set.selected().map(|ch| ch.title.as_str()).collect();
    assert_eq!(titles, vec!["Sports"]);
}

#[test]
fn display_name_includes_username() {
    assert_eq!(channel(7, "Weather", true).display_name(), "Weather (@ch7)");
}

#[test]
fn entries_without_active_flag_are_not_offered() {
    let entries: Vec<ChannelSummary> = serde_json::from_value(serde_json::json!([
        {"id": 1, "title": "News", "is_active": true},
        {"id": 2, "title": "Unknown"}
    ]))
    .unwrap();
    assert!(!entries[1].is_active);

    let set = ChannelSelectionSet::from_catalog(entries);
    let ids: Vec<i64> = set.available().iter().map(|ch| ch.id).collect();
    assert_eq!(ids, vec![1]);
}
