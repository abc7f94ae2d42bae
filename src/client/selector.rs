//! Checkbox list that binds team resources into a shoot.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::domain::ResourceKind;

/// What one row of the list shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowView {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: Option<String>,
    pub badge: Option<String>,
}

pub type RowRenderer = Box<dyn Fn(&Value) -> RowView + Send + Sync>;

fn field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}

fn title(item: &Value, key: &str) -> String {
    field(item, key).unwrap_or_else(|| "Untitled".to_string())
}

fn availability(item: &Value) -> Option<String> {
    match item.get("available").and_then(Value::as_bool) {
        Some(false) => Some("Unavailable".to_string()),
        _ => None,
    }
}

/// Row layout per resource kind. Adding a kind means registering a renderer.
pub struct RowRenderers {
    renderers: HashMap<ResourceKind, RowRenderer>,
}

impl Default for RowRenderers {
    fn default() -> Self {
        let mut registry = Self {
            renderers: HashMap::new(),
        };
        registry.register(ResourceKind::Personnel, |item| RowView {
            title: title(item, "name"),
            subtitle: field(item, "email").or_else(|| field(item, "phone")),
            image_url: field(item, "avatarUrl"),
            badge: None,
        });
        registry.register(ResourceKind::Equipment, |item| RowView {
            title: title(item, "name"),
            subtitle: field(item, "category"),
            image_url: field(item, "imageUrl"),
            badge: availability(item).or_else(|| {
                field(item, "quantity")
                    .filter(|quantity| quantity != "1")
                    .map(|quantity| format!("x{quantity}"))
            }),
        });
        registry.register(ResourceKind::Props, |item| RowView {
            title: title(item, "name"),
            subtitle: field(item, "description"),
            image_url: field(item, "imageUrl"),
            badge: availability(item),
        });
        registry.register(ResourceKind::Costumes, |item| RowView {
            title: title(item, "characterName"),
            subtitle: field(item, "seriesName"),
            image_url: field(item, "imageUrl"),
            badge: field(item, "completionPercentage").map(|percentage| format!("{percentage}%")),
        });
        registry.register(ResourceKind::Locations, |item| RowView {
            title: title(item, "name"),
            subtitle: field(item, "address"),
            image_url: None,
            badge: None,
        });
        registry
    }
}

impl RowRenderers {
    pub fn register(
        &mut self,
        kind: ResourceKind,
        renderer: impl Fn(&Value) -> RowView + Send + Sync + 'static,
    ) {
        self.renderers.insert(kind, Box::new(renderer));
    }

    pub fn render(&self, kind: ResourceKind, item: &Value) -> RowView {
        match self.renderers.get(&kind) {
            Some(renderer) => renderer(item),
            None => RowView {
                title: title(item, "name"),
                ..RowView::default()
            },
        }
    }
}

/// A rendered row together with its selection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRow {
    pub id: String,
    pub view: RowView,
    pub selected: bool,
    /// Present only when roles are shown and the row is selected.
    pub role: Option<String>,
}

type SelectionChange = Arc<dyn Fn(&[String]) + Send + Sync>;
type RoleChange = Arc<dyn Fn(&str, &str) + Send + Sync>;
type CreateNew = Arc<dyn Fn(ResourceKind) + Send + Sync>;

fn item_id(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

pub struct ResourceSelector {
    kind: ResourceKind,
    items: Vec<Value>,
    selected: Vec<String>,
    single_select: bool,
    show_roles: bool,
    roles: HashMap<String, String>,
    renderers: Arc<RowRenderers>,
    on_selection_change: Option<SelectionChange>,
    on_role_change: Option<RoleChange>,
    on_create_new: Option<CreateNew>,
}

impl ResourceSelector {
    pub fn new(kind: ResourceKind, items: Vec<Value>) -> Self {
        Self {
            kind,
            items,
            selected: Vec::new(),
            single_select: false,
            show_roles: false,
            roles: HashMap::new(),
            renderers: Arc::new(RowRenderers::default()),
            on_selection_change: None,
            on_role_change: None,
            on_create_new: None,
        }
    }

    pub fn single_select(mut self, single: bool) -> Self {
        self.single_select = single;
        if single {
            self.selected.truncate(1);
            self.prune_roles();
        }
        self
    }

    /// Role inputs only exist for personnel.
    pub fn show_roles(mut self, show: bool) -> Self {
        self.show_roles = show && self.kind == ResourceKind::Personnel;
        self
    }

    pub fn with_selected(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.selected = ids.into_iter().filter(|id| self.contains(id)).collect();
        if self.single_select {
            self.selected.truncate(1);
        }
        self
    }

    pub fn with_renderers(mut self, renderers: Arc<RowRenderers>) -> Self {
        self.renderers = renderers;
        self
    }

    pub fn on_selection_change(
        mut self,
        callback: impl Fn(&[String]) + Send + Sync + 'static,
    ) -> Self {
        self.on_selection_change = Some(Arc::new(callback));
        self
    }

    pub fn on_role_change(mut self, callback: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_role_change = Some(Arc::new(callback));
        self
    }

    pub fn on_create_new(
        mut self,
        callback: impl Fn(ResourceKind) + Send + Sync + 'static,
    ) -> Self {
        self.on_create_new = Some(Arc::new(callback));
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|selected| selected == id)
    }

    fn contains(&self, id: &str) -> bool {
        self.items
            .iter()
            .any(|item| item_id(item).as_deref() == Some(id))
    }

    /// Replaces the list, e.g. after the cache refetched it. Selections of
    /// items that disappeared are dropped.
    pub fn set_items(&mut self, items: Vec<Value>) {
        self.items = items;
        let before = self.selected.len();
        let selected = std::mem::take(&mut self.selected);
        self.selected = selected.into_iter().filter(|id| self.contains(id)).collect();
        self.prune_roles();
        if self.selected.len() != before {
            self.notify_selection();
        }
    }

    /// Selecting a selected row removes it; in single-select mode a new
    /// selection replaces the old one.
    pub fn toggle(&mut self, id: &str) {
        if !self.contains(id) {
            tracing::debug!(kind = %self.kind, id, "ignoring selection of unknown item");
            return;
        }
        if let Some(position) = self.selected.iter().position(|selected| selected == id) {
            self.selected.remove(position);
            self.roles.remove(id);
        } else {
            if self.single_select {
                self.selected.clear();
                self.roles.clear();
            }
            self.selected.push(id.to_string());
        }
        self.notify_selection();
    }

    pub fn set_role(&mut self, id: &str, role: &str) {
        if !self.show_roles || !self.is_selected(id) {
            return;
        }
        self.roles.insert(id.to_string(), role.to_string());
        if let Some(callback) = &self.on_role_change {
            callback(id, role);
        }
    }

    pub fn role(&self, id: &str) -> Option<&str> {
        self.roles.get(id).map(String::as_str)
    }

    /// Hands creation to the caller, typically by opening a resource dialog.
    pub fn create_new(&self) {
        match &self.on_create_new {
            Some(callback) => callback(self.kind),
            None => tracing::debug!(kind = %self.kind, "no create handler registered"),
        }
    }

    pub fn rows(&self) -> Vec<SelectorRow> {
        self.items
            .iter()
            .filter_map(|item| {
                let id = item_id(item)?;
                let selected = self.is_selected(&id);
                let role = (self.show_roles && selected)
                    .then(|| self.roles.get(&id).cloned().unwrap_or_default());
                Some(SelectorRow {
                    view: self.renderers.render(self.kind, item),
                    id,
                    selected,
                    role,
                })
            })
            .collect()
    }

    /// Roles are kept only for selected rows.
    fn prune_roles(&mut self) {
        let selected = &self.selected;
        self.roles.retain(|id, _| selected.contains(id));
    }

    fn notify_selection(&self) {
        if let Some(callback) = &self.on_selection_change {
            callback(&self.selected);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn locations() -> Vec<Value> {
        vec![
            json!({ "id": "A", "name": "Old Mill", "address": "1 Mill Lane" }),
            json!({ "id": "B", "name": "Rooftop" }),
        ]
    }

    #[test]
    fn single_select_replaces_then_toggles_off() {
        let mut selector = ResourceSelector::new(ResourceKind::Locations, locations())
            .single_select(true);

        selector.toggle("A");
        assert_eq!(selector.selected(), ["A"]);
        selector.toggle("B");
        assert_eq!(selector.selected(), ["B"]);
        selector.toggle("B");
        assert!(selector.selected().is_empty());
    }

    #[test]
    fn multi_select_appends_and_toggles() {
        let mut selector = ResourceSelector::new(ResourceKind::Locations, locations());
        selector.toggle("A");
        selector.toggle("B");
        assert_eq!(selector.selected(), ["A", "B"]);
        selector.toggle("A");
        assert_eq!(selector.selected(), ["B"]);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let changes = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&changes);
        let mut selector = ResourceSelector::new(ResourceKind::Locations, locations())
            .on_selection_change(move |_| *counter.lock().unwrap() += 1);

        selector.toggle("Z");

        assert!(selector.selected().is_empty());
        assert_eq!(*changes.lock().unwrap(), 0);
    }

    #[test]
    fn create_new_defers_to_caller() {
        let requested = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&requested);
        let selector = ResourceSelector::new(ResourceKind::Props, Vec::new())
            .on_create_new(move |kind| *sink.lock().unwrap() = Some(kind));

        selector.create_new();

        assert_eq!(*requested.lock().unwrap(), Some(ResourceKind::Props));
    }

    #[test]
    fn roles_only_for_selected_personnel() {
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&changes);
        let mut selector = ResourceSelector::new(
            ResourceKind::Personnel,
            vec![json!({ "id": "p-1", "name": "Aki", "email": "aki@example.com" })],
        )
        .show_roles(true)
        .on_role_change(move |id, role| sink.lock().unwrap().push(format!("{id}={role}")));

        selector.set_role("p-1", "Photographer");
        assert!(changes.lock().unwrap().is_empty());

        selector.toggle("p-1");
        selector.set_role("p-1", "Photographer");
        assert_eq!(*changes.lock().unwrap(), vec!["p-1=Photographer"]);

        let rows = selector.rows();
        assert_eq!(rows[0].role.as_deref(), Some("Photographer"));
        assert_eq!(rows[0].view.subtitle.as_deref(), Some("aki@example.com"));
    }

    #[test]
    fn roles_are_never_shown_for_other_kinds() {
        let mut selector = ResourceSelector::new(ResourceKind::Locations, locations())
            .show_roles(true);
        selector.toggle("A");
        assert_eq!(selector.rows()[0].role, None);
    }

    #[test]
    fn renderers_follow_kind() {
        let renderers = RowRenderers::default();
        let costume = renderers.render(
            ResourceKind::Costumes,
            &json!({ "characterName": "Zelda", "seriesName": "BotW", "completionPercentage": 40 }),
        );
        assert_eq!(costume.title, "Zelda");
        assert_eq!(costume.badge.as_deref(), Some("40%"));

        let equipment = renderers.render(
            ResourceKind::Equipment,
            &json!({ "name": "Tripod", "category": "Support", "available": false }),
        );
        assert_eq!(equipment.badge.as_deref(), Some("Unavailable"));
    }

    #[test]
    fn registering_overrides_a_layout() {
        let mut renderers = RowRenderers::default();
        renderers.register(ResourceKind::Locations, |item| RowView {
            title: format!("@ {}", item["name"].as_str().unwrap_or_default()),
            ..RowView::default()
        });
        let selector = ResourceSelector::new(ResourceKind::Locations, locations())
            .with_renderers(Arc::new(renderers));
        assert_eq!(selector.rows()[1].view.title, "@ Rooftop");
    }

    #[test]
    fn refreshed_items_drop_vanished_selections() {
        let mut selector = ResourceSelector::new(ResourceKind::Locations, locations());
        selector.toggle("A");
        selector.toggle("B");
        selector.set_items(vec![json!({ "id": "B", "name": "Rooftop" })]);
        assert_eq!(selector.selected(), ["B"]);
    }

    fn crew() -> Vec<Value> {
        vec![
            json!({ "id": "p-1", "name": "Aki" }),
            json!({ "id": "p-2", "name": "Ren" }),
        ]
    }

    #[test]
    fn replaced_selection_forgets_its_role() {
        let mut selector = ResourceSelector::new(ResourceKind::Personnel, crew())
            .single_select(true)
            .show_roles(true);
        selector.toggle("p-1");
        selector.set_role("p-1", "Photographer");

        selector.toggle("p-2");
        assert_eq!(selector.role("p-1"), None);

        selector.toggle("p-1");
        assert_eq!(selector.rows()[0].role.as_deref(), Some(""));
    }

    #[test]
    fn vanished_items_lose_their_roles() {
        let mut selector =
            ResourceSelector::new(ResourceKind::Personnel, crew()).show_roles(true);
        selector.toggle("p-1");
        selector.toggle("p-2");
        selector.set_role("p-1", "Photographer");
        selector.set_role("p-2", "Assistant");

        selector.set_items(vec![json!({ "id": "p-2", "name": "Ren" })]);
        assert_eq!(selector.role("p-1"), None);
        assert_eq!(selector.role("p-2"), Some("Assistant"));

        selector.set_items(crew());
        selector.toggle("p-1");
        assert_eq!(selector.role("p-1"), None);
    }

    #[test]
    fn single_select_applies_in_any_builder_order() {
        let ids = || vec!["A".to_string(), "B".to_string()];
        let before = ResourceSelector::new(ResourceKind::Locations, locations())
            .single_select(true)
            .with_selected(ids());
        let after = ResourceSelector::new(ResourceKind::Locations, locations())
            .with_selected(ids())
            .single_select(true);
        assert_eq!(before.selected(), ["A"]);
        assert_eq!(after.selected(), ["A"]);
    }
}
