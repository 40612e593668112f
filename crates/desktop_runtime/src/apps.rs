use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDefinition {
    pub id: String,
    pub name: String,
    pub icon: String,
}

impl AppDefinition {
    pub fn new(id: impl Into<String>, name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
        }
    }
}

const DEFAULT_APPS: [(&str, &str, &str); 10] = [
    ("my_computer", "Desktop", "💻"),
    ("documents", "Documents", "📁"),
    ("notepad", "Notepad", "📝"),
    ("settings_app", "Settings", "⚙️"),
    ("trash_bin", "Trash Bin", "🗑️"),
    ("web_browser_app", "Web", "🌐"),
    ("calculator_app", "Calculator", "🧮"),
    ("travel_app", "Travel", "✈️"),
    ("shopping_app", "Shopping", "🛍️"),
    ("gaming_app", "Games", "🎮"),
];

const DEFAULT_QUICK_LAUNCH: [&str; 4] =
    ["my_computer", "documents", "file_explorer", "web_browser_app"];

pub fn default_apps() -> Vec<AppDefinition> {
    DEFAULT_APPS
        .iter()
        .map(|(id, name, icon)| AppDefinition::new(*id, *name, *icon))
        .collect()
}

pub fn default_quick_launch() -> Vec<String> {
    DEFAULT_QUICK_LAUNCH.iter().map(|id| id.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Desktop entries in display order plus the taskbar quick-launch selection.
pub struct AppCatalog {
    apps: Vec<AppDefinition>,
    quick_launch: Vec<String>,
}

impl Default for AppCatalog {
    fn default() -> Self {
        Self::new(default_apps(), default_quick_launch())
    }
}

impl AppCatalog {
    pub fn new(apps: Vec<AppDefinition>, quick_launch: Vec<String>) -> Self {
        Self { apps, quick_launch }
    }

    pub fn apps(&self) -> &[AppDefinition] {
        &self.apps
    }

    pub fn get(&self, app_id: &str) -> Option<&AppDefinition> {
        self.apps.iter().find(|app| app.id == app_id)
    }

    pub fn entry_ids(&self) -> impl Iterator<Item = &str> {
        self.apps.iter().map(|app| app.id.as_str())
    }

    /// Quick-launch apps in configured order; ids missing from the catalog are skipped.
    pub fn quick_launch_apps(&self) -> Vec<&AppDefinition> {
        self.quick_launch
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_has_unique_ids_and_opens_notepad() {
        let catalog = AppCatalog::default();
        let mut ids: Vec<&str> = catalog.entry_ids().collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        assert_eq!(catalog.get("notepad").map(|app| app.name.as_str()), Some("Notepad"));
    }

    #[test]
    fn quick_launch_skips_unknown_ids() {
        let catalog = AppCatalog::default();
        let quick: Vec<&str> = catalog
            .quick_launch_apps()
            .into_iter()
            .map(|app| app.id.as_str())
            .collect();
        assert_eq!(quick, vec!["my_computer", "documents", "web_browser_app"]);
    }
}
