/// Options that control which catalog rows are fetched.
#[derive(Debug, Clone)]
pub struct IntrospectOptions {
    pub include_views: bool,
    pub include_procedures: bool,
    /// Restrict extraction to these tables (and views) when set.
    pub tables: Option<Vec<String>>,
}

impl Default for IntrospectOptions {
    fn default() -> Self {
        Self {
            include_views: true,
            include_procedures: true,
            tables: None,
        }
    }
}

impl IntrospectOptions {
    pub fn table_enabled(&self, name: &str) -> bool {
        match &self.tables {
            Some(list) => list.iter().any(|item| item == name),
            None => true,
        }
    }
}
