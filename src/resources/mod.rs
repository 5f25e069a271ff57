pub mod category_label_database;
pub mod loading;

use std::sync::Arc;

use self::category_label_database::{CategoryLabelDatabase, InMemoryCategoryLabelDatabase};

pub struct SharedResources {
    pub category_label_database: Arc<dyn CategoryLabelDatabase>,
}

impl Default for SharedResources {
    fn default() -> Self {
        Self {
            category_label_database: Arc::new(InMemoryCategoryLabelDatabase::default()),
        }
    }
}
