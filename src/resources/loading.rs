use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use failure::ResultExt;
use log::info;
use serde::Deserialize;

use crate::errors::*;
use crate::resources::category_label_database::{
    CategoryLabelDatabase, InMemoryCategoryLabelDatabase,
};
use crate::resources::SharedResources;

#[derive(Debug, Deserialize, Clone)]
struct ResourcesMetadata {
    category_label_database: Option<String>,
}

/// Loads the resources described by the `metadata.json` file of `resources_dir`
pub fn load_shared_resources<P: AsRef<Path>>(resources_dir: P) -> Result<Arc<SharedResources>> {
    let metadata_file_path = resources_dir.as_ref().join("metadata.json");
    let metadata_file = File::open(&metadata_file_path).with_context(|_| {
        SluError::ModelLoad(metadata_file_path.to_string_lossy().to_string())
    })?;
    let metadata: ResourcesMetadata =
        serde_json::from_reader(metadata_file).with_context(|_| {
            format!(
                "Cannot deserialize resources metadata file '{:?}'",
                metadata_file_path
            )
        })?;
    let category_label_database = load_category_label_database(&resources_dir, &metadata)?;
    Ok(Arc::new(SharedResources {
        category_label_database,
    }))
}

fn load_category_label_database<P: AsRef<Path>>(
    resources_dir: &P,
    metadata: &ResourcesMetadata,
) -> Result<Arc<dyn CategoryLabelDatabase>> {
    if let Some(database_name) = metadata.category_label_database.as_ref() {
        let database_path = resources_dir
            .as_ref()
            .join(database_name)
            .with_extension("json");
        info!("Loading category label database ({:?}) ...", database_path);
        let file = File::open(&database_path).with_context(|_| {
            format!("Cannot open category label database file {:?}", database_path)
        })?;
        let database = InMemoryCategoryLabelDatabase::from_reader(file).with_context(|_| {
            format!("Cannot read category label database file {:?}", database_path)
        })?;
        info!(
            "Category label database loaded ({} category types)",
            database.category_types().len()
        );
        Ok(Arc::new(database))
    } else {
        info!("No category label database in resources, using an empty one");
        Ok(Arc::new(InMemoryCategoryLabelDatabase::default()))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn load_shared_resources_works() {
        // Given
        let resources_dir = tempfile::tempdir().unwrap();
        fs::write(
            resources_dir.path().join("metadata.json"),
            r#"{"category_label_database": "database"}"#,
        )
        .unwrap();
        fs::write(
            resources_dir.path().join("database.json"),
            r#"{"task": {"weather": ["pocasi"]}, "time": {"now": ["hned"]}}"#,
        )
        .unwrap();

        // When
        let resources = load_shared_resources(resources_dir.path()).unwrap();

        // Then
        assert_eq!(
            vec!["task", "time"],
            resources.category_label_database.category_types()
        );
    }

    #[test]
    fn load_shared_resources_without_database_works() {
        // Given
        let resources_dir = tempfile::tempdir().unwrap();
        fs::write(resources_dir.path().join("metadata.json"), "{}").unwrap();

        // When
        let resources = load_shared_resources(resources_dir.path()).unwrap();

        // Then
        assert!(resources.category_label_database.category_types().is_empty());
    }

    #[test]
    fn load_shared_resources_fails_without_metadata() {
        // Given
        let resources_dir = tempfile::tempdir().unwrap();

        // When
        let result = load_shared_resources(resources_dir.path());

        // Then
        assert!(result.is_err());
    }
}
