//! Seed the catalog from a YAML file.
//!
//! Types and categories that already exist (matched by name, ignoring case)
//! are reused, so a file can be extended and loaded again. Products are
//! always inserted.
//!
//! ```yaml
//! product_types:
//!   - name: Clothing
//!     categories:
//!       - name: Dresses
//!         products:
//!           - name: Linen Dress
//!             code: LD-01
//!             price: "49.90"
//!             colors:
//!               - name: Sand
//!                 sizes:
//!                   - { size: S, quantity: 4 }
//!                   - { size: M, quantity: 6 }
//! delivery_areas:
//!   - name: City center
//!     price: "3.00"
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use tracing::{error, info};

use souk_core::catalog::ProductInput;
use souk_core::records::DeliveryAreaInput;
use souk_db::{CatalogRepository, DeliveryAreaRepository};

use super::{CommandError, connect};

/// Top level of a catalog seed file.
#[derive(Debug, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub product_types: Vec<TypeSeed>,
    #[serde(default)]
    pub delivery_areas: Vec<DeliveryAreaInput>,
}

#[derive(Debug, Deserialize)]
pub struct TypeSeed {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub products: Vec<ProductInput>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub types_created: usize,
    pub categories_created: usize,
    pub products_created: usize,
    pub delivery_areas_created: usize,
}

/// Check the whole file before anything is written.
///
/// Returns one message per problem; an empty list means the file is valid.
#[must_use]
pub fn validate_seed(seed: &CatalogSeed) -> Vec<String> {
    let mut errors = Vec::new();
    let mut type_names = HashSet::new();

    for product_type in &seed.product_types {
        let type_name = product_type.name.trim();
        if type_name.is_empty() {
            errors.push("product type with a blank name".to_string());
        } else if !type_names.insert(type_name.to_lowercase()) {
            errors.push(format!("product type '{type_name}' is listed twice"));
        }

        let mut category_names = HashSet::new();
        for category in &product_type.categories {
            let category_name = category.name.trim();
            if category_name.is_empty() {
                errors.push(format!("{type_name}: category with a blank name"));
            } else if !category_names.insert(category_name.to_lowercase()) {
                errors.push(format!("{type_name}: category '{category_name}' is listed twice"));
            }

            for product in &category.products {
                if let Err(e) = product.clone().validate() {
                    errors.push(format!(
                        "{type_name} / {category_name} / {}: {e}",
                        product.name.trim()
                    ));
                }
            }
        }
    }

    for area in &seed.delivery_areas {
        if let Err(e) = area.clone().validate() {
            errors.push(format!("delivery area '{}': {e}", area.name.trim()));
        }
    }

    errors
}

/// Parse a seed file's contents.
///
/// # Errors
///
/// Returns `CommandError::Yaml` if the contents do not match the seed format.
pub fn parse_seed(content: &str) -> Result<CatalogSeed, CommandError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a catalog file into the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn catalog(file_path: &str) -> Result<SeedSummary, CommandError> {
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(file_path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_string(),
            source,
        })?;
    let seed = parse_seed(&content)?;

    // Validate before connecting so a bad file writes nothing
    let errors = validate_seed(&seed);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    let pool = connect().await?;
    let catalog = CatalogRepository::new(&pool);
    let existing = catalog.tree().await?;
    let mut summary = SeedSummary::default();

    for type_seed in seed.product_types {
        let node = existing
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(type_seed.name.trim()));
        let type_id = match node {
            Some(node) => node.id,
            None => {
                summary.types_created += 1;
                catalog.create_type(&type_seed.name).await?.id
            }
        };

        for category_seed in type_seed.categories {
            let existing_category = node.and_then(|n| {
                n.categories
                    .iter()
                    .find(|c| c.name.eq_ignore_ascii_case(category_seed.name.trim()))
            });
            let category_id = match existing_category {
                Some(category) => category.id,
                None => {
                    summary.categories_created += 1;
                    catalog.create_category(type_id, &category_seed.name).await?.id
                }
            };

            for product in category_seed.products {
                let created = catalog.create_product(category_id, product).await?;
                info!(id = %created.id, name = %created.name, "Product created");
                summary.products_created += 1;
            }
        }
    }

    let areas = DeliveryAreaRepository::new(&pool);
    for area in seed.delivery_areas {
        areas.create(area).await?;
        summary.delivery_areas_created += 1;
    }

    info!("Seeding complete!");
    info!("  Product types created: {}", summary.types_created);
    info!("  Categories created: {}", summary.categories_created);
    info!("  Products created: {}", summary.products_created);
    info!("  Delivery areas created: {}", summary.delivery_areas_created);

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
product_types:
  - name: Clothing
    categories:
      - name: Dresses
        products:
          - name: Linen Dress
            code: LD-01
            price: "49.90"
            discount_price: "39.90"
            colors:
              - name: Sand
                sizes:
                  - { size: S, quantity: 4 }
                  - { size: M, quantity: 6 }
      - name: Scarves
delivery_areas:
  - name: City center
    price: "3.00"
"#;

    #[test]
    fn test_parse_sample() {
        let seed = parse_seed(SAMPLE).unwrap();
        assert_eq!(seed.product_types.len(), 1);
        let clothing = &seed.product_types[0];
        assert_eq!(clothing.categories.len(), 2);
        assert_eq!(clothing.categories[0].products[0].colors[0].sizes.len(), 2);
        assert!(clothing.categories[1].products.is_empty());
        assert!(seed.delivery_areas[0].is_active);
        assert!(validate_seed(&seed).is_empty());
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let seed = parse_seed(
            r#"
product_types:
  - name: Shoes
    categories:
      - name: Boots
        products:
          - name: Hiker
            price: "0"
      - name: boots
  - name: shoes
delivery_areas:
  - name: Suburbs
    price: "-1"
"#,
        )
        .unwrap();

        let errors = validate_seed(&seed);
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("Hiker") && e.contains("price")));
        assert!(errors.iter().any(|e| e.contains("'boots' is listed twice")));
        assert!(errors.iter().any(|e| e.contains("'shoes' is listed twice")));
        assert!(errors.iter().any(|e| e.contains("Suburbs")));
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        assert!(matches!(
            parse_seed("product_types: 12"),
            Err(CommandError::Yaml(_))
        ));
    }
}
