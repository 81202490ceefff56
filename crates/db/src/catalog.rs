//! Catalog repository: product types, categories, products and stock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use souk_core::catalog::{
    Category, CategoryNode, ColorVariant, LowStockEntry, Product, ProductFilter, ProductInput,
    MAX_VARIANT_STOCK, ProductSummary, ProductType, ProductTypeNode, SizeStock, StockAdjustment,
};
use souk_core::order::OrderError;
use souk_core::pagination::{Page, PageRequest};
use souk_core::validation::required_text;
use souk_core::{CategoryId, ProductId, ProductTypeId, ValidationError, VariantId};

use super::RepositoryError;

const MAX_NAME_LEN: usize = 120;

/// Shared `WHERE` clause for product listings.
///
/// Binds: `$1` type id, `$2` category id, `$3` search pattern, `$4` in-stock only.
const PRODUCT_FILTER: &str = r"
    WHERE ($1::INTEGER IS NULL OR c.product_type_id = $1)
      AND ($2::INTEGER IS NULL OR p.category_id = $2)
      AND ($3::TEXT IS NULL OR p.name ILIKE $3 OR p.code ILIKE $3)
      AND (NOT $4 OR EXISTS (
          SELECT 1 FROM shop.product_variant sv
          WHERE sv.product_id = p.id AND sv.quantity > 0
      ))
";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ProductTypeRow {
    id: i32,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<ProductTypeRow> for ProductType {
    fn from(row: ProductTypeRow) -> Self {
        Self {
            id: ProductTypeId::new(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    product_type_id: i32,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            product_type_id: ProductTypeId::new(row.product_type_id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CategoryCountRow {
    id: i32,
    product_type_id: i32,
    name: String,
    product_count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    category_id: i32,
    name: String,
    code: Option<String>,
    description: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    buying_price: Decimal,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self, colors: Vec<ColorVariant>) -> Product {
        Product {
            id: ProductId::new(self.id),
            category_id: CategoryId::new(self.category_id),
            name: self.name,
            code: self.code,
            description: self.description,
            price: self.price,
            discount_price: self.discount_price,
            buying_price: self.buying_price,
            images: self.images,
            colors,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSummaryRow {
    id: i32,
    category_id: i32,
    name: String,
    code: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    image: Option<String>,
    total_stock: i64,
}

impl From<ProductSummaryRow> for ProductSummary {
    fn from(row: ProductSummaryRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            category_id: CategoryId::new(row.category_id),
            name: row.name,
            code: row.code,
            price: row.price,
            discount_price: row.discount_price,
            image: row.image,
            total_stock: row.total_stock,
        }
    }
}

/// A color joined with one of its variants (or none, for a color without sizes).
#[derive(Debug, sqlx::FromRow)]
struct ColorVariantRow {
    color_id: i32,
    color: String,
    color_image: Option<String>,
    variant_id: Option<i32>,
    size: Option<String>,
    quantity: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
struct LowStockRow {
    variant_id: i32,
    product_id: i32,
    product_name: String,
    color: String,
    size: String,
    quantity: i32,
}

impl From<LowStockRow> for LowStockEntry {
    fn from(row: LowStockRow) -> Self {
        Self {
            variant_id: VariantId::new(row.variant_id),
            product_id: ProductId::new(row.product_id),
            product_name: row.product_name,
            color: row.color,
            size: row.size,
            quantity: row.quantity,
        }
    }
}

/// Group joined color/variant rows (ordered by color) into the nested shape.
fn assemble_colors(rows: Vec<ColorVariantRow>) -> Vec<ColorVariant> {
    let mut colors: Vec<(i32, ColorVariant)> = Vec::new();
    for row in rows {
        let size = match (row.variant_id, row.size, row.quantity) {
            (Some(id), Some(size), Some(quantity)) => Some(SizeStock {
                variant_id: Some(VariantId::new(id)),
                size,
                quantity,
            }),
            _ => None,
        };
        match colors.last_mut() {
            Some((id, color)) if *id == row.color_id => color.sizes.extend(size),
            _ => colors.push((
                row.color_id,
                ColorVariant {
                    name: row.color,
                    image: row.color_image,
                    sizes: size.into_iter().collect(),
                },
            )),
        }
    }
    colors.into_iter().map(|(_, c)| c).collect()
}

/// Insert the color/size matrix of a product.
async fn insert_colors(
    conn: &mut PgConnection,
    product_id: i32,
    colors: &[ColorVariant],
) -> Result<(), sqlx::Error> {
    for (position, color) in (0_i32..).zip(colors) {
        let color_id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product_color (product_id, name, image, position)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(product_id)
        .bind(&color.name)
        .bind(color.image.as_deref())
        .bind(position)
        .fetch_one(&mut *conn)
        .await?;

        for (size_position, size) in (0_i32..).zip(&color.sizes) {
            sqlx::query(
                r"
                INSERT INTO shop.product_variant (product_id, color_id, size, quantity, position)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(product_id)
            .bind(color_id)
            .bind(&size.size)
            .bind(size.quantity)
            .bind(size_position)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

fn product_write_error(e: sqlx::Error) -> RepositoryError {
    if RepositoryError::is_missing_reference(&e) {
        return RepositoryError::NotFound;
    }
    RepositoryError::on_write(e, "product code already exists")
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the catalog hierarchy and stock.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Types and categories
    // =========================================================================

    /// Product types with their categories and product counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn tree(&self) -> Result<Vec<ProductTypeNode>, RepositoryError> {
        let types = sqlx::query_as::<_, ProductTypeRow>(
            "SELECT id, name, created_at FROM shop.product_type ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;

        let categories = sqlx::query_as::<_, CategoryCountRow>(
            r"
            SELECT c.id, c.product_type_id, c.name, COUNT(p.id) AS product_count
            FROM shop.product_category c
            LEFT JOIN shop.product p ON p.category_id = c.id
            GROUP BY c.id
            ORDER BY c.name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(types
            .into_iter()
            .map(|t| ProductTypeNode {
                id: ProductTypeId::new(t.id),
                categories: categories
                    .iter()
                    .filter(|c| c.product_type_id == t.id)
                    .map(|c| CategoryNode {
                        id: CategoryId::new(c.id),
                        name: c.name.clone(),
                        product_count: c.product_count,
                    })
                    .collect(),
                name: t.name,
            })
            .collect())
    }

    /// Create a product type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` for a blank name,
    /// `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self))]
    pub async fn create_type(&self, name: &str) -> Result<ProductType, RepositoryError> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let row = sqlx::query_as::<_, ProductTypeRow>(
            r"
            INSERT INTO shop.product_type (name)
            VALUES ($1)
            RETURNING id, name, created_at
            ",
        )
        .bind(&name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "product type already exists"))?;

        Ok(row.into())
    }

    /// Rename a product type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist,
    /// `RepositoryError::Conflict` if the name is taken.
    #[instrument(skip(self))]
    pub async fn rename_type(
        &self,
        id: ProductTypeId,
        name: &str,
    ) -> Result<ProductType, RepositoryError> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let row = sqlx::query_as::<_, ProductTypeRow>(
            r"
            UPDATE shop.product_type SET name = $2
            WHERE id = $1
            RETURNING id, name, created_at
            ",
        )
        .bind(id)
        .bind(&name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::on_write(e, "product type already exists"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product type together with its categories and products.
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_type(&self, id: ProductTypeId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_type WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Create a category under a product type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the type does not exist,
    /// `RepositoryError::Conflict` if the type already has a category with
    /// this name.
    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        product_type_id: ProductTypeId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO shop.product_category (product_type_id, name)
            VALUES ($1, $2)
            RETURNING id, product_type_id, name, created_at
            ",
        )
        .bind(product_type_id)
        .bind(&name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if RepositoryError::is_missing_reference(&e) {
                return RepositoryError::NotFound;
            }
            RepositoryError::on_write(e, "category already exists in this product type")
        })?;

        Ok(row.into())
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    #[instrument(skip(self))]
    pub async fn rename_category(
        &self,
        id: CategoryId,
        name: &str,
    ) -> Result<Category, RepositoryError> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE shop.product_category SET name = $2
            WHERE id = $1
            RETURNING id, product_type_id, name, created_at
            ",
        )
        .bind(id)
        .bind(&name)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            RepositoryError::on_write(e, "category already exists in this product type")
        })?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category and its products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product_category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Paginated product listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<Page<ProductSummary>, RepositoryError> {
        let pattern = filter.search_pattern();

        let rows = sqlx::query_as::<_, ProductSummaryRow>(&format!(
            r"
            SELECT p.id, p.category_id, p.name, p.code, p.price, p.discount_price,
                   p.images[1] AS image,
                   COALESCE((
                       SELECT SUM(v.quantity) FROM shop.product_variant v
                       WHERE v.product_id = p.id
                   ), 0)::BIGINT AS total_stock
            FROM shop.product p
            JOIN shop.product_category c ON c.id = p.category_id
            {PRODUCT_FILTER}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5 OFFSET $6
            "
        ))
        .bind(filter.type_id)
        .bind(filter.category_id)
        .bind(pattern.as_deref())
        .bind(filter.in_stock_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            r"
            SELECT COUNT(*)
            FROM shop.product p
            JOIN shop.product_category c ON c.id = p.category_id
            {PRODUCT_FILTER}
            "
        ))
        .bind(filter.type_id)
        .bind(filter.category_id)
        .bind(pattern.as_deref())
        .bind(filter.in_stock_only)
        .fetch_one(self.pool)
        .await?;

        Ok(Page::new(
            rows.into_iter().map(Into::into).collect(),
            total,
            page,
        ))
    }

    /// Get a product with its colors and sizes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, category_id, name, code, description, price, discount_price,
                   buying_price, images, created_at, updated_at
            FROM shop.product
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let colors = sqlx::query_as::<_, ColorVariantRow>(
            r"
            SELECT c.id AS color_id, c.name AS color, c.image AS color_image,
                   v.id AS variant_id, v.size, v.quantity
            FROM shop.product_color c
            LEFT JOIN shop.product_variant v ON v.color_id = c.id
            WHERE c.product_id = $1
            ORDER BY c.position, c.id, v.position, v.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(row.into_product(assemble_colors(colors))))
    }

    /// Create a product in a category, with its stock matrix.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the input fails validation,
    /// `RepositoryError::NotFound` if the category does not exist,
    /// `RepositoryError::Conflict` if the product code is taken.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        category_id: CategoryId,
        input: ProductInput,
    ) -> Result<Product, RepositoryError> {
        let input = input.validate()?;
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO shop.product (
                category_id, name, code, description,
                price, discount_price, buying_price, images
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(category_id)
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.buying_price)
        .bind(&input.images)
        .fetch_one(&mut *tx)
        .await
        .map_err(product_write_error)?;

        insert_colors(&mut *tx, id, &input.colors).await?;
        tx.commit().await?;

        tracing::info!(product_id = id, "product created");
        self.get_product(ProductId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields and its whole stock matrix.
    ///
    /// Colors and sizes not present in `input` are removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Invalid` if the input fails validation,
    /// `RepositoryError::NotFound` if the product does not exist,
    /// `RepositoryError::Conflict` if the product code is taken.
    #[instrument(skip(self, input))]
    pub async fn replace_product(
        &self,
        id: ProductId,
        input: ProductInput,
    ) -> Result<Product, RepositoryError> {
        let input = input.validate()?;
        let mut tx = self.pool.begin().await?;

        let updated: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE shop.product
            SET name = $2, code = $3, description = $4, price = $5,
                discount_price = $6, buying_price = $7, images = $8,
                updated_at = now()
            WHERE id = $1
            RETURNING id
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.code.as_deref())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.discount_price)
        .bind(input.buying_price)
        .bind(&input.images)
        .fetch_optional(&mut *tx)
        .await
        .map_err(product_write_error)?;

        if updated.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM shop.product_color WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_colors(&mut *tx, id.as_i32(), &input.colors).await?;
        tx.commit().await?;

        self.get_product(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product. Order items keep their snapshot with no product id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Add `delta` units (negative to remove) to one variant, returning the
    /// new quantity. Stock never goes below zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` with `VariantNotFound` if the
    /// variant does not exist, `RepositoryError::Invalid` for a zero or
    /// oversized delta, or one that would take stock below zero or above
    /// `MAX_VARIANT_STOCK`.
    #[instrument(skip(self))]
    pub async fn adjust_stock(
        &self,
        product_id: ProductId,
        adjustment: &StockAdjustment,
    ) -> Result<i32, RepositoryError> {
        adjustment.validate()?;
        let color = adjustment.color.trim();
        let size = adjustment.size.trim();

        let updated: Option<i32> = sqlx::query_scalar(
            r"
            UPDATE shop.product_variant v
            SET quantity = v.quantity + $4
            FROM shop.product_color c
            WHERE c.id = v.color_id
              AND v.product_id = $1 AND lower(c.name) = lower($2) AND lower(v.size) = lower($3)
              AND v.quantity + $4 BETWEEN 0 AND $5
            RETURNING v.quantity
            ",
        )
        .bind(product_id)
        .bind(color)
        .bind(size)
        .bind(adjustment.delta)
        .bind(MAX_VARIANT_STOCK)
        .fetch_optional(self.pool)
        .await?;

        if let Some(quantity) = updated {
            tracing::info!(%product_id, color, size, delta = adjustment.delta, quantity, "stock adjusted");
            return Ok(quantity);
        }

        let current: Option<i32> = sqlx::query_scalar(
            r"
            SELECT v.quantity
            FROM shop.product_variant v
            JOIN shop.product_color c ON c.id = v.color_id
            WHERE v.product_id = $1 AND lower(c.name) = lower($2) AND lower(v.size) = lower($3)
            ",
        )
        .bind(product_id)
        .bind(color)
        .bind(size)
        .fetch_optional(self.pool)
        .await?;

        match current {
            None => Err(OrderError::VariantNotFound {
                product_id,
                color: color.to_owned(),
                size: size.to_owned(),
            }
            .into()),
            Some(quantity) if adjustment.delta < 0 => Err(ValidationError::new(
                "delta",
                format!(
                    "only {quantity} in stock, cannot remove {}",
                    adjustment.delta.unsigned_abs()
                ),
            )
            .into()),
            Some(quantity) => Err(ValidationError::new(
                "delta",
                format!("{quantity} in stock, cannot exceed {MAX_VARIANT_STOCK}"),
            )
            .into()),
        }
    }

    /// Variants with `quantity <= threshold`, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<LowStockEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, LowStockRow>(
            r"
            SELECT v.id AS variant_id, v.product_id, p.name AS product_name,
                   c.name AS color, v.size, v.quantity
            FROM shop.product_variant v
            JOIN shop.product_color c ON c.id = v.color_id
            JOIN shop.product p ON p.id = v.product_id
            WHERE v.quantity <= $1
            ORDER BY v.quantity, p.name, c.name, v.size
            ",
        )
        .bind(threshold)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(color_id: i32, color: &str, variant: Option<(i32, &str, i32)>) -> ColorVariantRow {
        ColorVariantRow {
            color_id,
            color: color.to_owned(),
            color_image: None,
            variant_id: variant.map(|v| v.0),
            size: variant.map(|v| v.1.to_owned()),
            quantity: variant.map(|v| v.2),
        }
    }

    #[test]
    fn test_assemble_colors_groups_by_color() {
        let colors = assemble_colors(vec![
            row(1, "Red", Some((10, "S", 2))),
            row(1, "Red", Some((11, "M", 0))),
            row(2, "Blue", None),
            row(3, "Green", Some((12, "L", 5))),
        ]);

        assert_eq!(colors.len(), 3);
        assert_eq!(colors[0].name, "Red");
        assert_eq!(colors[0].sizes.len(), 2);
        assert_eq!(colors[0].sizes[1].variant_id, Some(VariantId::new(11)));
        assert!(colors[1].sizes.is_empty());
        assert_eq!(colors[2].sizes[0].quantity, 5);
    }
}
