//! Order repository: placement, confirmation, cancellation and listing.
//!
//! Every workflow that touches stock runs in one transaction. Variant rows
//! are locked with `FOR UPDATE` in id order before any quantity is read, so
//! concurrent orders on the same variant serialize instead of overselling.
//! Returning early with an error drops the transaction, which rolls it back.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use souk_core::cart::{CartLine, QuoteRequest, VariantKey, normalize_lines};
use souk_core::inventory::{StockDeduction, StockLevel, StockRequest, plan_deductions, restock_plan};
use souk_core::order::{
    Order, OrderError, OrderFilter, OrderItem, OrderSummary, PlaceOrderInput,
};
use souk_core::pagination::{Page, PageRequest};
use souk_core::pricing::{
    OrderTotals, PricedLine, ProductStock, Quote, VariantStock, price_lines,
};
use souk_core::promo::normalize_code;
use souk_core::{
    DeliveryAreaId, OrderChannel, OrderId, OrderItemId, OrderStatus, Percentage, ProductId,
    VariantId,
};

use super::RepositoryError;
use super::promos::find_promo;

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    channel: String,
    status: String,
    customer_name: String,
    phone: String,
    email: Option<String>,
    address: String,
    city: Option<String>,
    note: Option<String>,
    delivery_area_id: Option<i32>,
    promo_code: Option<String>,
    promo_percentage: Option<i32>,
    subtotal: Decimal,
    discount: Decimal,
    delivery_fee: Decimal,
    total: Decimal,
    approved_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn channel(&self) -> Result<OrderChannel, RepositoryError> {
        self.channel
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", self.id)))
    }

    fn status(&self) -> Result<OrderStatus, RepositoryError> {
        self.status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", self.id)))
    }

    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        Ok(Order {
            id: OrderId::new(self.id),
            channel: self.channel()?,
            status: self.status()?,
            customer_name: self.customer_name,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            note: self.note,
            delivery_area_id: self.delivery_area_id.map(DeliveryAreaId::new),
            promo_code: self.promo_code,
            promo_percentage: self.promo_percentage,
            subtotal: self.subtotal,
            discount: self.discount,
            delivery_fee: self.delivery_fee,
            total: self.total,
            approved_at: self.approved_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

const ORDER_COLUMNS: &str = r"
    id, channel, status, customer_name, phone, email, address, city, note,
    delivery_area_id, promo_code, promo_percentage,
    subtotal, discount, delivery_fee, total,
    approved_at, created_at, updated_at
";

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    product_id: Option<i32>,
    name: String,
    code: Option<String>,
    image: Option<String>,
    color: String,
    size: String,
    unit_price: Decimal,
    buying_price: Decimal,
    quantity: i32,
    line_total: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            product_id: row.product_id.map(ProductId::new),
            name: row.name,
            code: row.code,
            image: row.image,
            color: row.color,
            size: row.size,
            unit_price: row.unit_price,
            buying_price: row.buying_price,
            quantity: row.quantity,
            line_total: row.line_total,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    id: i32,
    channel: String,
    status: String,
    customer_name: String,
    phone: String,
    total: Decimal,
    item_count: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderSummaryRow> for OrderSummary {
    type Error = RepositoryError;

    fn try_from(row: OrderSummaryRow) -> Result<Self, Self::Error> {
        let corrupt = |e: souk_core::UnknownVariant| {
            RepositoryError::DataCorruption(format!("order {}: {e}", row.id))
        };
        Ok(Self {
            id: OrderId::new(row.id),
            channel: row.channel.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            customer_name: row.customer_name,
            phone: row.phone,
            total: row.total,
            item_count: row.item_count,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductStockRow {
    id: i32,
    name: String,
    code: Option<String>,
    image: Option<String>,
    price: Decimal,
    discount_price: Option<Decimal>,
    buying_price: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct VariantStockRow {
    id: i32,
    product_id: i32,
    color: String,
    size: String,
    quantity: i32,
}

// =============================================================================
// Transaction helpers
// =============================================================================

const VARIANT_STOCK_QUERY: &str = r"
    SELECT v.id, v.product_id, c.name AS color, v.size, v.quantity
    FROM shop.product_variant v
    JOIN shop.product_color c ON c.id = v.color_id
    WHERE v.product_id = ANY($1)
    ORDER BY v.id
";

/// Load products and lock all of their variant rows, in variant id order.
async fn lock_product_stock(
    conn: &mut PgConnection,
    product_ids: &[i32],
) -> Result<Vec<ProductStock>, sqlx::Error> {
    let variants =
        sqlx::query_as::<_, VariantStockRow>(&format!("{VARIANT_STOCK_QUERY} FOR UPDATE OF v"))
            .bind(product_ids)
            .fetch_all(&mut *conn)
            .await?;
    assemble_product_stock(conn, product_ids, variants).await
}

/// Load products and their variant stock without locking.
async fn load_product_stock(
    conn: &mut PgConnection,
    product_ids: &[i32],
) -> Result<Vec<ProductStock>, sqlx::Error> {
    let variants = sqlx::query_as::<_, VariantStockRow>(VARIANT_STOCK_QUERY)
        .bind(product_ids)
        .fetch_all(&mut *conn)
        .await?;
    assemble_product_stock(conn, product_ids, variants).await
}

async fn assemble_product_stock(
    conn: &mut PgConnection,
    product_ids: &[i32],
    variants: Vec<VariantStockRow>,
) -> Result<Vec<ProductStock>, sqlx::Error> {
    let products = sqlx::query_as::<_, ProductStockRow>(
        r"
        SELECT id, name, code, images[1] AS image, price, discount_price, buying_price
        FROM shop.product
        WHERE id = ANY($1)
        ",
    )
    .bind(product_ids)
    .fetch_all(&mut *conn)
    .await?;

    Ok(products
        .into_iter()
        .map(|p| ProductStock {
            product_id: ProductId::new(p.id),
            variants: variants
                .iter()
                .filter(|v| v.product_id == p.id)
                .map(|v| VariantStock {
                    variant_id: VariantId::new(v.id),
                    color: v.color.clone(),
                    size: v.size.clone(),
                    quantity: v.quantity,
                })
                .collect(),
            name: p.name,
            code: p.code,
            image: p.image,
            price: p.price,
            discount_price: p.discount_price,
            buying_price: p.buying_price,
        })
        .collect())
}

/// Subtract (or with `sign = 1`, add back) planned quantities.
async fn apply_stock_changes(
    conn: &mut PgConnection,
    changes: &[StockDeduction],
    sign: i32,
) -> Result<(), sqlx::Error> {
    for change in changes {
        sqlx::query(
            r"
            UPDATE shop.product_variant
            SET quantity = quantity + $2
            WHERE id = $1
            ",
        )
        .bind(change.variant_id)
        .bind(sign * change.quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_items(
    conn: &mut PgConnection,
    order_id: i32,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderItemRow>(
        r"
        SELECT id, product_id, name, code, image, color, size,
               unit_price, buying_price, quantity, line_total
        FROM shop.order_item
        WHERE order_id = $1
        ORDER BY id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

async fn lock_order(conn: &mut PgConnection, id: OrderId) -> Result<OrderRow, RepositoryError> {
    sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(RepositoryError::NotFound)
}

/// Stock requests for stored items. Items whose product was deleted have no
/// stock to draw from.
fn item_requests(items: &[OrderItem]) -> Result<Vec<StockRequest>, OrderError> {
    items
        .iter()
        .map(|item| {
            let product_id = item.product_id.ok_or_else(|| OrderError::ProductRemoved {
                name: item.name.clone(),
            })?;
            Ok(StockRequest {
                key: VariantKey::new(product_id, &item.color, &item.size),
                quantity: item.quantity,
            })
        })
        .collect()
}

fn line_product_ids(lines: &[CartLine]) -> Vec<i32> {
    let mut ids: Vec<i32> = lines.iter().map(|l| l.product_id.as_i32()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Look up and check an optional promo code, returning the normalized code
/// with its percentage. A blank code counts as no code.
async fn resolve_promo(
    conn: &mut PgConnection,
    raw_code: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<(String, Percentage)>, RepositoryError> {
    let Some(code) = raw_code.map(normalize_code).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    let promo = find_promo(&mut *conn, &code)
        .await?
        .ok_or_else(|| OrderError::UnknownPromoCode(code.clone()))?;
    let percentage = promo.check(now).map_err(OrderError::from)?;
    Ok(Some((code, percentage)))
}

/// Flat fee of an active delivery area, or zero when none was chosen.
async fn delivery_fee(
    conn: &mut PgConnection,
    area_id: Option<DeliveryAreaId>,
) -> Result<Decimal, RepositoryError> {
    let Some(area_id) = area_id else {
        return Ok(Decimal::ZERO);
    };
    let fee = sqlx::query_scalar::<_, Decimal>(
        "SELECT price FROM shop.delivery_area WHERE id = $1 AND is_active",
    )
    .bind(area_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(OrderError::DeliveryAreaUnavailable(area_id))?;
    Ok(fee)
}

fn product_ids_of(requests: &[StockRequest]) -> Vec<i32> {
    let mut ids: Vec<i32> = requests.iter().map(|r| r.key.product_id.as_i32()).collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

fn levels_of(products: &[ProductStock]) -> Vec<StockLevel> {
    products.iter().flat_map(ProductStock::levels).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders and their stock side effects.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Price a cart against the current catalog without reserving stock.
    ///
    /// Lines asking for more than is in stock are flagged in the quote rather
    /// than rejected.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` for an invalid cart, unknown
    /// products or variants, a rejected promo code or an inactive delivery
    /// area.
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn quote(&self, request: &QuoteRequest) -> Result<Quote, RepositoryError> {
        let lines = normalize_lines(&request.items)?;
        let mut conn = self.pool.acquire().await?;

        let promo = resolve_promo(&mut *conn, request.promo_code.as_deref(), Utc::now()).await?;
        let delivery_fee = delivery_fee(&mut *conn, request.delivery_area_id).await?;
        let products = load_product_stock(&mut *conn, &line_product_ids(&lines)).await?;

        let priced = price_lines(&lines, &products)?;
        Ok(Quote::new(priced, promo.map(|(_, p)| p), delivery_fee))
    }

    /// Place an order.
    ///
    /// Admin orders are approved immediately and their stock is deducted in
    /// the same transaction. Storefront orders are stored as `pending` after
    /// checking that stock covers them; stock is taken on confirmation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Rejected` when the cart, customer details,
    /// promo code, delivery area or stock do not allow the order, and
    /// `RepositoryError::Database` if a query fails.
    #[instrument(skip(self, input), fields(lines = input.items.len()))]
    pub async fn place(
        &self,
        channel: OrderChannel,
        input: &PlaceOrderInput,
    ) -> Result<Order, RepositoryError> {
        let customer = input.customer.validate().map_err(OrderError::from)?;
        let lines = normalize_lines(&input.items)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let promo = resolve_promo(&mut *tx, input.promo_code.as_deref(), now).await?;
        let delivery_fee = delivery_fee(&mut *tx, input.delivery_area_id).await?;

        let products = lock_product_stock(&mut *tx, &line_product_ids(&lines)).await?;

        let priced = price_lines(&lines, &products)?;
        let requests: Vec<StockRequest> = priced.iter().map(PricedLine::stock_request).collect();
        let plan = plan_deductions(&requests, &levels_of(&products))?;

        let percentage: Option<Percentage> = promo.as_ref().map(|(_, p)| *p);
        let totals = OrderTotals::compute(&priced, percentage, delivery_fee);
        totals.ensure_storable(&priced)?;

        let status = channel.initial_status();
        if status.holds_stock() {
            apply_stock_changes(&mut *tx, &plan, -1).await?;
        }
        let approved_at = status.holds_stock().then_some(now);

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO shop.customer_order (
                channel, status, customer_name, phone, email, address, city, note,
                delivery_area_id, promo_code, promo_percentage,
                subtotal, discount, delivery_fee, total, approved_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(channel.as_str())
        .bind(status.as_str())
        .bind(&customer.name)
        .bind(customer.phone.as_str())
        .bind(customer.email.as_ref().map(|e| e.as_str()))
        .bind(&customer.address)
        .bind(customer.city.as_deref())
        .bind(customer.note.as_deref())
        .bind(input.delivery_area_id)
        .bind(promo.as_ref().map(|(code, _)| code.as_str()))
        .bind(percentage.map(i32::from))
        .bind(totals.subtotal)
        .bind(totals.discount)
        .bind(totals.delivery_fee)
        .bind(totals.total)
        .bind(approved_at)
        .fetch_one(&mut *tx)
        .await?;

        for line in &priced {
            sqlx::query(
                r"
                INSERT INTO shop.order_item (
                    order_id, product_id, name, code, image, color, size,
                    unit_price, buying_price, quantity, line_total
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ",
            )
            .bind(row.id)
            .bind(line.product_id)
            .bind(&line.name)
            .bind(line.code.as_deref())
            .bind(line.image.as_deref())
            .bind(&line.color)
            .bind(&line.size)
            .bind(line.unit_price)
            .bind(line.buying_price)
            .bind(line.quantity)
            .bind(line.line_total)
            .execute(&mut *tx)
            .await?;
        }

        let items = fetch_items(&mut *tx, row.id).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = row.id,
            %channel,
            %status,
            total = %totals.total,
            "order placed"
        );
        row.into_order(items)
    }

    /// Confirm a pending store order, deducting its stock.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist
    /// - `RepositoryError::Rejected` with `AlreadyConfirmed`, `AlreadyCancelled`,
    ///   `NotAStoreOrder`, `ProductRemoved`, `VariantNotFound` or
    ///   `InsufficientStock`
    #[instrument(skip(self))]
    pub async fn confirm_store_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = lock_order(&mut *tx, id).await?;
        if row.channel()? != OrderChannel::Storefront {
            return Err(OrderError::NotAStoreOrder(id).into());
        }
        match row.status()? {
            OrderStatus::Approved => return Err(OrderError::AlreadyConfirmed(id).into()),
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled(id).into()),
            OrderStatus::Pending => {}
        }

        let items = fetch_items(&mut *tx, row.id).await?;
        let requests = item_requests(&items)?;
        let products = lock_product_stock(&mut *tx, &product_ids_of(&requests)).await?;
        let plan = plan_deductions(&requests, &levels_of(&products))?;
        apply_stock_changes(&mut *tx, &plan, -1).await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.customer_order
            SET status = $2, approved_at = now(), updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(OrderStatus::Approved.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, variants = plan.len(), "store order confirmed");
        row.into_order(items)
    }

    /// Cancel a store order. See [`Self::cancel_order`].
    ///
    /// # Errors
    ///
    /// As [`Self::cancel_order`], plus `NotAStoreOrder` for admin orders.
    pub async fn cancel_store_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.cancel(id, Some(OrderChannel::Storefront)).await
    }

    /// Cancel an order. Approved orders have their stock returned to the
    /// variants that still exist.
    ///
    /// # Errors
    ///
    /// - `RepositoryError::NotFound` if the order does not exist
    /// - `RepositoryError::Rejected` with `AlreadyCancelled`
    pub async fn cancel_order(&self, id: OrderId) -> Result<Order, RepositoryError> {
        self.cancel(id, None).await
    }

    #[instrument(skip(self))]
    async fn cancel(
        &self,
        id: OrderId,
        channel: Option<OrderChannel>,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = lock_order(&mut *tx, id).await?;
        if let Some(expected) = channel
            && row.channel()? != expected
        {
            return Err(OrderError::NotAStoreOrder(id).into());
        }

        let items = fetch_items(&mut *tx, row.id).await?;
        match row.status()? {
            OrderStatus::Cancelled => return Err(OrderError::AlreadyCancelled(id).into()),
            OrderStatus::Approved => {
                let requests: Vec<StockRequest> = items
                    .iter()
                    .filter_map(|item| {
                        item.product_id.map(|product_id| StockRequest {
                            key: VariantKey::new(product_id, &item.color, &item.size),
                            quantity: item.quantity,
                        })
                    })
                    .collect();
                let products = lock_product_stock(&mut *tx, &product_ids_of(&requests)).await?;
                let plan = restock_plan(&requests, &levels_of(&products));
                apply_stock_changes(&mut *tx, &plan, 1).await?;
                tracing::info!(order_id = %id, variants = plan.len(), "stock returned");
            }
            OrderStatus::Pending => {}
        }

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE shop.customer_order
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(OrderStatus::Cancelled.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(order_id = %id, "order cancelled");
        row.into_order(items)
    }

    /// Delete an order and its items. Stock is not returned.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.customer_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let Some(row) = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        else {
            return Ok(None);
        };

        let items = fetch_items(&mut *conn, row.id).await?;
        row.into_order(items).map(Some)
    }

    /// Paginated order listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails, or
    /// `RepositoryError::DataCorruption` for an unreadable status.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: OrderFilter,
        page: PageRequest,
    ) -> Result<Page<OrderSummary>, RepositoryError> {
        let channel = filter.channel.map(OrderChannel::as_str);
        let status = filter.status.map(OrderStatus::as_str);

        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.channel, o.status, o.customer_name, o.phone, o.total,
                   COALESCE(SUM(i.quantity), 0)::BIGINT AS item_count,
                   o.created_at
            FROM shop.customer_order o
            LEFT JOIN shop.order_item i ON i.order_id = o.id
            WHERE ($1::TEXT IS NULL OR o.channel = $1)
              AND ($2::TEXT IS NULL OR o.status = $2)
            GROUP BY o.id
            ORDER BY o.created_at DESC, o.id DESC
            LIMIT $3 OFFSET $4
            ",
        )
        .bind(channel)
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM shop.customer_order
            WHERE ($1::TEXT IS NULL OR channel = $1)
              AND ($2::TEXT IS NULL OR status = $2)
            ",
        )
        .bind(channel)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(OrderSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product_id: Option<i32>, color: &str, quantity: i32) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(1),
            product_id: product_id.map(ProductId::new),
            name: "Linen Shirt".to_owned(),
            code: None,
            image: None,
            color: color.to_owned(),
            size: "M".to_owned(),
            unit_price: Decimal::new(1000, 2),
            buying_price: Decimal::new(500, 2),
            quantity,
            line_total: Decimal::new(1000, 2) * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_item_requests_reject_removed_products() {
        let err = item_requests(&[item(Some(1), "Red", 1), item(None, "Red", 1)]).unwrap_err();
        assert!(matches!(err, OrderError::ProductRemoved { .. }));
    }

    #[test]
    fn test_product_ids_are_sorted_and_unique() {
        let requests = item_requests(&[
            item(Some(3), "Red", 1),
            item(Some(1), "Red", 1),
            item(Some(3), "Blue", 2),
        ]);
        assert_eq!(product_ids_of(&requests.unwrap()), vec![1, 3]);
    }

    #[test]
    fn test_line_product_ids_dedup_across_colors() {
        let line = |product: i32, color: &str| CartLine {
            product_id: ProductId::new(product),
            color: color.to_owned(),
            size: "M".to_owned(),
            quantity: 1,
        };
        let lines = [line(2, "Red"), line(1, "Red"), line(2, "Blue")];
        assert_eq!(line_product_ids(&lines), vec![1, 2]);
    }

    #[test]
    fn test_corrupt_status_is_reported() {
        let row = OrderSummaryRow {
            id: 9,
            channel: "storefront".to_owned(),
            status: "shipped".to_owned(),
            customer_name: "Dana".to_owned(),
            phone: "+15551234567".to_owned(),
            total: Decimal::ZERO,
            item_count: 0,
            created_at: Utc::now(),
        };
        assert!(matches!(
            OrderSummary::try_from(row),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
