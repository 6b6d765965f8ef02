use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::ports::ProductCatalog;
use crate::domain::product::Product;
use crate::schema::products;

use super::models::{NewProductRow, ProductRow};

/// Database-backed product catalog.
pub struct DieselProductCatalog {
    pool: DbPool,
}

impl DieselProductCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_domain(row: ProductRow) -> Product {
    Product {
        id: row.id,
        name: row.name,
        price: row.price,
        image_url: row.image_url,
        stock: row.stock,
    }
}

impl ProductCatalog for DieselProductCatalog {
    fn insert(&self, product: &Product) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        diesel::insert_into(products::table)
            .values(&NewProductRow {
                id: product.id,
                name: product.name.clone(),
                price: product.price.clone(),
                image_url: product.image_url.clone(),
                stock: product.stock,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn find(&self, id: Uuid) -> Result<Option<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = products::table
            .filter(products::id.eq(id))
            .select(ProductRow::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(row.map(to_domain))
    }

    fn list(&self) -> Result<Vec<Product>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = products::table
            .select(ProductRow::as_select())
            .order(products::created_at.desc())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(to_domain).collect())
    }

    fn adjust_stock(&self, id: Uuid, delta: i32) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        // Read-modify-write in a transaction so the clamp at zero holds.
        conn.transaction::<_, DomainError, _>(|conn| {
            let stock: i32 = products::table
                .filter(products::id.eq(id))
                .select(products::stock)
                .first(conn)
                .optional()?
                .ok_or(DomainError::NotFound)?;

            diesel::update(products::table.filter(products::id.eq(id)))
                .set(products::stock.eq(stock.saturating_add(delta).max(0)))
                .execute(conn)?;
            Ok(())
        })
    }
}
