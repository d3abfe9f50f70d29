//! Product catalog maintenance.
//!
//! Reads are open to everyone; writes need `MANAGE_PRODUCTS`.

use chrono::Utc;
use emporium_core::validation::{validate_price_cents, validate_product_name, validate_rating};
use emporium_core::{Actor, CoreError, NewProductDto, Product, Right, UpdateProductDto};
use tracing::info;

use super::conflict_on_duplicate;
use crate::error::ServiceResult;
use crate::pool::Database;
use crate::repository::ProductRepository;

#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    pub async fn create_product(&self, actor: &Actor<'_>, dto: NewProductDto) -> ServiceResult<Product> {
        actor.authorize(Right::MANAGE_PRODUCTS)?;

        let name = dto.name.trim().to_string();
        validate_product_name(&name)?;
        validate_price_cents(dto.price.cents())?;
        if let Some(rating) = dto.rating {
            validate_rating(rating)?;
        }

        let mut product = Product::new(name, dto.price, Utc::now());
        product.rating = dto.rating;
        product.created_by = Some(actor.user_id().to_string());

        let mut tx = self.db.begin_write().await?;
        if ProductRepository::new(&mut tx)
            .find_by_name(&product.name, None)
            .await?
            .is_some()
        {
            return Err(CoreError::conflict("Product", "name", product.name).into());
        }
        ProductRepository::new(&mut tx)
            .insert(&product)
            .await
            .map_err(|e| conflict_on_duplicate(e, "Product", "name", &product.name))?;
        tx.commit().await?;

        info!(product_id = %product.id, name = %product.name, price = %product.price, "Product created");
        Ok(product)
    }

    /// Applies the fields present in `dto`. Inactive products can be edited
    /// and reactivated.
    pub async fn update_product(
        &self,
        actor: &Actor<'_>,
        id: &str,
        dto: UpdateProductDto,
    ) -> ServiceResult<Product> {
        actor.authorize(Right::MANAGE_PRODUCTS)?;

        let name = dto.name.as_deref().map(str::trim).map(str::to_string);
        if let Some(name) = &name {
            validate_product_name(name)?;
        }
        if let Some(price) = dto.price {
            validate_price_cents(price.cents())?;
        }
        if let Some(rating) = dto.rating {
            validate_rating(rating)?;
        }

        let mut tx = self.db.begin_write().await?;
        let mut product = ProductRepository::new(&mut tx)
            .find(id, false)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?;

        if let Some(name) = name {
            if ProductRepository::new(&mut tx)
                .find_by_name(&name, Some(id))
                .await?
                .is_some()
            {
                return Err(CoreError::conflict("Product", "name", name).into());
            }
            product.name = name;
        }
        if let Some(price) = dto.price {
            product.price = price;
        }
        if dto.rating.is_some() {
            product.rating = dto.rating;
        }
        if let Some(status) = dto.status {
            product.status = status;
        }
        product.updated_by = Some(actor.user_id().to_string());
        product.updated_on = Utc::now();

        ProductRepository::new(&mut tx)
            .update(&product)
            .await
            .map_err(|e| conflict_on_duplicate(e, "Product", "name", &product.name))?;
        tx.commit().await?;

        info!(product_id = %product.id, "Product updated");
        Ok(product)
    }

    /// Soft delete.
    pub async fn delete_product(&self, actor: &Actor<'_>, id: &str) -> ServiceResult<()> {
        actor.authorize(Right::MANAGE_PRODUCTS)?;

        let mut tx = self.db.begin_write().await?;
        let deactivated = ProductRepository::new(&mut tx)
            .deactivate(id, actor.user_id(), Utc::now())
            .await?;
        if !deactivated {
            return Err(CoreError::not_found("Product", id).into());
        }
        tx.commit().await?;

        info!(product_id = %id, "Product deactivated");
        Ok(())
    }

    /// An active product.
    pub async fn get_product(&self, id: &str) -> ServiceResult<Product> {
        let mut conn = self.db.acquire().await?;
        let product = ProductRepository::new(&mut conn)
            .find(id, true)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?;
        Ok(product)
    }

    pub async fn list_products(&self, only_active: bool) -> ServiceResult<Vec<Product>> {
        let mut conn = self.db.acquire().await?;
        Ok(ProductRepository::new(&mut conn).list(only_active).await?)
    }
}
