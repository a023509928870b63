//! Product and category management.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{Category, NewProduct, Product};
use crate::store::{CategoryStore, ProductCatalog};
use crate::unit_of_work::finish;
use crate::{Missing, ServiceError, ServiceResult, UnitOfWork};

pub struct CatalogService<U: UnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> CatalogService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    #[instrument(skip(self))]
    pub async fn create_category(&self, description: &str) -> ServiceResult<Category> {
        let category = Category::new(description.trim());
        category.validate()?;
        let session = self.uow.begin().await?;
        let outcome = insert_category(&session, category).await;
        let category = finish(session, outcome).await?;
        info!(category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: Uuid) -> ServiceResult<Category> {
        let session = self.uow.begin().await?;
        let outcome = load_category(&session, id).await;
        finish(session, outcome).await
    }

    pub async fn list_categories(&self) -> ServiceResult<Vec<Category>> {
        let session = self.uow.begin().await?;
        let outcome = session.list_categories().await.map_err(ServiceError::from);
        finish(session, outcome).await
    }

    /// Replaces the description of category `id`. `category.id` must match `id`.
    #[instrument(skip(self, category))]
    pub async fn update_category(&self, id: Uuid, mut category: Category) -> ServiceResult<Category> {
        if category.id != id {
            warn!(%id, body_id = %category.id, "Category update id mismatch");
            return Err(ServiceError::validation("ID mismatch"));
        }
        category.normalize();
        category.validate()?;
        let session = self.uow.begin().await?;
        let outcome = replace_category(&session, category).await;
        finish(session, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> ServiceResult<()> {
        let session = self.uow.begin().await?;
        let outcome = drop_category(&session, id).await;
        finish(session, outcome).await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    #[instrument(skip(self, new_product), fields(name = %new_product.name))]
    pub async fn create_product(&self, new_product: NewProduct) -> ServiceResult<Product> {
        let product = new_product.into_product();
        product.validate()?;
        let session = self.uow.begin().await?;
        let outcome = store_product(&session, product).await;
        let product = finish(session, outcome).await?;
        info!(product_id = %product.id, price = %product.price, "Product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: Uuid) -> ServiceResult<Product> {
        let session = self.uow.begin().await?;
        let outcome = load_product(&session, id).await;
        finish(session, outcome).await
    }

    pub async fn list_products(&self) -> ServiceResult<Vec<Product>> {
        let session = self.uow.begin().await?;
        let outcome = session.list_products().await.map_err(ServiceError::from);
        finish(session, outcome).await
    }

    pub async fn list_products_by_category(&self, category_id: Uuid) -> ServiceResult<Vec<Product>> {
        let session = self.uow.begin().await?;
        let outcome = session
            .list_products_by_category(category_id)
            .await
            .map_err(ServiceError::from);
        finish(session, outcome).await
    }

    /// Replaces product `id`. Cart lines keep the unit price they were added with.
    #[instrument(skip(self, product))]
    pub async fn update_product(&self, id: Uuid, mut product: Product) -> ServiceResult<Product> {
        if product.id != id {
            warn!(%id, body_id = %product.id, "Product update id mismatch");
            return Err(ServiceError::validation("ID mismatch"));
        }
        product.normalize();
        product.validate()?;
        let session = self.uow.begin().await?;
        let outcome = replace_product(&session, product).await;
        finish(session, outcome).await
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> ServiceResult<()> {
        let session = self.uow.begin().await?;
        let outcome = drop_product(&session, id).await;
        finish(session, outcome).await?;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

async fn insert_category<S: CategoryStore>(session: &S, category: Category) -> ServiceResult<Category> {
    session.save_category(&category).await?;
    Ok(category)
}

async fn load_category<S: CategoryStore>(session: &S, id: Uuid) -> ServiceResult<Category> {
    session
        .find_category(id)
        .await?
        .ok_or_else(|| Missing::Category(id).into())
}

async fn drop_category<S: CategoryStore>(session: &S, id: Uuid) -> ServiceResult<()> {
    if !session.delete_category(id).await? {
        return Err(Missing::Category(id).into());
    }
    Ok(())
}

async fn replace_category<S: CategoryStore>(session: &S, category: Category) -> ServiceResult<Category> {
    if session.find_category(category.id).await?.is_none() {
        return Err(Missing::Category(category.id).into());
    }
    session.save_category(&category).await?;
    info!(category_id = %category.id, "Category updated");
    Ok(category)
}

async fn store_product<S>(session: &S, product: Product) -> ServiceResult<Product>
where
    S: ProductCatalog + CategoryStore,
{
    if let Some(category_id) = product.category_id {
        if session.find_category(category_id).await?.is_none() {
            warn!(%category_id, "Product references unknown category");
            return Err(ServiceError::validation("Specified category does not exist"));
        }
    }
    session.save_product(&product).await?;
    Ok(product)
}

async fn load_product<S: ProductCatalog>(session: &S, id: Uuid) -> ServiceResult<Product> {
    session
        .find_product(id)
        .await?
        .ok_or_else(|| Missing::Product(id).into())
}

async fn drop_product<S: ProductCatalog>(session: &S, id: Uuid) -> ServiceResult<()> {
    if !session.delete_product(id).await? {
        return Err(Missing::Product(id).into());
    }
    Ok(())
}

async fn replace_product<S>(session: &S, product: Product) -> ServiceResult<Product>
where
    S: ProductCatalog + CategoryStore,
{
    if session.find_product(product.id).await?.is_none() {
        return Err(Missing::Product(product.id).into());
    }
    let product = store_product(session, product).await?;
    info!(product_id = %product.id, "Product updated");
    Ok(product)
}
