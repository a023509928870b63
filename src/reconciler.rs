//! Cart state transitions for one user at a time.
//!
//! Every operation reads and writes through a single unit of work session and
//! commits before returning, so a cart created by `add_to_cart` never outlives
//! a failed item write.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{CartItem, CartLine, DEFAULT_QUANTITY};
use crate::store::{CartStore, ProductCatalog};
use crate::unit_of_work::finish;
use crate::{Missing, ServiceError, ServiceResult, UnitOfWork, UserIdentity};

pub struct CartReconciler<U: UnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> CartReconciler<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    /// Lines of the user's cart in the order they were added. A user without
    /// a cart gets an empty list.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn get_cart(&self, user: &UserIdentity) -> ServiceResult<Vec<CartLine>> {
        let session = self.uow.begin().await?;
        let outcome = get_lines(&session, user).await;
        finish(session, outcome).await
    }

    /// Adds one unit of `product_id`, creating the cart on first use.
    ///
    /// A product already in the cart has its quantity incremented and keeps
    /// the unit price captured when it was first added.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn add_to_cart(&self, user: &UserIdentity, product_id: Uuid) -> ServiceResult<CartItem> {
        let session = self.uow.begin().await?;
        let outcome = add_item(&session, user, product_id).await;
        finish(session, outcome).await
    }

    /// Deletes the user's line for `product_id`. The cart is kept even when it
    /// ends up empty.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn remove_from_cart(&self, user: &UserIdentity, product_id: Uuid) -> ServiceResult<()> {
        let session = self.uow.begin().await?;
        let outcome = remove_product(&session, user, product_id).await;
        finish(session, outcome).await
    }

    /// Overwrites the quantity of one of the user's lines. Quantities below 1
    /// are rejected; use `remove_item` to drop a line.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn update_quantity(
        &self,
        user: &UserIdentity,
        item_id: Uuid,
        quantity: i32,
    ) -> ServiceResult<CartItem> {
        if quantity < DEFAULT_QUANTITY {
            warn!(quantity, "Rejected cart quantity below 1");
            return Err(ServiceError::validation(format!(
                "quantity must be at least 1, got {quantity}"
            )));
        }
        let session = self.uow.begin().await?;
        let outcome = set_quantity(&session, user, item_id, quantity).await;
        finish(session, outcome).await
    }

    /// Deletes one of the user's lines by item id.
    #[instrument(skip(self, user), fields(user = %user))]
    pub async fn remove_item(&self, user: &UserIdentity, item_id: Uuid) -> ServiceResult<()> {
        let session = self.uow.begin().await?;
        let outcome = remove_owned_item(&session, user, item_id).await;
        finish(session, outcome).await
    }
}

async fn get_lines<S: CartStore>(session: &S, user: &UserIdentity) -> ServiceResult<Vec<CartLine>> {
    match session.find_cart_by_user(user).await? {
        Some(cart) => Ok(session.list_lines(cart.id).await?),
        None => Ok(Vec::new()),
    }
}

async fn add_item<S>(session: &S, user: &UserIdentity, product_id: Uuid) -> ServiceResult<CartItem>
where
    S: CartStore + ProductCatalog,
{
    let Some(product) = session.find_product(product_id).await? else {
        warn!(%product_id, "Add to cart for unknown product");
        return Err(Missing::Product(product_id).into());
    };

    let cart = match session.find_cart_by_user(user).await? {
        Some(cart) => cart,
        None => {
            let cart = session.create_cart(user).await?;
            info!(cart_id = %cart.id, "Created shopping cart");
            cart
        }
    };

    let item = match session.find_item_for_product(cart.id, product.id).await? {
        Some(mut item) => {
            item.quantity = item
                .quantity
                .checked_add(1)
                .ok_or_else(|| ServiceError::validation("cart quantity overflow"))?;
            item
        }
        None => CartItem::for_product(cart.id, &product),
    };
    session.upsert_item(&item).await?;

    info!(
        cart_id = %cart.id,
        %product_id,
        quantity = item.quantity,
        unit_price = %item.unit_price,
        "Cart item added"
    );
    Ok(item)
}

async fn remove_product<S: CartStore>(
    session: &S,
    user: &UserIdentity,
    product_id: Uuid,
) -> ServiceResult<()> {
    let Some(cart) = session.find_cart_by_user(user).await? else {
        warn!("Remove from cart without a cart");
        return Err(Missing::Cart(user.to_string()).into());
    };
    let Some(item) = session.find_item_for_product(cart.id, product_id).await? else {
        warn!(cart_id = %cart.id, %product_id, "Product not in cart");
        return Err(Missing::ItemNotInCart(product_id).into());
    };
    session.delete_item(item.id).await?;
    info!(cart_id = %cart.id, %product_id, "Cart item removed");
    Ok(())
}

/// The item with `item_id`, provided it sits in `user`'s cart.
async fn find_owned_item<S: CartStore>(
    session: &S,
    user: &UserIdentity,
    item_id: Uuid,
) -> ServiceResult<CartItem> {
    let cart = session.find_cart_by_user(user).await?;
    match (cart, session.find_item(item_id).await?) {
        (Some(cart), Some(item)) if item.cart_id == cart.id => Ok(item),
        _ => {
            warn!(%item_id, "Cart item not found for user");
            Err(Missing::CartItem(item_id).into())
        }
    }
}

async fn set_quantity<S: CartStore>(
    session: &S,
    user: &UserIdentity,
    item_id: Uuid,
    quantity: i32,
) -> ServiceResult<CartItem> {
    let mut item = find_owned_item(session, user, item_id).await?;
    item.quantity = quantity;
    session.upsert_item(&item).await?;
    info!(%item_id, quantity, "Cart item quantity updated");
    Ok(item)
}

async fn remove_owned_item<S: CartStore>(
    session: &S,
    user: &UserIdentity,
    item_id: Uuid,
) -> ServiceResult<()> {
    let item = find_owned_item(session, user, item_id).await?;
    session.delete_item(item.id).await?;
    info!(%item_id, "Cart item removed");
    Ok(())
}
