//! JSON HTTP surface over [`Services`].

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::{Error, Result};
use crate::models::{
    AboutContent, Category, ContactSettings, ContactUpdate, HomepageContent, LegalContent,
    Listing, ListingDraft, NewsFeed, Order, RevenueTotals, Review, StaffMember,
    LivestockPageHeader,
};
use crate::services::{
    Actor, Fulfillment, NewOrder, PlacedOrder, Receipt, Services, StockLevel, WalkInSale,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const AUTH_PROVIDER_HEADER: &str = "x-auth-provider";
pub const USER_NAME_HEADER: &str = "x-user-name";

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl Error {
    fn status(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            Error::InsufficientStock { .. } | Error::Conflict(_) => StatusCode::CONFLICT,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Identity asserted by the fronting identity provider; absent headers mean anonymous.
///
/// The headers are trusted as given, so anyone who can reach this service
/// directly can claim any uid, the owner's included. Only expose it behind the
/// proxy that authenticates callers and overwrites these headers.
pub struct Identity(pub Option<Actor>);

impl Identity {
    fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let actor = header(USER_ID_HEADER).map(|uid| {
            let actor = Actor::new(uid, header(USER_EMAIL_HEADER), header(AUTH_PROVIDER_HEADER).unwrap_or_default());
            match header(USER_NAME_HEADER) {
                Some(name) => actor.with_display_name(name),
                None => actor,
            }
        });
        Identity(actor)
    }

    fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> std::result::Result<Self, Self::Rejection> {
        Ok(Identity::from_headers(&parts.headers))
    }
}

pub fn router(services: Services) -> Router {
    Router::new()
        .route("/api/news", get(news_handler))
        .route("/api/livestock", get(search_handler).post(create_listing_handler))
        .route("/api/livestock/featured", get(featured_handler))
        .route(
            "/api/livestock/{id}",
            get(get_listing_handler).put(update_listing_handler).delete(delete_listing_handler),
        )
        .route("/api/livestock/{id}/featured", post(toggle_featured_handler))
        .route("/api/stock", get(stock_handler))
        .route("/api/categories", get(categories_handler).post(create_category_handler))
        .route("/api/categories/defaults", post(init_defaults_handler))
        .route("/api/categories/restock", post(restock_handler))
        .route("/api/categories/{id}/adjust", post(adjust_handler))
        .route("/api/categories/{id}", delete(delete_category_handler))
        .route("/api/sales/walk-in", post(walk_in_handler))
        .route("/api/orders", get(list_orders_handler).post(place_order_handler))
        .route("/api/orders/{id}", delete(delete_order_handler))
        .route("/api/orders/{id}/deliver", post(deliver_handler))
        .route("/api/receipts/{id}", get(receipt_handler))
        .route("/api/revenue", get(revenue_handler))
        .route("/api/revenue/reset", post(reset_revenue_handler))
        .route("/api/staff", get(list_staff_handler).post(add_staff_handler))
        .route("/api/staff/{uid}", delete(remove_staff_handler))
        .route("/api/reviews", get(list_reviews_handler).post(submit_review_handler))
        .route("/api/reviews/{id}", delete(delete_review_handler))
        .route("/api/content/homepage", get(homepage_handler).put(save_homepage_handler))
        .route("/api/content/about", get(about_handler).put(save_about_handler))
        .route("/api/content/livestock-page", get(livestock_page_handler).put(save_livestock_page_handler))
        .route("/api/content/contact", get(contact_handler).patch(update_contact_handler))
        .route("/api/content/legal", get(legal_handler))
        .route("/api/content/legal/terms", put(update_terms_handler))
        .route("/api/content/legal/privacy", put(update_privacy_handler))
        .with_state(services)
}

async fn news_handler(State(s): State<Services>) -> Response {
    match s.news.headlines(Utc::now()).await {
        Ok(feed) => Json::<NewsFeed>(feed).into_response(),
        Err(e) => {
            warn!(error = %e, "News route failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: "Failed to fetch news".to_string() }),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    search: String,
}

async fn search_handler(State(s): State<Services>, Query(p): Query<SearchParams>) -> Json<Vec<Listing>> {
    Json(s.catalog.search(&p.search).await)
}

async fn featured_handler(State(s): State<Services>) -> Json<Vec<Listing>> {
    Json(s.catalog.featured().await)
}

async fn get_listing_handler(State(s): State<Services>, Path(id): Path<String>) -> Result<Json<Listing>> {
    Ok(Json(s.catalog.get(&id).await?))
}

async fn create_listing_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(draft): Json<ListingDraft>,
) -> Result<(StatusCode, Json<Listing>)> {
    let listing = s.catalog.save_listing(identity.actor(), draft, None, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

async fn update_listing_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
    Json(draft): Json<ListingDraft>,
) -> Result<Json<Listing>> {
    Ok(Json(s.catalog.save_listing(identity.actor(), draft, Some(&id), Utc::now()).await?))
}

async fn delete_listing_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Listing>> {
    Ok(Json(s.catalog.delete_listing(identity.actor(), &id).await?))
}

async fn toggle_featured_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Listing>> {
    Ok(Json(s.catalog.toggle_featured(identity.actor(), &id, Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
struct StockParams {
    details: String,
}

async fn stock_handler(State(s): State<Services>, Query(p): Query<StockParams>) -> Result<Json<StockLevel>> {
    s.inventory
        .stock_for(&p.details)
        .await
        .map(Json)
        .ok_or_else(|| Error::UnknownCategory(p.details))
}

async fn categories_handler(State(s): State<Services>) -> Json<Vec<Category>> {
    Json(s.inventory.list().await)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryForm {
    name: String,
    #[serde(default)]
    unit_price: i64,
    #[serde(default)]
    quantity: i64,
}

async fn create_category_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = s
        .inventory
        .create_category(identity.actor(), &form.name, form.unit_price, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn init_defaults_handler(State(s): State<Services>, identity: Identity) -> Result<Json<Vec<Category>>> {
    Ok(Json(s.inventory.initialize_defaults(identity.actor(), Utc::now()).await?))
}

async fn restock_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>> {
    let category = s
        .inventory
        .restock(identity.actor(), &form.name, form.unit_price, form.quantity, Utc::now())
        .await?;
    Ok(Json(category))
}

#[derive(Debug, Deserialize)]
struct AdjustForm {
    delta: i64,
}

async fn adjust_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
    Json(form): Json<AdjustForm>,
) -> Result<Json<Category>> {
    Ok(Json(s.inventory.adjust(identity.actor(), &id, form.delta, Utc::now()).await?))
}

async fn delete_category_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Category>> {
    Ok(Json(s.inventory.delete_category(identity.actor(), &id).await?))
}

async fn walk_in_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(sale): Json<WalkInSale>,
) -> Result<(StatusCode, Json<Order>)> {
    let order = s.inventory.walk_in_sale(identity.actor(), sale, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn place_order_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<NewOrder>,
) -> Result<(StatusCode, Json<PlacedOrder>)> {
    let placed = s.orders.place_order(identity.actor(), form, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

async fn list_orders_handler(State(s): State<Services>, identity: Identity) -> Result<Json<Vec<Order>>> {
    Ok(Json(s.orders.list(identity.actor()).await?))
}

async fn deliver_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Fulfillment>> {
    Ok(Json(s.orders.mark_delivered(identity.actor(), &id, Utc::now()).await?))
}

async fn delete_order_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Order>> {
    Ok(Json(s.orders.delete_order(identity.actor(), &id, Utc::now()).await?))
}

async fn receipt_handler(State(s): State<Services>, Path(id): Path<String>) -> Result<Json<Receipt>> {
    Ok(Json(s.orders.receipt(&id, Utc::now()).await?))
}

async fn revenue_handler(State(s): State<Services>, identity: Identity) -> Result<Json<RevenueTotals>> {
    Ok(Json(s.revenue.snapshot(identity.actor(), Utc::now()).await?))
}

async fn reset_revenue_handler(State(s): State<Services>, identity: Identity) -> Result<Json<RevenueTotals>> {
    Ok(Json(s.revenue.reset(identity.actor(), Utc::now()).await?))
}

#[derive(Debug, Deserialize)]
struct StaffForm {
    name: String,
    email: String,
    #[serde(default)]
    uid: Option<String>,
}

async fn list_staff_handler(State(s): State<Services>, identity: Identity) -> Result<Json<Vec<StaffMember>>> {
    Ok(Json(s.staff.list(identity.actor()).await?))
}

async fn add_staff_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<StaffForm>,
) -> Result<(StatusCode, Json<StaffMember>)> {
    let member = s
        .staff
        .add_staff(identity.actor(), &form.name, &form.email, form.uid.as_deref(), Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn remove_staff_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(uid): Path<String>,
) -> Result<Json<StaffMember>> {
    Ok(Json(s.staff.remove_staff(identity.actor(), &uid).await?))
}

#[derive(Debug, Deserialize)]
struct ReviewForm {
    rating: u8,
    comment: String,
}

async fn list_reviews_handler(State(s): State<Services>) -> Json<Vec<Review>> {
    Json(s.reviews.list().await)
}

async fn submit_review_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    let review = s
        .reviews
        .submit(identity.actor(), form.rating, &form.comment, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(review)))
}

async fn delete_review_handler(
    State(s): State<Services>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Review>> {
    Ok(Json(s.reviews.delete(identity.actor(), &id).await?))
}

async fn homepage_handler(State(s): State<Services>) -> Json<HomepageContent> {
    Json(s.content.homepage().await)
}

async fn save_homepage_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(content): Json<HomepageContent>,
) -> Result<Json<HomepageContent>> {
    Ok(Json(s.content.save_homepage(identity.actor(), content).await?))
}

async fn about_handler(State(s): State<Services>) -> Json<AboutContent> {
    Json(s.content.about().await)
}

async fn save_about_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(content): Json<AboutContent>,
) -> Result<Json<AboutContent>> {
    Ok(Json(s.content.save_about(identity.actor(), content).await?))
}

async fn livestock_page_handler(State(s): State<Services>) -> Json<LivestockPageHeader> {
    Json(s.content.livestock_header().await)
}

async fn save_livestock_page_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(header): Json<LivestockPageHeader>,
) -> Result<Json<LivestockPageHeader>> {
    Ok(Json(s.content.save_livestock_header(identity.actor(), header).await?))
}

async fn contact_handler(State(s): State<Services>) -> Json<ContactSettings> {
    Json(s.content.contact().await)
}

async fn update_contact_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(update): Json<ContactUpdate>,
) -> Result<Json<ContactSettings>> {
    Ok(Json(s.content.update_contact(identity.actor(), update, Utc::now()).await?))
}

async fn legal_handler(State(s): State<Services>) -> Json<LegalContent> {
    Json(s.content.legal().await)
}

#[derive(Debug, Deserialize)]
struct LegalForm {
    text: String,
}

async fn update_terms_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<LegalForm>,
) -> Result<Json<LegalContent>> {
    Ok(Json(s.content.update_terms(identity.actor(), form.text, Utc::now()).await?))
}

async fn update_privacy_handler(
    State(s): State<Services>,
    identity: Identity,
    Json(form): Json<LegalForm>,
) -> Result<Json<LegalContent>> {
    Ok(Json(s.content.update_privacy(identity.actor(), form.text, Utc::now()).await?))
}
