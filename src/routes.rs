//! HTTP front door. Every handler answers with a status and an
//! [`ApiResponse`] envelope; entities are returned in presented form.

use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catch, catchers, delete, get, options, post, put, routes};
use rocket::{Build, Request, Response, Rocket, State};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{MarketError, Result};
use crate::marketplace::Marketplace;
use crate::models::identity::Presented;
use crate::models::{Entity, EntityKind, Item, Listing, ListingInquiry, User, UserReport};

pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "Content-Type"));
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T> {
    pub message: String,
    pub result: Option<T>,
}

type Reply<T> = (Status, Json<ApiResponse<T>>);

#[derive(Deserialize, Debug)]
pub struct NewUser {
    #[serde(rename = "discordID")]
    pub discord_id: i64,
}

#[derive(Deserialize, Debug, Default)]
pub struct BanRequest {
    pub note: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct AdminRequest {
    pub admin: bool,
}

#[derive(Deserialize, Debug)]
pub struct NewListing {
    pub item: String,
    pub user: String,
    pub price: i64,
}

#[derive(Deserialize, Debug)]
pub struct NewInquiry {
    pub listing: String,
    pub user: String,
    pub note: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct NewReport {
    pub reporter: String,
    pub scumbag: String,
    pub note: String,
}

pub fn status_of(err: &MarketError) -> Status {
    match err {
        MarketError::InvalidArgument(_) => Status::BadRequest,
        MarketError::NotFound { .. } => Status::NotFound,
        MarketError::Conflict(_) => Status::Conflict,
        MarketError::InvalidState(_) => Status::UnprocessableEntity,
        MarketError::Timeout { .. } => Status::GatewayTimeout,
        _ => Status::InternalServerError,
    }
}

fn reply<T>(success: Status, outcome: Result<T>) -> Reply<T> {
    match outcome {
        Ok(result) => (
            success,
            Json(ApiResponse {
                message: format!("{}: {}", success.code, success.reason_lossy()),
                result: Some(result),
            }),
        ),
        Err(err) => {
            let status = status_of(&err);
            if status == Status::InternalServerError {
                error!(error = %err, "request failed");
            }
            (
                status,
                Json(ApiResponse {
                    message: format!("{}: {}", status.code, err),
                    result: None,
                }),
            )
        }
    }
}

fn presented<T: Entity>(outcome: Result<T>) -> Result<Presented<T>> {
    outcome.map(Presented::new)
}

fn expand_fields(expand: Option<&str>) -> Vec<&str> {
    expand
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

/// An entity by id, with the listed relationship fields resolved.
async fn expanded<T: Entity>(
    market: &Marketplace,
    kind: EntityKind,
    id: &str,
    fetch: impl std::future::Future<Output = Result<T>>,
    expand: Option<&str>,
) -> Result<Value> {
    let fields = expand_fields(expand);
    if fields.is_empty() {
        let entity = Presented::new(fetch.await?);
        return serde_json::to_value(entity)
            .map_err(|e| MarketError::MalformedDocument(e.to_string()));
    }
    market.expand(kind, id, &fields).await
}

#[options("/<_path..>")]
fn all_options(_path: std::path::PathBuf) -> Status {
    Status::Ok
}

#[get("/item?<id>&<name>")]
async fn get_item(
    market: &State<Marketplace>,
    id: Option<&str>,
    name: Option<&str>,
) -> Reply<Presented<Item>> {
    reply(Status::Ok, presented(market.get_item(id, name).await))
}

#[get("/items")]
async fn get_items(market: &State<Marketplace>) -> Reply<Vec<Presented<Item>>> {
    let items = market
        .get_items()
        .await
        .map(|items| items.into_iter().map(Presented::new).collect());
    reply(Status::Ok, items)
}

#[post("/users", format = "json", data = "<new_user>")]
async fn add_user(market: &State<Marketplace>, new_user: Json<NewUser>) -> Reply<Presented<User>> {
    reply(
        Status::Created,
        presented(market.add_user(new_user.discord_id).await),
    )
}

#[get("/users/<id>?<expand>")]
async fn get_user(market: &State<Marketplace>, id: &str, expand: Option<&str>) -> Reply<Value> {
    let outcome = expanded(market, EntityKind::User, id, market.get_user(id), expand).await;
    reply(Status::Ok, outcome)
}

#[put("/users/<id>/ban", data = "<ban>")]
async fn ban_user(
    market: &State<Marketplace>,
    id: &str,
    ban: Option<Json<BanRequest>>,
) -> Reply<Presented<User>> {
    let note = ban.and_then(|ban| ban.into_inner().note);
    reply(Status::Ok, presented(market.ban_user(id, note).await))
}

#[put("/users/<id>/admin", format = "json", data = "<admin>")]
async fn set_user_admin(
    market: &State<Marketplace>,
    id: &str,
    admin: Json<AdminRequest>,
) -> Reply<Presented<User>> {
    reply(
        Status::Ok,
        presented(market.set_user_admin(id, admin.admin).await),
    )
}

#[delete("/users/<id>")]
async fn delete_user(market: &State<Marketplace>, id: &str) -> Reply<Presented<User>> {
    reply(Status::Ok, presented(market.delete_user(id).await))
}

#[post("/listings", format = "json", data = "<listing>")]
async fn create_listing(
    market: &State<Marketplace>,
    listing: Json<NewListing>,
) -> Reply<Presented<Listing>> {
    let outcome = market
        .create_listing(&listing.item, &listing.user, listing.price)
        .await;
    reply(Status::Created, presented(outcome))
}

#[get("/listings")]
async fn get_listings(market: &State<Marketplace>) -> Reply<Vec<Presented<Listing>>> {
    let listings = market
        .get_listings()
        .await
        .map(|listings| listings.into_iter().map(Presented::new).collect());
    reply(Status::Ok, listings)
}

#[get("/listings/<id>?<expand>")]
async fn get_listing(market: &State<Marketplace>, id: &str, expand: Option<&str>) -> Reply<Value> {
    let outcome = expanded(market, EntityKind::Listing, id, market.get_listing(id), expand).await;
    reply(Status::Ok, outcome)
}

#[delete("/listings/<id>")]
async fn delete_listing(market: &State<Marketplace>, id: &str) -> Reply<Presented<Listing>> {
    reply(Status::Ok, presented(market.delete_listing(id).await))
}

#[post("/inquiries", format = "json", data = "<inquiry>")]
async fn create_inquiry(
    market: &State<Marketplace>,
    inquiry: Json<NewInquiry>,
) -> Reply<Presented<ListingInquiry>> {
    let NewInquiry {
        listing,
        user,
        note,
    } = inquiry.into_inner();
    reply(
        Status::Created,
        presented(market.create_inquiry(&listing, &user, note).await),
    )
}

#[post("/reports", format = "json", data = "<report>")]
async fn report_user(
    market: &State<Marketplace>,
    report: Json<NewReport>,
) -> Reply<Presented<UserReport>> {
    let NewReport {
        reporter,
        scumbag,
        note,
    } = report.into_inner();
    reply(
        Status::Created,
        presented(market.report_user(&reporter, &scumbag, note).await),
    )
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ApiResponse<String>> {
    Json(ApiResponse {
        message: format!("404: '{}' route not found", req.uri()),
        result: None,
    })
}

/// Mounts every route on `rocket` with `marketplace` as managed state.
pub fn mount(rocket: Rocket<Build>, marketplace: Marketplace) -> Rocket<Build> {
    rocket
        .manage(marketplace)
        .attach(Cors)
        .mount(
            "/",
            routes![
                all_options,
                get_item,
                get_items,
                add_user,
                get_user,
                ban_user,
                set_user_admin,
                delete_user,
                create_listing,
                get_listings,
                get_listing,
                delete_listing,
                create_inquiry,
                report_user,
            ],
        )
        .register("/", catchers![not_found])
}
