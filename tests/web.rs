//! End-to-end tests driving the router against a file-backed database

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use flashcards::auth::Credentials;
use flashcards::backends::SqliteBackend;
use flashcards::setup::arguments::Config;
use flashcards::web::{self, AppState};
use flashcards::{Card, CardBackend, CardFilter};
use std::collections::HashSet;
use tempfile::TempDir;
use tower::ServiceExt;

// ──────────────────────── Helper ────────────────────────

/// A tiny browser: one router, one cookie
struct Client {
    app: Router,
    cookie: Option<String>,
    database: String,
    _dir: TempDir,
}

impl Client {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let database = dir.path().join("cards.db").to_str().unwrap().to_string();
        let config = Config {
            database: database.clone(),
            host: "127.0.0.1".to_string(),
            port: 0,
            secret_key: "test secret".to_string(),
            credentials: Credentials::new("admin", "hunter2"),
        };
        Self {
            app: web::router(AppState::new(config)),
            cookie: None,
            database,
            _dir: dir,
        }
    }

    async fn logged_in() -> Self {
        let mut client = Self::new();
        let response = client.post("/login", "username=admin&password=hunter2").await;
        assert_eq!(location(&response), "/cards");
        client
    }

    async fn send(&mut self, request: Request<Body>) -> Response<Body> {
        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }
        response
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        let request = self.request("GET", uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&mut self, uri: &str, form: &str) -> Response<Body> {
        let request = self
            .request("POST", uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn page(&mut self, uri: &str) -> String {
        let response = self.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {uri}");
        body(response).await
    }

    fn storage(&self) -> SqliteBackend {
        SqliteBackend::new(&self.database)
    }

    fn cards(&self, filter: CardFilter) -> Vec<Card> {
        self.storage().list(filter).unwrap()
    }

    async fn add(&mut self, card_type: i64, front: &str, back: &str) -> i64 {
        let form = format!("type={card_type}&front={front}&back={back}");
        let response = self.post("/add", &form).await;
        assert_eq!(location(&response), "/cards");
        self.cards(CardFilter::All)[0].id
    }
}

fn location(response: &Response<Body>) -> &str {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    response.headers().get(LOCATION).unwrap().to_str().unwrap()
}

async fn body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn ids(cards: &[Card]) -> HashSet<i64> {
    cards.iter().map(|c| c.id).collect()
}

// ══════════════════════════════════════════════════════════
//  Auth gate
// ══════════════════════════════════════════════════════════

#[tokio::test]
async fn unauthenticated_requests_are_sent_to_login() {
    let mut client = Client::new();
    for uri in ["/cards", "/filter_cards/known", "/general", "/code/1", "/edit/1", "/delete/1"] {
        let response = client.get(uri).await;
        assert_eq!(location(&response), "/login", "GET {uri}");
    }
    let response = client.post("/add", "type=1&front=a&back=b").await;
    assert_eq!(location(&response), "/login");
    assert!(client.storage().list(CardFilter::All).unwrap().is_empty());
}

#[tokio::test]
async fn index_redirects_by_login_state() {
    let mut client = Client::new();
    assert_eq!(location(&client.get("/").await), "/login");

    let mut client = Client::logged_in().await;
    assert_eq!(location(&client.get("/").await), "/cards");
}

#[tokio::test]
async fn wrong_credentials_render_inline_errors() {
    let mut client = Client::new();

    let response = client.post("/login", "username=root&password=hunter2").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).await.contains("Invalid username"));

    let response = client.post("/login", "username=admin&password=wrong").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body(response).await.contains("Invalid password"));

    assert_eq!(location(&client.get("/cards").await), "/login");
}

#[tokio::test]
async fn login_persists_beyond_the_browser_session() {
    let mut client = Client::new();
    let response = client.post("/login", "username=admin&password=hunter2").await;
    let set_cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("Max-Age="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn tampered_cookie_is_not_logged_in() {
    let mut client = Client::logged_in().await;
    let cookie = client.cookie.take().unwrap();
    let (payload, _) = cookie.split_once('.').unwrap();
    client.cookie = Some(format!("{payload}.{}", "00".repeat(32)));

    assert_eq!(location(&client.get("/cards").await), "/login");
}

#[tokio::test]
async fn logout_clears_the_session() {
    let mut client = Client::logged_in().await;
    assert_eq!(location(&client.get("/logout").await), "/");
    assert_eq!(location(&client.get("/cards").await), "/login");
    // The gate redirect renders nothing, so the notice waits for the login page
    assert!(client.page("/login").await.contains("You've logged out"));
}

// ══════════════════════════════════════════════════════════
//  Listing and mutations
// ══════════════════════════════════════════════════════════

#[tokio::test]
async fn added_card_is_listed_once_and_unknown() {
    let mut client = Client::logged_in().await;
    client.add(1, "capital+of+France", "Paris").await;

    let matching: Vec<Card> = client
        .cards(CardFilter::All)
        .into_iter()
        .filter(|c| c.front == "capital of France" && c.back == "Paris")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].card_type, 1);
    assert!(!matching[0].known);

    let page = client.page("/cards").await;
    assert!(page.contains("New card was successfully added."));
    assert!(page.contains("capital of France"));

    // Flash is one-shot
    assert!(!client.page("/cards").await.contains("New card was successfully added."));
}

#[tokio::test]
async fn listing_is_newest_first() {
    let mut client = Client::logged_in().await;
    client.add(1, "older", "a").await;
    client.add(2, "newer", "b").await;

    let page = client.page("/cards").await;
    let newer = page.find("<td>newer</td>").unwrap();
    let older = page.find("<td>older</td>").unwrap();
    assert!(newer < older);
}

#[tokio::test]
async fn editing_without_checkbox_clears_known() {
    let mut client = Client::logged_in().await;
    let id = client.add(1, "q", "a").await;
    client.storage().mark_known(id).unwrap();

    let response = client
        .post("/edit_card", &format!("card_id={id}&type=2&front=q2&back=a2"))
        .await;
    assert_eq!(location(&response), "/cards");

    let card = client.storage().read(id).unwrap();
    assert!(!card.known);
    assert_eq!((card.card_type, card.front.as_str(), card.back.as_str()), (2, "q2", "a2"));

    client
        .post("/edit_card", &format!("card_id={id}&type=2&front=q2&back=a2&known=1"))
        .await;
    assert!(client.storage().read(id).unwrap().known);
}

#[tokio::test]
async fn edit_form_is_prefilled() {
    let mut client = Client::logged_in().await;
    let id = client.add(2, "fn+main", "entry").await;

    let page = client.page(&format!("/edit/{id}")).await;
    assert!(page.contains("fn main"));
    assert!(page.contains("entry"));
    assert!(page.contains(&format!("value=\"{id}\"")));
}

#[tokio::test]
async fn missing_cards_redirect_with_a_notice() {
    let mut client = Client::logged_in().await;
    assert_eq!(location(&client.get("/edit/999").await), "/cards");
    assert!(client.page("/cards").await.contains("Card not found."));

    assert_eq!(location(&client.get("/delete/999").await), "/cards");
    assert!(client.page("/cards").await.contains("Card not found."));

    let response = client.post("/edit_card", "card_id=999&type=1&front=q&back=a").await;
    assert_eq!(location(&response), "/cards");
    assert!(client.page("/cards").await.contains("Card not found."));
    assert!(client.cards(CardFilter::All).is_empty());
}

#[tokio::test]
async fn mark_known_on_missing_card_returns_to_listing() {
    let mut client = Client::logged_in().await;
    client.add(1, "q", "a").await;

    let response = client.get("/mark_known/999/general").await;
    assert_eq!(location(&response), "/cards");
    let page = client.page("/cards").await;
    assert!(page.contains("Card not found."));
    assert!(!page.contains("Card marked as known."));
    assert!(client.cards(CardFilter::Known).is_empty());
}

#[tokio::test]
async fn deleted_card_cannot_be_fetched() {
    let mut client = Client::logged_in().await;
    let id = client.add(1, "q", "a").await;

    assert_eq!(location(&client.get(&format!("/delete/{id}")).await), "/cards");
    assert!(client.storage().read(id).unwrap_err().is_not_found());
    assert!(client.page("/cards").await.contains("Card deleted."));
}

#[tokio::test]
async fn known_and_unknown_filters_partition_all() {
    let mut client = Client::logged_in().await;
    let a = client.add(1, "a", "a").await;
    client.add(2, "b", "b").await;
    let c = client.add(2, "c", "c").await;
    client.get(&format!("/mark_known/{a}/cards")).await;
    client.get(&format!("/mark_known/{c}/cards")).await;

    let known = client.cards(CardFilter::Known);
    let unknown = client.cards(CardFilter::Unknown);
    let all = client.cards(CardFilter::All);

    assert!(known.iter().all(|c| c.known));
    assert_eq!(ids(&known), HashSet::from([a, c]));
    assert!(ids(&known).is_disjoint(&ids(&unknown)));
    assert_eq!(
        ids(&known).union(&ids(&unknown)).copied().collect::<HashSet<_>>(),
        ids(&all)
    );

    let page = client.page("/filter_cards/known").await;
    assert!(page.contains(&format!("card-{a}")));
    assert!(!page.contains(">b<"));
}

#[tokio::test]
async fn unknown_filter_redirects_to_listing() {
    let mut client = Client::logged_in().await;
    assert_eq!(location(&client.get("/filter_cards/everything").await), "/cards");
}

// ══════════════════════════════════════════════════════════
//  Quiz flow
// ══════════════════════════════════════════════════════════

#[tokio::test]
async fn quiz_until_the_deck_is_learned() {
    let mut client = Client::logged_in().await;
    let id = client.add(1, "2%2B2", "4").await;

    let page = client.page("/general").await;
    assert!(page.contains("2+2"));
    assert!(page.contains(&format!("/mark_known/{id}/general")));

    let response = client.get(&format!("/mark_known/{id}/general")).await;
    assert_eq!(location(&response), "/general");
    assert!(client.storage().read(id).unwrap().known);

    let response = client.get("/general").await;
    assert_eq!(location(&response), "/cards");
    let page = client.page("/cards").await;
    assert!(page.contains("You've learned all the general cards."));
}

#[tokio::test]
async fn every_unknown_card_can_be_drawn() {
    let mut client = Client::logged_in().await;
    let first = client.add(1, "first", "a").await;
    let second = client.add(1, "second", "b").await;
    client.add(2, "other+deck", "c").await;

    let mut seen = HashSet::new();
    for _ in 0..60 {
        let page = client.page("/general").await;
        for id in [first, second] {
            if page.contains(&format!("id=\"card-{id}\"")) {
                seen.insert(id);
            }
        }
        if seen.len() == 2 {
            break;
        }
    }
    assert_eq!(seen, HashSet::from([first, second]));
}

#[tokio::test]
async fn empty_deck_shows_no_card() {
    let mut client = Client::logged_in().await;
    client.add(1, "general+only", "x").await;

    let response = client.post("/code", "").await;
    assert_eq!(location(&response), "/cards");
    assert!(client.page("/cards").await.contains("You've learned all the code cards."));
}

#[tokio::test]
async fn specific_card_is_shown_even_when_known() {
    let mut client = Client::logged_in().await;
    let id = client.add(2, "known+card", "x").await;
    client.storage().mark_known(id).unwrap();

    assert!(client.page(&format!("/code/{id}")).await.contains("known card"));
    assert_eq!(location(&client.get("/code/999").await), "/cards");
}

#[tokio::test]
async fn unknown_route_name_still_marks_known() {
    let mut client = Client::logged_in().await;
    let id = client.add(1, "q", "a").await;

    let response = client.get(&format!("/mark_known/{id}/nowhere")).await;
    assert_eq!(location(&response), "/cards");
    assert!(client.storage().read(id).unwrap().known);
}

#[tokio::test]
async fn non_numeric_ids_are_rejected() {
    let mut client = Client::logged_in().await;
    let response = client.get("/edit/abc").await;
    assert!(response.status().is_client_error());
}
