use super::error::AppError;
use super::{AppState, blocking};
use super::session::{Admin, Session};
use super::views;
use crate::app::CardService;
use crate::{CardFilter, CardValidationError, Deck};

use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use log::{info, warn};
use serde::Deserialize;
use std::str::FromStr;

const CARD_NOT_FOUND: &str = "Card not found.";

/// Routes a mark-known link may send the user back to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteName {
    Index,
    Cards,
    General,
    Code,
    Login,
    Logout,
}

impl RouteName {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Index => "/",
            Self::Cards => "/cards",
            Self::General => "/general",
            Self::Code => "/code",
            Self::Login => "/login",
            Self::Logout => "/logout",
        }
    }
}

impl FromStr for RouteName {
    type Err = CardValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "index" => Ok(Self::Index),
            "cards" => Ok(Self::Cards),
            "general" => Ok(Self::General),
            "code" => Ok(Self::Code),
            "login" => Ok(Self::Login),
            "logout" => Ok(Self::Logout),
            other => Err(CardValidationError::UnknownRoute(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCardForm {
    #[serde(rename = "type")]
    pub card_type: i64,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Deserialize)]
pub struct EditCardForm {
    pub card_id: i64,
    #[serde(rename = "type")]
    pub card_type: i64,
    pub front: String,
    pub back: String,
    // Browsers leave unchecked boxes out of the form entirely
    pub known: Option<String>,
}

fn to_cards() -> Response {
    Redirect::to("/cards").into_response()
}

pub async fn index(session: Session) -> Redirect {
    if session.is_logged_in() {
        Redirect::to("/cards")
    } else {
        Redirect::to("/login")
    }
}

pub async fn cards(Admin(session): Admin, service: CardService) -> Result<Html<String>, AppError> {
    let cards = blocking(service, CardService::list_cards).await??;
    Ok(views::cards_page(&cards, CardFilter::All, &session.take_flashes()))
}

pub async fn filter_cards(
    Admin(session): Admin,
    Path(name): Path<String>,
    service: CardService,
) -> Result<Response, AppError> {
    let Ok(filter) = name.parse::<CardFilter>() else {
        return Ok(to_cards());
    };
    let cards = blocking(service, move |s| s.filter_cards(filter)).await??;
    Ok(views::cards_page(&cards, filter, &session.take_flashes()).into_response())
}

pub async fn add_card(
    Admin(session): Admin,
    service: CardService,
    Form(form): Form<AddCardForm>,
) -> Result<Redirect, AppError> {
    blocking(service, move |s| s.add_card(form.card_type, form.front, form.back)).await??;
    session.flash("New card was successfully added.");
    Ok(Redirect::to("/cards"))
}

pub async fn edit(
    Admin(session): Admin,
    Path(id): Path<i64>,
    service: CardService,
) -> Result<Response, AppError> {
    match blocking(service, move |s| s.get_card_by_id(id)).await?? {
        Some(card) => Ok(views::edit_page(&card, &session.take_flashes()).into_response()),
        None => {
            session.flash(CARD_NOT_FOUND);
            Ok(to_cards())
        }
    }
}

pub async fn edit_card(
    Admin(session): Admin,
    service: CardService,
    Form(form): Form<EditCardForm>,
) -> Result<Redirect, AppError> {
    let known = form.known.is_some();
    let saved = blocking(service, move |s| {
        s.edit_card(form.card_id, form.card_type, form.front, form.back, known)
    })
    .await?;
    match saved {
        Ok(()) => session.flash("Card saved."),
        Err(e) if e.is_not_found() => session.flash(CARD_NOT_FOUND),
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/cards"))
}

pub async fn delete(
    Admin(session): Admin,
    Path(id): Path<i64>,
    service: CardService,
) -> Result<Redirect, AppError> {
    match blocking(service, move |s| s.delete_card(id)).await? {
        Ok(()) => session.flash("Card deleted."),
        Err(e) if e.is_not_found() => session.flash(CARD_NOT_FOUND),
        Err(e) => return Err(e.into()),
    }
    Ok(Redirect::to("/cards"))
}

// Shared by both decks: show a card, or end the pass when nothing is left
async fn memorize(
    session: &Session,
    service: CardService,
    deck: Deck,
    id: Option<i64>,
) -> Result<Response, AppError> {
    match blocking(service, move |s| s.quiz(deck, id)).await?? {
        Some(quiz) => Ok(views::memorize_page(&quiz, &session.take_flashes()).into_response()),
        None => {
            session.flash(format!("You've learned all the {deck} cards."));
            Ok(to_cards())
        }
    }
}

pub async fn general(Admin(session): Admin, service: CardService) -> Result<Response, AppError> {
    memorize(&session, service, Deck::General, None).await
}

pub async fn general_card(
    Admin(session): Admin,
    Path(id): Path<i64>,
    service: CardService,
) -> Result<Response, AppError> {
    memorize(&session, service, Deck::General, Some(id)).await
}

pub async fn code(Admin(session): Admin, service: CardService) -> Result<Response, AppError> {
    memorize(&session, service, Deck::Code, None).await
}

pub async fn code_card(
    Admin(session): Admin,
    Path(id): Path<i64>,
    service: CardService,
) -> Result<Response, AppError> {
    memorize(&session, service, Deck::Code, Some(id)).await
}

pub async fn mark_known(
    Admin(session): Admin,
    Path((id, route)): Path<(i64, String)>,
    service: CardService,
) -> Result<Redirect, AppError> {
    match blocking(service, move |s| s.mark_known(id)).await? {
        Ok(()) => session.flash("Card marked as known."),
        Err(e) if e.is_not_found() => {
            session.flash(CARD_NOT_FOUND);
            return Ok(Redirect::to("/cards"));
        }
        Err(e) => return Err(e.into()),
    }
    let target = route.parse::<RouteName>().map_or_else(
        |e| {
            warn!("{e}, sending user to the card list");
            RouteName::Cards.path()
        },
        RouteName::path,
    );
    Ok(Redirect::to(target))
}

pub async fn login_form(session: Session) -> Html<String> {
    views::login_page(None, &session.take_flashes())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.config.credentials.verify(&form.username, &form.password) {
        Ok(()) => {
            session.log_in();
            info!("Admin logged in");
            Redirect::to("/cards").into_response()
        }
        Err(e) => {
            warn!("Failed login attempt as '{}': {e}", form.username);
            views::login_page(Some(&e.to_string()), &session.take_flashes()).into_response()
        }
    }
}

pub async fn logout(session: Session) -> Redirect {
    session.log_out();
    session.flash("You've logged out");
    info!("Admin logged out");
    Redirect::to("/")
}
