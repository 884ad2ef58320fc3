//! Server-rendered HTML pages.

use crate::app::Quiz;
use crate::{ALL_DECKS, ALL_FILTERS, Card, CardFilter, Deck};

use axum::response::Html;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

fn layout(title: &str, flashes: &[String], logged_in: bool, body: &str) -> Html<String> {
    let mut page = String::new();
    let _ = write!(
        page,
        "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{} - Flashcards</title>\n</head>\n<body>\n",
        encode_text(title)
    );
    if logged_in {
        page.push_str(
            "<nav><a href=\"/cards\">Cards</a> | <a href=\"/general\">General</a> | \
             <a href=\"/code\">Code</a> | <a href=\"/logout\">Log out</a></nav>\n",
        );
    }
    for message in flashes {
        let _ = writeln!(page, "<p class=\"flash\">{}</p>", encode_text(message));
    }
    page.push_str(body);
    page.push_str("\n</body>\n</html>\n");
    Html(page)
}

fn type_label(card_type: i64) -> String {
    Deck::from_card_type(card_type)
        .map_or_else(|| card_type.to_string(), |d| d.name().to_string())
}

// <option> list for the type field, with `selected` on the current type
fn type_options(selected: i64) -> String {
    ALL_DECKS
        .iter()
        .map(|deck| {
            let value = deck.card_type();
            let mark = if value == selected { " selected" } else { "" };
            format!("<option value=\"{value}\"{mark}>{}</option>", deck.name())
        })
        .collect()
}

#[must_use]
pub fn login_page(error: Option<&str>, flashes: &[String]) -> Html<String> {
    let mut body = String::from("<h1>Log in</h1>\n");
    if let Some(error) = error {
        let _ = writeln!(
            body,
            "<p class=\"error\"><strong>Error:</strong> {}</p>",
            encode_text(error)
        );
    }
    body.push_str(
        "<form action=\"/login\" method=\"post\">\n\
         <label>Username <input type=\"text\" name=\"username\"></label>\n\
         <label>Password <input type=\"password\" name=\"password\"></label>\n\
         <button type=\"submit\">Log in</button>\n</form>",
    );
    layout("Log in", flashes, false, &body)
}

/// Card listing with the add form and filter links
#[must_use]
pub fn cards_page(cards: &[Card], filter: CardFilter, flashes: &[String]) -> Html<String> {
    let mut body = String::from("<h1>Cards</h1>\n");

    let _ = write!(
        body,
        "<form action=\"/add\" method=\"post\" class=\"add-card\">\n\
         <select name=\"type\">{}</select>\n\
         <textarea name=\"front\" placeholder=\"Front\"></textarea>\n\
         <textarea name=\"back\" placeholder=\"Back\"></textarea>\n\
         <button type=\"submit\">Add card</button>\n</form>\n",
        type_options(Deck::General.card_type())
    );

    body.push_str("<p class=\"filters\">");
    for (i, f) in ALL_FILTERS.iter().enumerate() {
        if i > 0 {
            body.push_str(" | ");
        }
        if *f == filter {
            let _ = write!(body, "<strong>{f}</strong>");
        } else {
            let _ = write!(body, "<a href=\"/filter_cards/{f}\">{f}</a>");
        }
    }
    body.push_str("</p>\n");

    if cards.is_empty() {
        body.push_str("<p>No cards here yet.</p>");
    } else {
        body.push_str(
            "<table>\n<tr><th>Type</th><th>Front</th><th>Back</th><th>Known</th><th></th></tr>\n",
        );
        for card in cards {
            let _ = writeln!(
                body,
                "<tr id=\"card-{id}\"><td>{kind}</td><td>{front}</td><td>{back}</td><td>{known}</td>\
                 <td><a href=\"/edit/{id}\">edit</a> <a href=\"/delete/{id}\">delete</a></td></tr>",
                id = card.id,
                kind = type_label(card.card_type),
                front = encode_text(&card.front),
                back = encode_text(&card.back),
                known = if card.known { "yes" } else { "no" },
            );
        }
        body.push_str("</table>");
    }

    layout("Cards", flashes, true, &body)
}

/// Edit form pre-filled with an existing card
#[must_use]
pub fn edit_page(card: &Card, flashes: &[String]) -> Html<String> {
    let mut body = String::from("<h1>Edit card</h1>\n");
    let _ = write!(
        body,
        "<form action=\"/edit_card\" method=\"post\">\n\
         <input type=\"hidden\" name=\"card_id\" value=\"{id}\">\n\
         <select name=\"type\">{options}</select>\n\
         <textarea name=\"front\">{front}</textarea>\n\
         <textarea name=\"back\">{back}</textarea>\n\
         <label><input type=\"checkbox\" name=\"known\" value=\"1\"{checked}> Known</label>\n\
         <button type=\"submit\">Save</button>\n</form>\n\
         <p><a href=\"/delete/{id}\">Delete</a></p>",
        id = encode_double_quoted_attribute(&card.id.to_string()),
        options = type_options(card.card_type),
        front = encode_text(&card.front),
        back = encode_text(&card.back),
        checked = if card.known { " checked" } else { "" },
    );
    layout("Edit card", flashes, true, &body)
}

/// One quiz card. Short answers sit inline next to the prompt, long ones get
/// a preformatted block.
#[must_use]
pub fn memorize_page(quiz: &Quiz, flashes: &[String]) -> Html<String> {
    let deck = quiz.deck.name();
    let card = &quiz.card;
    let answer = if quiz.short_answer {
        format!("<span class=\"answer short\">{}</span>", encode_text(&card.back))
    } else {
        format!("<pre class=\"answer long\">{}</pre>", encode_text(&card.back))
    };

    let mut body = String::new();
    let _ = write!(
        body,
        "<h1>{deck}</h1>\n\
         <div class=\"card\" id=\"card-{id}\">\n\
         <p class=\"front\">{front}</p>\n\
         <details><summary>Show answer</summary>{answer}</details>\n\
         </div>\n\
         <p><a href=\"/mark_known/{id}/{deck}\">I know this</a> | \
         <a href=\"/{deck}\">Next card</a> | <a href=\"/edit/{id}\">Edit</a></p>",
        id = card.id,
        front = encode_text(&card.front),
    );
    layout(deck, flashes, true, &body)
}
