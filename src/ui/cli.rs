use crate::{Card, CardFilter};

use colored::Colorize;
use tabled::{Table, settings::Style};

/// Renders a table of cards in `psql` style to stdout, under a bolded
/// title naming the filter and the number of matching cards.
///
/// # Parameters
///
/// - `filter`: The filter that produced `cards`.
/// - `cards`: The cards to tabulate.
pub fn show_cards(filter: CardFilter, cards: Vec<Card>) {
    show_title(&format!("{} cards ({filter})", cards.len()));
    if cards.is_empty() {
        println!("{}", "No cards here yet.".dimmed());
        return;
    }
    let mut table = Table::new(cards);
    table.with(Style::psql());
    println!("{table}");
}

/// Prints a bolded title followed by a blank line.
pub fn show_title(title: &str) {
    println!("\n{}\n", title.bold());
}

/// Prints plain text to stdout.
pub fn show_text(msg: &str) {
    println!("{msg}");
}
