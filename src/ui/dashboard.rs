// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Écran principal :
//   ┌ cartes d'info (prix IO, graphique, période, processeurs) ┐
//   ├ annonce courante                                         ┤
//   ├ graphique                                                ┤
//   └ footer (raccourcis, chargement, erreurs)                 ┘
//
// CONCEPTS RATATUI :
// 1. Layout imbriqués (vertical puis horizontal pour les cartes)
// 2. Routing par écran : match sur app.current_screen
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::ui::{chart, picker, roi};

/// Dessine l'interface complète
///
/// CONCEPT RUST : Routing avec match sur enum
/// - le compilateur garantit que chaque écran est géré
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = create_layout(frame.size());

    render_cards(frame, app, chunks[0]);
    render_announcement(frame, app, chunks[1]);

    match app.current_screen {
        Screen::Dashboard => chart::render_chart(frame, app, chunks[2]),
        Screen::ProcessorPicker => picker::render_picker(frame, app, chunks[2]),
        Screen::RoiCalculator => roi::render_roi(frame, app, chunks[2]),
    }

    render_footer(frame, app, chunks[3]);
}

/// Crée le layout principal (cartes, annonce, contenu, footer)
fn create_layout(area: Rect) -> Vec<Rect> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Cartes
            Constraint::Length(3), // Annonce
            Constraint::Min(0),    // Contenu
            Constraint::Length(3), // Footer
        ])
        .split(area)
        .to_vec()
}

// ============================================================================
// Cartes d'info
// ============================================================================

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area)
        .to_vec();

    let price = app
        .spot_price
        .map(|p| format!("${p:.4}"))
        .unwrap_or_else(|| "N/A".to_string());

    let processors = if app.selection.processors.is_empty() {
        "aucun".to_string()
    } else {
        app.selection.processors.len().to_string()
    };

    render_card(frame, cards[0], " Prix IO ", price, Color::Green);
    render_card(frame, cards[1], " Graphique ", app.selection.chart.label().to_string(), Color::Cyan);
    render_card(frame, cards[2], " Période ", app.selection.current_range().label().to_string(), Color::Cyan);
    render_card(frame, cards[3], " Processeurs ", processors, Color::Yellow);
}

fn render_card(frame: &mut Frame, area: Rect, title: &'static str, value: String, color: Color) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let paragraph = Paragraph::new(Line::from(Span::styled(
        value,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(block)
    .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Annonces
// ============================================================================

fn render_announcement(frame: &mut Frame, app: &App, area: Rect) {
    let title = if app.announcements.is_empty() {
        " Annonces ".to_string()
    } else {
        format!(" Annonces {}/{} ", app.announcement_index + 1, app.announcements.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let text = app.current_announcement().unwrap_or("Aucune annonce").to_string();

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

// ============================================================================
// Footer : raccourcis, confirmation de quit, statut
// ============================================================================

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let line = if app.is_awaiting_quit_confirmation() {
        Line::from(vec![
            Span::styled("⚠  Appuyez sur ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
            Span::styled(
                "[q]",
                Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::BOLD)
                    .add_modifier(Modifier::SLOW_BLINK),
            ),
            Span::styled(
                " à nouveau pour quitter, ou n'importe quelle autre touche pour annuler ⚠",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ])
    } else if let Some(message) = &app.loading_message {
        Line::from(Span::styled(message.clone(), Style::default().fg(Color::Cyan)))
    } else if let Some(status) = &app.status {
        Line::from(Span::styled(format!("⚠ {status}"), Style::default().fg(Color::Red)))
    } else {
        match app.current_screen {
            Screen::Dashboard => Line::from(vec![
                key("[q]"),
                Span::raw(" Quit  "),
                key("[Tab]"),
                Span::raw(" Graphique  "),
                key("[t]"),
                Span::raw(" Période  "),
                key("[p]"),
                Span::raw(" Processeurs  "),
                key("[r]"),
                Span::raw(" ROI  "),
                key("[f]"),
                Span::raw(" Rafraîchir  "),
                key("[ ]"),
                Span::raw(" Annonces"),
            ]),
            Screen::ProcessorPicker => Line::from(vec![
                key("[↑↓ / j k]"),
                Span::raw(" Naviguer  "),
                key("[Space]"),
                Span::raw(" Cocher  "),
                key("[ESC]"),
                Span::raw(" Retour"),
            ]),
            Screen::RoiCalculator => Line::from(vec![
                key("[↑↓]"),
                Span::raw(" Processeur  "),
                key("[0-9 .]"),
                Span::raw(" Prix  "),
                key("[u]"),
                Span::raw(" Unité  "),
                key("[Enter]"),
                Span::raw(" Calculer  "),
                key("[ESC]"),
                Span::raw(" Retour"),
            ]),
        }
    };

    let paragraph = Paragraph::new(vec![line]).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
