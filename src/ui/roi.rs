// ============================================================================
// Calculateur de ROI
// ============================================================================
// Gauche : processeurs des dernières récompenses. Droite : prix d'achat,
// unité, données de marché utilisées et résultat.
// ============================================================================

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::App;

pub fn render_roi(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area)
        .to_vec();

    render_processors(frame, app, chunks[0]);
    render_form(frame, app, chunks[1]);
}

fn render_processors(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Processeur ");

    let processors = app.roi_processors();
    if processors.is_empty() {
        let paragraph = Paragraph::new("Chargement des récompenses...")
            .style(Style::default().fg(Color::Gray))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = processors
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let item = ListItem::new(format!(" {name}"));
            if index == app.roi_form.processor_index {
                item.style(Style::default().add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED))
            } else {
                item
            }
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_form(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Retour sur investissement ");

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::Gray));
    let value_or_na = |value: Option<String>| value.unwrap_or_else(|| "N/A".to_string());

    let mut lines = vec![
        Line::from(vec![
            label("Prix d'achat (CNY) : "),
            Span::styled(app.roi_form.purchase_input.clone(), Style::default().fg(Color::White)),
            Span::styled("█", Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK)),
        ]),
        Line::from(vec![label("Unité : "), Span::raw(app.roi_form.unit.label())]),
        Line::from(""),
        Line::from(vec![
            label("Prix IO (USD) : "),
            Span::raw(value_or_na(app.spot_price.map(|p| p.to_string()))),
        ]),
        Line::from(vec![
            label("USD → CNY : "),
            Span::raw(value_or_na(app.roi.usd_to_cny.map(|r| r.to_string()))),
        ]),
        Line::from(""),
    ];

    let result = match &app.roi_form.result {
        None => Line::from(label("[Enter] pour calculer")),
        Some(Ok(period)) => Line::from(vec![
            label("Rentabilisé en : "),
            Span::styled(
                format!("{period} {}", app.roi_form.unit.label()),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
        ]),
        Some(Err(e)) => Line::from(Span::styled(e.to_string(), Style::default().fg(Color::Red))),
    };
    lines.push(result);

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
