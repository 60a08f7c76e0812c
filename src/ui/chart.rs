// ============================================================================
// Chart - Rendu du graphique d'une série
// ============================================================================
// Une courbe par processeur sélectionné, axe X en heures (UTC), axe Y en
// USD (récompenses) ou en nombre de devices.
//
// CONCEPTS RATATUI :
// 1. Chart widget : plusieurs Dataset sur les mêmes axes
// 2. Axis : bornes calculées par SeriesChart
// ============================================================================

use chrono::DateTime;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{ChartKind, SeriesChart};

/// Couleurs des courbes, dans l'ordre de la légende
const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::LightRed,
    Color::LightBlue,
    Color::LightGreen,
    Color::White,
];

/// Dessine le graphique du type sélectionné
pub fn render_chart(frame: &mut Frame, app: &App, area: Rect) {
    let kind = app.selection.chart;
    let range = app.selection.current_range();
    let title = format!(" {} - {} ", kind.label(), range.label());

    let chart = match app.chart_model(kind).chart() {
        Some(chart) if !chart.is_empty() => chart,
        Some(_) => {
            render_message(frame, area, &title, "Aucune donnée pour les processeurs sélectionnés");
            return;
        }
        None => {
            let message = if app.is_loading { "Chargement..." } else { "Pas encore de données" };
            render_message(frame, area, &title, message);
            return;
        }
    };

    let datasets: Vec<Dataset> = chart
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            Dataset::default()
                .name(line.processor.as_str())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(PALETTE[i % PALETTE.len()]))
                .data(&line.points)
        })
        .collect();

    let x_axis = Axis::default()
        .title("Heure (UTC)")
        .style(Style::default().fg(Color::Gray))
        .bounds(chart.x_bounds)
        .labels(x_labels(chart));

    let y_axis = Axis::default()
        .title(kind.unit())
        .style(Style::default().fg(Color::Gray))
        .bounds(chart.y_bounds)
        .labels(y_labels(kind, chart));

    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(widget, area);
}

/// Début, milieu et fin de l'axe des temps
fn x_labels(chart: &SeriesChart) -> Vec<Span<'static>> {
    let [start, end] = chart.x_bounds;
    [start, (start + end) / 2.0, end]
        .into_iter()
        .map(|x| {
            let label = DateTime::from_timestamp(x as i64, 0)
                .map(|dt| dt.format("%m-%d %H:%M").to_string())
                .unwrap_or_default();
            Span::raw(label)
        })
        .collect()
}

fn y_labels(kind: ChartKind, chart: &SeriesChart) -> Vec<Span<'static>> {
    let [low, high] = chart.y_bounds;
    [low, (low + high) / 2.0, high]
        .into_iter()
        .map(|y| match kind {
            ChartKind::Revenue => Span::raw(format!("${y:.2}")),
            ChartKind::DeviceCount => Span::raw(format!("{y:.0}")),
        })
        .collect()
}

/// Cadre vide avec un message centré
fn render_message(frame: &mut Frame, area: Rect, title: &str, message: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title.to_string());

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Gray))),
    ];

    let paragraph = Paragraph::new(text).block(block).alignment(Alignment::Center);
    frame.render_widget(paragraph, area);
}
