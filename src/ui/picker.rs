// ============================================================================
// Sélection des processeurs
// ============================================================================
// Deux groupes : processeurs NVIDIA présents dans les données, puis la liste
// Apple fixe. Espace coche / décoche le processeur sous le curseur.
// ============================================================================

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::app::App;
use crate::models::ProcessorGroup;

pub fn render_picker(frame: &mut Frame, app: &App, area: Rect) {
    let options = app.processor_options();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" Processeurs ({} sélectionnés) ", app.selection.processors.len()));

    let mut items: Vec<ListItem> = Vec::with_capacity(options.len() + 2);
    let mut current_group = None;

    for (index, (group, name)) in options.all().enumerate() {
        // Titre de groupe avant le premier processeur du groupe
        if current_group != Some(group) {
            current_group = Some(group);
            items.push(ListItem::new(Line::from(Span::styled(
                group.label(),
                Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
            ))));
        }

        let checkbox = if app.selection.is_selected(name) { "[x]" } else { "[ ]" };
        let mut style = if app.selection.is_selected(name) {
            Style::default().fg(Color::Green)
        } else {
            Style::default()
        };
        if index == app.picker_index {
            style = style.add_modifier(Modifier::BOLD).add_modifier(Modifier::REVERSED);
        }

        items.push(ListItem::new(format!("  {checkbox} {name}")).style(style));
    }

    frame.render_widget(List::new(items).block(block), area);
}
