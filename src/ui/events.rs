// ============================================================================
// Gestion des événements clavier
// ============================================================================
// Lecture des touches (crossterm) et helpers de reconnaissance utilisés par
// handle_event() dans main.rs.
//
// Raccourcis :
//   Tab / c   graphique récompenses <-> devices
//   t         période suivante
//   p         sélection des processeurs
//   r         calculateur de ROI
//   f         rafraîchir sans cache
//   [ / ]     annonce précédente / suivante
//   q         quitter (deux pressions)
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Tick régulier (aucune touche pendant le timeout)
    Tick,
}

/// Lecteur d'événements (sans état)
#[derive(Debug)]
pub struct EventHandler {
    timeout: Duration,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_millis(250),
        }
    }

    /// Attend le prochain événement au plus `timeout`
    ///
    /// CONCEPT RUST : Result et ?
    /// - poll() et read() peuvent échouer (I/O)
    /// - sans touche, on retourne Tick pour que la boucle redessine
    pub fn next(&self) -> Result<Event> {
        if !event::poll(self.timeout)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Certains OS envoient Press et Release : on ne garde que Press
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            _ => Ok(Event::Tick),
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Helpers : reconnaissance des touches
// ============================================================================

/// Vérifie si l'événement est la touche 'q' (quitter)
pub fn is_quit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Échap
pub fn is_escape_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Esc)
    } else {
        false
    }
}

/// Vérifie si l'événement est Espace
pub fn is_space_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(' '))
    } else {
        false
    }
}

/// Vérifie si l'événement est Entrée
pub fn is_enter_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Enter)
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K'))
    } else {
        false
    }
}

/// Vérifie si l'événement est la flèche vers le bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Tab ou 'c' (basculer de graphique)
pub fn is_toggle_chart_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Tab | KeyCode::Char('c') | KeyCode::Char('C'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 't' (période suivante)
pub fn is_cycle_range_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('t') | KeyCode::Char('T'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'p' (sélection des processeurs)
pub fn is_picker_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('p') | KeyCode::Char('P'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'r' (calculateur de ROI)
pub fn is_roi_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('r') | KeyCode::Char('R'))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'f' (rafraîchir sans cache)
pub fn is_refresh_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('f') | KeyCode::Char('F'))
    } else {
        false
    }
}

/// Vérifie si l'événement est ']' (annonce suivante)
pub fn is_next_announcement_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(']'))
    } else {
        false
    }
}

/// Vérifie si l'événement est '[' (annonce précédente)
pub fn is_previous_announcement_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('['))
    } else {
        false
    }
}

/// Vérifie si l'événement est 'u' (unité du ROI suivante)
pub fn is_unit_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char('u') | KeyCode::Char('U'))
    } else {
        false
    }
}

/// Vérifie si l'événement est Backspace
pub fn is_backspace_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Backspace)
    } else {
        false
    }
}

/// Vérifie si l'événement est un chiffre ou un point (saisie du prix d'achat)
pub fn is_price_char_event(event: &Event) -> bool {
    if let Event::Key(key) = event {
        matches!(key.code, KeyCode::Char(c) if c.is_ascii_digit() || c == '.')
    } else {
        false
    }
}

/// Extrait le caractère d'un événement clavier si c'est un caractère
pub fn get_char_from_event(event: &Event) -> Option<char> {
    if let Event::Key(key) = event {
        if let KeyCode::Char(c) = key.code {
            return Some(c);
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
