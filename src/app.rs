// ============================================================================
// Structure : App
// ============================================================================
// Gère l'état global de l'application TUI
//
// PATTERN : "Application State"
// - tous les composants de l'UI lisent depuis App
// - toutes les modifications passent par les méthodes de App
// - les méthodes qui nécessitent un appel réseau retournent une Command,
//   que l'event loop transmet au worker
// ============================================================================

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::aggregate::{filter_selected, processor_options, ProcessorOptions};
use crate::models::{ChartKind, ChartModel, MergedPoint, RoiCalculator, RoiError, RoiUnit, Selection, TimeRange};
use crate::scheduler::Trigger;
use crate::worker::{Command, Outcome, RequestSequencer};

// ============================================================================
// Enum : Screen
// ============================================================================

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Vue principale : cartes d'info, annonces, graphique
    Dashboard,

    /// Choix des processeurs affichés (groupes NVIDIA / Apple)
    ProcessorPicker,

    /// Calculateur de retour sur investissement
    RoiCalculator,
}

/// Dernière série chargée pour un graphique (non filtrée)
#[derive(Debug, Clone)]
pub struct LoadedSeries {
    pub range: TimeRange,
    pub points: Vec<MergedPoint>,
}

/// Saisie du calculateur de ROI
#[derive(Debug, Default)]
pub struct RoiForm {
    /// Index dans la liste des processeurs des dernières récompenses
    pub processor_index: usize,
    /// Prix d'achat en CNY, tel que saisi
    pub purchase_input: String,
    pub unit: RoiUnit,
    /// Dernier résultat (None tant qu'aucun calcul n'a été lancé)
    pub result: Option<Result<Decimal, RoiError>>,
}

/// État principal de l'application
pub struct App {
    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Écran actuellement affiché
    pub current_screen: Screen,

    /// Two-step quit : première pression de 'q' → confirmation
    pub confirm_quit: bool,

    /// Graphique, périodes et processeurs sélectionnés
    pub selection: Selection,

    /// Graphique des récompenses (créé une fois, puis mis à jour)
    pub revenue_chart: ChartModel,

    /// Graphique du nombre de devices
    pub device_chart: ChartModel,

    /// Dernière série reçue pour chaque graphique
    pub revenue_series: Option<LoadedSeries>,
    pub device_series: Option<LoadedSeries>,

    /// Séquençage des requêtes de séries
    pub requests: RequestSequencer,

    /// Indicateur de chargement
    pub is_loading: bool,
    pub loading_message: Option<String>,

    /// Dernière erreur affichée dans le footer
    pub status: Option<String>,

    /// Prix spot du token (USD)
    pub spot_price: Option<Decimal>,

    /// Annonces découpées et annonce affichée
    pub announcements: Vec<String>,
    pub announcement_index: usize,

    /// Curseur de l'écran de sélection des processeurs
    pub picker_index: usize,

    /// Données et saisie du calculateur de ROI
    pub roi: RoiCalculator,
    pub roi_form: RoiForm,
}

impl App {
    /// Crée une App avec la sélection initiale
    pub fn new(selection: Selection) -> Self {
        Self {
            running: true,
            current_screen: Screen::Dashboard,
            confirm_quit: false,
            selection,
            revenue_chart: ChartModel::new(),
            device_chart: ChartModel::new(),
            revenue_series: None,
            device_series: None,
            requests: RequestSequencer::new(),
            is_loading: false,
            loading_message: None,
            status: None,
            spot_price: None,
            announcements: Vec::new(),
            announcement_index: 0,
            picker_index: 0,
            roi: RoiCalculator::default(),
            roi_form: RoiForm::default(),
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn is_awaiting_quit_confirmation(&self) -> bool {
        self.confirm_quit
    }

    // ========================================================================
    // Navigation entre écrans
    // ========================================================================

    pub fn show_dashboard(&mut self) {
        self.current_screen = Screen::Dashboard;
    }

    pub fn show_picker(&mut self) {
        self.picker_index = 0;
        self.current_screen = Screen::ProcessorPicker;
    }

    /// Ouvre le calculateur ; recharge ses données de marché
    pub fn show_roi(&mut self) -> Command {
        self.roi_form.result = None;
        self.current_screen = Screen::RoiCalculator;
        Command::LoadRoiInputs
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_on_picker(&self) -> bool {
        self.current_screen == Screen::ProcessorPicker
    }

    pub fn is_on_roi(&self) -> bool {
        self.current_screen == Screen::RoiCalculator
    }

    // ========================================================================
    // Séries et graphiques
    // ========================================================================

    /// Émet le chargement de la série du graphique courant
    ///
    /// `force` ignore le cache du worker (rafraîchissement périodique).
    pub fn request_series(&mut self, force: bool) -> Command {
        let kind = self.selection.chart;
        let range = self.selection.current_range();
        let request = self.requests.issue(kind);

        self.start_loading(Some(format!("Chargement {} ({})...", kind.label(), range.label())));
        debug!(?kind, ?range, ?request, force, "Series requested");

        Command::LoadSeries {
            kind,
            range,
            request,
            force,
        }
    }

    /// Bascule entre récompenses et devices, puis charge la série
    pub fn toggle_chart(&mut self) -> Command {
        self.selection.chart = self.selection.chart.toggle();
        info!(chart = ?self.selection.chart, "Chart switched");
        self.picker_index = 0;
        self.request_series(false)
    }

    /// Passe à la période suivante, puis charge la série
    pub fn cycle_range(&mut self) -> Command {
        let range = self.selection.cycle_range();
        info!(?range, "Time range changed");
        self.request_series(false)
    }

    pub fn loaded_series(&self, kind: ChartKind) -> Option<&LoadedSeries> {
        match kind {
            ChartKind::Revenue => self.revenue_series.as_ref(),
            ChartKind::DeviceCount => self.device_series.as_ref(),
        }
    }

    pub fn chart_model(&self, kind: ChartKind) -> &ChartModel {
        match kind {
            ChartKind::Revenue => &self.revenue_chart,
            ChartKind::DeviceCount => &self.device_chart,
        }
    }

    /// Refiltre la série d'un graphique et pousse le résultat dans le graphique
    pub fn refresh_chart(&mut self, kind: ChartKind) {
        let filtered = match self.loaded_series(kind) {
            Some(series) => filter_selected(&series.points, &self.selection),
            None => return,
        };

        let chart = match kind {
            ChartKind::Revenue => &mut self.revenue_chart,
            ChartKind::DeviceCount => &mut self.device_chart,
        };
        chart.present(&filtered);
    }

    /// Options de sélection calculées sur la série du graphique courant
    pub fn processor_options(&self) -> ProcessorOptions {
        self.loaded_series(self.selection.chart)
            .map(|series| processor_options(&series.points))
            .unwrap_or_else(|| processor_options(&[]))
    }

    // ========================================================================
    // Sélection des processeurs
    // ========================================================================

    pub fn picker_up(&mut self) {
        self.picker_index = self.picker_index.saturating_sub(1);
    }

    pub fn picker_down(&mut self) {
        let max_index = self.processor_options().len().saturating_sub(1);
        self.picker_index = (self.picker_index + 1).min(max_index);
    }

    /// Ajoute / retire le processeur sous le curseur et met à jour les graphiques
    pub fn toggle_picked(&mut self) {
        let options = self.processor_options();
        let Some((_, name)) = options.all().nth(self.picker_index) else {
            return;
        };

        let selected = self.selection.toggle(name);
        info!(processor = %name, selected, "Processor selection changed");

        self.refresh_chart(ChartKind::Revenue);
        self.refresh_chart(ChartKind::DeviceCount);
    }

    // ========================================================================
    // Annonces
    // ========================================================================

    pub fn current_announcement(&self) -> Option<&str> {
        self.announcements.get(self.announcement_index).map(String::as_str)
    }

    pub fn next_announcement(&mut self) {
        if !self.announcements.is_empty() {
            self.announcement_index = (self.announcement_index + 1) % self.announcements.len();
        }
    }

    pub fn previous_announcement(&mut self) {
        if !self.announcements.is_empty() {
            let len = self.announcements.len();
            self.announcement_index = (self.announcement_index + len - 1) % len;
        }
    }

    // ========================================================================
    // Calculateur de ROI
    // ========================================================================

    pub fn roi_processors(&self) -> Vec<String> {
        self.roi.processors()
    }

    pub fn roi_up(&mut self) {
        self.roi_form.processor_index = self.roi_form.processor_index.saturating_sub(1);
    }

    pub fn roi_down(&mut self) {
        let max_index = self.roi_processors().len().saturating_sub(1);
        self.roi_form.processor_index = (self.roi_form.processor_index + 1).min(max_index);
    }

    /// Ajoute un caractère au prix d'achat (chiffres et un seul point)
    pub fn roi_append(&mut self, c: char) {
        let accepted = c.is_ascii_digit() || (c == '.' && !self.roi_form.purchase_input.contains('.'));
        if accepted {
            self.roi_form.purchase_input.push(c);
        }
    }

    pub fn roi_backspace(&mut self) {
        self.roi_form.purchase_input.pop();
    }

    pub fn roi_next_unit(&mut self) {
        self.roi_form.unit = self.roi_form.unit.next();
        if self.roi_form.result.is_some() {
            self.calculate_roi();
        }
    }

    /// Lance le calcul avec la saisie courante
    pub fn calculate_roi(&mut self) {
        let processors = self.roi_processors();
        let processor = processors
            .get(self.roi_form.processor_index)
            .cloned()
            .unwrap_or_default();

        // Une saisie vide ou illisible compte comme un prix invalide
        let purchase = Decimal::from_str(&self.roi_form.purchase_input).unwrap_or(Decimal::ZERO);

        let mut calculator = self.roi.clone();
        calculator.io_price = self.spot_price;
        let result = calculator.calculate(&processor, purchase, self.roi_form.unit);

        match &result {
            Ok(period) => info!(%processor, %purchase, %period, unit = self.roi_form.unit.label(), "ROI calculated"),
            Err(e) => warn!(%processor, error = %e, "ROI calculation failed"),
        }
        self.roi_form.result = Some(result);
    }

    // ========================================================================
    // Tâches périodiques et résultats du worker
    // ========================================================================

    /// Convertit un tick de tâche périodique en commande
    pub fn on_trigger(&mut self, trigger: Trigger) -> Command {
        match trigger {
            Trigger::RefreshData => self.request_series(true),
            Trigger::RefreshPrice => Command::RefreshSpotPrice,
            Trigger::SweepCache => Command::SweepCache,
        }
    }

    /// Applique un résultat du worker ; retourne false s'il est ignoré
    ///
    /// En cas d'échec, l'état précédent est conservé (données périmées mais
    /// disponibles) ; seul le message de statut change.
    pub fn apply(&mut self, outcome: Outcome) -> bool {
        match outcome {
            Outcome::SeriesLoaded {
                kind,
                range,
                request,
                points,
            } => {
                if !self.requests.is_current(kind, request) {
                    debug!(?kind, ?request, "Discarding superseded series response");
                    return false;
                }

                info!(?kind, ?range, points = points.len(), "Applying series");
                let loaded = Some(LoadedSeries { range, points });
                match kind {
                    ChartKind::Revenue => self.revenue_series = loaded,
                    ChartKind::DeviceCount => self.device_series = loaded,
                }
                self.refresh_chart(kind);
                self.status = None;
                self.stop_loading();
                true
            }

            Outcome::SeriesFailed { kind, request, error } => {
                if !self.requests.is_current(kind, request) {
                    return false;
                }
                self.status = Some(format!("Échec du chargement : {error}"));
                self.stop_loading();
                true
            }

            Outcome::SpotPrice(price) => {
                self.spot_price = Some(price);
                true
            }

            Outcome::RoiInputs { latest, usd_to_cny } => {
                if latest.is_some() {
                    self.roi.latest = latest;
                    self.roi_form.processor_index = 0;
                }
                if usd_to_cny.is_some() {
                    self.roi.usd_to_cny = usd_to_cny;
                }
                true
            }

            Outcome::Announcements(list) => {
                self.announcements = list;
                self.announcement_index = 0;
                true
            }

            Outcome::CacheSwept { .. } => true,

            Outcome::FeedFailed { feed, error } => {
                self.status = Some(format!("Flux {feed} indisponible : {error}"));
                true
            }
        }
    }

    pub fn start_loading(&mut self, message: Option<String>) {
        self.is_loading = true;
        self.loading_message = message;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
        self.loading_message = None;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Selection::new(ChartKind::Revenue, ["a100", "m2 pro", "rtx 4090"]))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
