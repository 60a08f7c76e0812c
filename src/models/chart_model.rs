// ============================================================================
// Modèle du graphique multi-séries
// ============================================================================
// Le graphique est créé une seule fois (render) puis mis à jour (update) à
// chaque rafraîchissement ou changement de sélection. Le dessin ratatui
// (ui::chart) ne fait que lire ce modèle.
// ============================================================================

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;

use crate::models::MergedPoint;

/// Une courbe : un processeur, ses points (x = secondes Unix, y = valeur)
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesLine {
    pub processor: String,
    pub points: Vec<(f64, f64)>,
}

/// Graphique prêt à dessiner
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesChart {
    pub lines: Vec<SeriesLine>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Nombre de mises à jour reçues depuis la création
    pub revision: u64,
}

impl SeriesChart {
    /// Crée le graphique à partir des points initiaux
    pub fn render(points: &[MergedPoint]) -> Self {
        let mut chart = Self {
            lines: Vec::new(),
            x_bounds: [0.0, 1.0],
            y_bounds: [0.0, 1.0],
            revision: 0,
        };
        chart.load(points);
        chart
    }

    /// Remplace les données sans recréer le graphique
    pub fn update(&mut self, points: &[MergedPoint]) {
        self.load(points);
        self.revision += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|line| line.points.is_empty())
    }

    fn load(&mut self, points: &[MergedPoint]) {
        // CONCEPT RUST : BTreeMap
        // - clés triées : les courbes (et donc la légende) ont un ordre stable
        let mut by_processor: BTreeMap<&str, Vec<(f64, f64)>> = BTreeMap::new();
        for point in points {
            by_processor
                .entry(point.processor.as_str())
                .or_default()
                .push((point.hour.as_chart_x(), point.value.to_f64().unwrap_or(0.0)));
        }

        self.lines = by_processor
            .into_iter()
            .map(|(processor, mut points)| {
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
                SeriesLine {
                    processor: processor.to_string(),
                    points,
                }
            })
            .collect();

        let all = self.lines.iter().flat_map(|line| line.points.iter());
        let (x_min, x_max, y_max) = all.fold(
            (f64::MAX, f64::MIN, 0.0_f64),
            |(x_min, x_max, y_max), &(x, y)| (x_min.min(x), x_max.max(x), y_max.max(y)),
        );

        if x_min > x_max {
            self.x_bounds = [0.0, 1.0];
            self.y_bounds = [0.0, 1.0];
            return;
        }

        // Un seul instant : on élargit d'une heure pour garder un axe valide
        self.x_bounds = if x_min == x_max {
            [x_min - 3600.0, x_max + 3600.0]
        } else {
            [x_min, x_max]
        };

        // Marge de 5% en haut pour que le graphique respire
        let top = if y_max > 0.0 { y_max * 1.05 } else { 1.0 };
        self.y_bounds = [0.0, top];
    }
}

/// Porte l'instance unique du graphique
#[derive(Debug, Default)]
pub struct ChartModel {
    chart: Option<SeriesChart>,
    renders: u32,
}

impl ChartModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Affiche une série : update si le graphique existe, render sinon
    pub fn present(&mut self, points: &[MergedPoint]) {
        match self.chart.as_mut() {
            Some(chart) => chart.update(points),
            None => {
                self.chart = Some(SeriesChart::render(points));
                self.renders += 1;
            }
        }
    }

    pub fn chart(&self) -> Option<&SeriesChart> {
        self.chart.as_ref()
    }

    /// Nombre de créations du graphique
    pub fn render_count(&self) -> u32 {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HourKey;
    use rust_decimal_macros::dec;

    fn point(file_name: &str, processor: &str, value: rust_decimal::Decimal) -> MergedPoint {
        MergedPoint {
            hour: HourKey::parse_file_name(file_name).unwrap(),
            processor: processor.to_string(),
            value,
        }
    }

    #[test]
    fn test_render_once_then_update() {
        let mut model = ChartModel::new();
        assert!(model.chart().is_none());

        model.present(&[point("2024-6-3-10", "a100", dec!(4.00))]);
        assert_eq!(model.render_count(), 1);
        assert_eq!(model.chart().unwrap().revision, 0);

        model.present(&[point("2024-6-3-11", "a100", dec!(5.00))]);
        model.present(&[]);
        assert_eq!(model.render_count(), 1);
        assert_eq!(model.chart().unwrap().revision, 2);
        assert!(model.chart().unwrap().is_empty());
    }

    #[test]
    fn test_lines_grouped_and_sorted() {
        let chart = SeriesChart::render(&[
            point("2024-6-3-11", "rtx 4090", dec!(2)),
            point("2024-6-3-10", "rtx 4090", dec!(1)),
            point("2024-6-3-10", "a100", dec!(10)),
        ]);

        assert_eq!(chart.lines.len(), 2);
        assert_eq!(chart.lines[0].processor, "a100");
        assert_eq!(chart.lines[1].processor, "rtx 4090");
        assert!(chart.lines[1].points[0].0 < chart.lines[1].points[1].0);
        assert_eq!(chart.y_bounds, [0.0, 10.5]);
    }

    #[test]
    fn test_single_instant_widens_axis() {
        let chart = SeriesChart::render(&[point("2024-6-3-10", "m3", dec!(1))]);
        assert_eq!(chart.x_bounds[1] - chart.x_bounds[0], 7200.0);
    }
}
