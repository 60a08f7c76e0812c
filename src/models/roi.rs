// ============================================================================
// Calculateur de retour sur investissement (ROI)
// ============================================================================
// Combien de temps faut-il à un processeur pour rembourser son prix
// d'achat (en CNY) avec ses récompenses horaires actuelles ?
//
//   gain_usd_heure = récompense (IO/h) × prix IO (USD)
//   gain_cny_heure = gain_usd_heure × taux USD→CNY
//   heures         = prix d'achat / gain_cny_heure
//
// Le résultat est converti dans l'unité choisie puis arrondi à 2 décimales.
// ============================================================================

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::series::round2;
use crate::models::RewardEvent;

/// Erreurs du calcul de ROI
#[derive(Debug, Error, PartialEq)]
pub enum RoiError {
    #[error("donnée de marché manquante : {0}")]
    MissingMarketData(&'static str),

    #[error("processeur introuvable dans les dernières récompenses : {0}")]
    UnknownProcessor(String),

    #[error("le prix d'achat doit être strictement positif")]
    InvalidPurchasePrice,

    #[error("aucune récompense positive pour {0}")]
    NoReward(String),
}

/// Unité du résultat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoiUnit {
    Hours,
    #[default]
    Days,
    Months,
}

impl RoiUnit {
    pub fn label(&self) -> &'static str {
        match self {
            RoiUnit::Hours => "heures",
            RoiUnit::Days => "jours",
            RoiUnit::Months => "mois",
        }
    }

    /// Nombre d'heures dans une unité (un mois compte 30 jours)
    pub fn hours(&self) -> Decimal {
        match self {
            RoiUnit::Hours => Decimal::ONE,
            RoiUnit::Days => Decimal::from(24),
            RoiUnit::Months => Decimal::from(24 * 30),
        }
    }

    /// Unité suivante (cycle)
    pub fn next(&self) -> RoiUnit {
        match self {
            RoiUnit::Hours => RoiUnit::Days,
            RoiUnit::Days => RoiUnit::Months,
            RoiUnit::Months => RoiUnit::Hours,
        }
    }
}

/// Données de marché nécessaires au calcul
///
/// Chaque champ est rempli indépendamment par le worker ; tant qu'un champ
/// manque, le calcul échoue avec MissingMarketData.
#[derive(Debug, Clone, Default)]
pub struct RoiCalculator {
    /// Dernier événement du flux de récompenses
    pub latest: Option<RewardEvent>,
    /// Prix spot IO en USD
    pub io_price: Option<Decimal>,
    /// Taux de change USD → CNY
    pub usd_to_cny: Option<Decimal>,
}

impl RoiCalculator {
    /// Noms des processeurs disponibles (libellés d'origine)
    pub fn processors(&self) -> Vec<String> {
        self.latest
            .as_ref()
            .map(|event| event.rewards.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    /// Calcule la durée de retour sur investissement
    ///
    /// Le processeur est recherché sans tenir compte de la casse.
    pub fn calculate(&self, processor: &str, purchase_price: Decimal, unit: RoiUnit) -> Result<Decimal, RoiError> {
        let latest = self.latest.as_ref().ok_or(RoiError::MissingMarketData("récompenses"))?;
        let io_price = self.io_price.ok_or(RoiError::MissingMarketData("prix IO"))?;
        let rate = self.usd_to_cny.ok_or(RoiError::MissingMarketData("taux USD/CNY"))?;

        if purchase_price <= Decimal::ZERO {
            return Err(RoiError::InvalidPurchasePrice);
        }

        let wanted = processor.trim().to_lowercase();
        let entry = latest
            .rewards
            .iter()
            .find(|r| r.name.to_lowercase() == wanted)
            .ok_or_else(|| RoiError::UnknownProcessor(processor.to_string()))?;

        let hourly_cny = entry.reward * io_price * rate;
        if hourly_cny <= Decimal::ZERO {
            return Err(RoiError::NoReward(entry.name.clone()));
        }

        let hours = purchase_price / hourly_cny;
        Ok(round2(hours / unit.hours()))
    }
}
