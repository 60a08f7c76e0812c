// ============================================================================
// Structure : HourKey
// ============================================================================
// Clé horaire canonique utilisée pour joindre les séries entre elles
//
// Les flux externes n'encodent pas le temps de la même manière :
// - Binance : timestamp Unix en millisecondes (open_time des chandelles)
// - Flux de récompenses : chaîne ISO-8601 (ou millisecondes)
// - Flux de devices : nom de fichier "2024-6-3-7" (année-mois-jour-heure)
//
// Toutes ces représentations sont ramenées à un DateTime<Utc> tronqué à
// l'heure. Deux clés représentant la même heure sont donc égales, quel que
// soit le flux d'origine.
// ============================================================================

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

/// Erreurs de conversion vers une clé horaire
#[derive(Debug, Error, PartialEq)]
pub enum HourKeyError {
    #[error("timestamp hors limites : {0} ms")]
    TimestampOutOfRange(i64),

    #[error("date invalide : {0:?}")]
    InvalidDateTime(String),

    #[error("nom de fichier invalide {input:?} : {reason}")]
    MalformedFileName { input: String, reason: String },
}

/// Horodatage brut tel qu'il arrive dans le JSON
///
/// CONCEPT SERDE : untagged
/// - serde essaie chaque variant dans l'ordre
/// - un nombre devient Millis, une chaîne devient Text
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

/// Heure UTC tronquée (minutes, secondes et nanosecondes à zéro)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourKey(DateTime<Utc>);

impl HourKey {
    /// Tronque un DateTime à l'heure
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        let secs = datetime.timestamp();
        let truncated = secs - secs.rem_euclid(3600);
        // Un timestamp déjà valide reste valide une fois tronqué vers le bas
        match DateTime::from_timestamp(truncated, 0) {
            Some(dt) => Self(dt),
            None => Self(datetime),
        }
    }

    /// Depuis un timestamp Unix en millisecondes
    pub fn from_millis(millis: i64) -> Result<Self, HourKeyError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self::from_datetime)
            .ok_or(HourKeyError::TimestampOutOfRange(millis))
    }

    /// Depuis une chaîne ISO-8601
    ///
    /// Accepte le RFC 3339 complet ("2024-06-03T07:00:00.000Z") et les formes
    /// sans fuseau ("2024-06-03T07:00:00", "2024-06-03 07:00:00"), lues en UTC.
    pub fn parse_iso(input: &str) -> Result<Self, HourKeyError> {
        let trimmed = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::from_datetime(dt.with_timezone(&Utc)));
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::from_datetime(naive.and_utc()));
            }
        }

        Err(HourKeyError::InvalidDateTime(input.to_string()))
    }

    /// Depuis un nom de fichier "année-mois-jour-heure"
    ///
    /// Les composants peuvent être paddés ou non ("2024-6-3-7" et
    /// "2024-06-03-07" donnent la même clé). Il faut exactement quatre
    /// composants numériques formant une date valide.
    pub fn parse_file_name(input: &str) -> Result<Self, HourKeyError> {
        let malformed = |reason: &str| HourKeyError::MalformedFileName {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.trim().split('-').collect();
        if parts.len() != 4 {
            return Err(malformed("4 composants attendus (année-mois-jour-heure)"));
        }

        let mut numbers = [0u32; 4];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u32>()
                .map_err(|_| malformed("composant non numérique"))?;
        }
        let [year, month, day, hour] = numbers;

        let year = i32::try_from(year).map_err(|_| malformed("année hors limites"))?;
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .ok_or_else(|| malformed("date ou heure hors limites"))?;

        Ok(Self(naive.and_utc()))
    }

    /// Depuis un horodatage brut du flux de récompenses
    pub fn from_raw(raw: &RawTimestamp) -> Result<Self, HourKeyError> {
        match raw {
            RawTimestamp::Millis(ms) => Self::from_millis(*ms),
            RawTimestamp::Text(text) => Self::parse_iso(text),
        }
    }

    /// DateTime sous-jacent
    pub fn datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Abscisse pour le graphique (secondes Unix)
    pub fn as_chart_x(&self) -> f64 {
        self.0.timestamp() as f64
    }
}

impl fmt::Display for HourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:00:00Z"))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
