// ============================================================================
// Normalisation des noms de processeurs
// ============================================================================
// Les flux utilisent des libellés libres ("A100-40G", "a100 80g",
// "RTX 4090"...). Avant toute agrégation, chaque libellé est ramené à un
// nom canonique en minuscules ; toutes les variantes A100 fusionnent dans
// un seul bucket "a100".
// ============================================================================

/// Marqueur de la famille A100 (toutes les variantes fusionnent)
pub const A100_MARKER: &str = "a100";

/// Nom canonique de la famille A100
pub const A100_CANONICAL: &str = "a100";

/// Processeurs Apple proposés dans le second groupe de sélection
pub const APPLE_PROCESSORS: [&str; 6] = ["m2 pro", "m2 max", "m3", "m3 pro", "m3 max", "m2 ultra"];

/// Groupe d'affichage d'un processeur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorGroup {
    Nvidia,
    Apple,
}

impl ProcessorGroup {
    /// Classe un nom canonique
    pub fn of(canonical: &str) -> Self {
        if APPLE_PROCESSORS.contains(&canonical) {
            ProcessorGroup::Apple
        } else {
            ProcessorGroup::Nvidia
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProcessorGroup::Nvidia => "NVIDIA",
            ProcessorGroup::Apple => "Apple",
        }
    }
}

/// Retourne le nom canonique d'un libellé de processeur
///
/// CONCEPT RUST : &str -> String
/// - on emprunte le libellé, on retourne un nom possédé
/// - to_lowercase() alloue de toute façon une nouvelle String
pub fn normalize_processor_name(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    if lowered.contains(A100_MARKER) {
        A100_CANONICAL.to_string()
    } else {
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a100_variants_collapse() {
        for raw in ["A100-40G", "a100 80g", "NVIDIA A100 PCIe", " a100 "] {
            assert_eq!(normalize_processor_name(raw), "a100", "libellé {raw:?}");
        }
    }

    #[test]
    fn test_other_labels_lowercased() {
        assert_eq!(normalize_processor_name("RTX 4090"), "rtx 4090");
        assert_eq!(normalize_processor_name("M2 Pro"), "m2 pro");
        assert_eq!(normalize_processor_name("h100 80g"), "h100 80g");
    }

    #[test]
    fn test_groups() {
        assert_eq!(ProcessorGroup::of("m3 max"), ProcessorGroup::Apple);
        assert_eq!(ProcessorGroup::of("rtx 4090"), ProcessorGroup::Nvidia);
        assert_eq!(ProcessorGroup::of("a100"), ProcessorGroup::Nvidia);
    }
}
