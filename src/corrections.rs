// Label normalization for the free-text columns.
//
// The raw extract spells department and crime-type labels inconsistently
// (truncated names, a misspelling, mixed case). The fixes live in two
// closed correction tables applied once at load time. Lookups are exact
// on the trimmed raw value; unmapped labels pass through unchanged.
use once_cell::sync::Lazy;
use std::collections::HashMap;

static DEPARTMENT_CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("dipol - depto de inteligencia", "Dipol"),
        ("deinter 2 - campinas", "Deinter 2"),
        ("dope-depto op pol estrat.", "Dope"),
        ("demacro", "Demacro"),
        ("decap", "Decap"),
    ])
});

static CRIME_CORRECTIONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("furto - outros", "Furto"),
        ("roubo - outros", "Roubo"),
        ("lesao corporal dolosa", "Lesao corporal dolosa"),
        ("furto de veiculo", "Furto de veiculo"),
        ("roubo de veiculo", "Roubo de veiculo"),
        // The source data misspells "acidente"; the canonical label fixes it.
        (
            "lesao corporal culposa por acidade de transito",
            "Lesao corporal culposa por acidente de transito",
        ),
        ("trafico de entorpecentes", "Trafico de entorpecentes"),
    ])
});

fn normalize(table: &HashMap<&'static str, &'static str>, raw: &str) -> (String, bool) {
    let trimmed = raw.trim();
    match table.get(trimmed) {
        Some(canonical) => ((*canonical).to_string(), true),
        None => (trimmed.to_string(), false),
    }
}

/// Canonical department label plus whether a correction was applied.
pub fn normalize_department(raw: &str) -> (String, bool) {
    normalize(&DEPARTMENT_CORRECTIONS, raw)
}

/// Canonical crime-type label plus whether a correction was applied.
pub fn normalize_crime(raw: &str) -> (String, bool) {
    normalize(&CRIME_CORRECTIONS, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn department_labels_are_rewritten() {
        assert_eq!(
            normalize_department("dipol - depto de inteligencia"),
            ("Dipol".to_string(), true)
        );
        assert_eq!(
            normalize_department("deinter 2 - campinas"),
            ("Deinter 2".to_string(), true)
        );
        assert_eq!(normalize_department("decap"), ("Decap".to_string(), true));
    }

    #[test]
    fn crime_misspelling_is_fixed() {
        let (label, corrected) =
            normalize_crime("lesao corporal culposa por acidade de transito");
        assert!(corrected);
        assert_eq!(label, "Lesao corporal culposa por acidente de transito");
    }

    #[test]
    fn unmapped_labels_pass_through() {
        assert_eq!(
            normalize_crime("homicidio doloso"),
            ("homicidio doloso".to_string(), false)
        );
        assert_eq!(
            normalize_department("deinter 6 - ribeirao preto"),
            ("deinter 6 - ribeirao preto".to_string(), false)
        );
    }

    #[test]
    fn lookup_ignores_surrounding_whitespace() {
        assert_eq!(
            normalize_crime("  furto - outros  "),
            ("Furto".to_string(), true)
        );
    }

    #[test]
    fn canonical_labels_are_not_remapped() {
        // Already-clean values come back untouched and uncounted.
        assert_eq!(normalize_crime("Furto"), ("Furto".to_string(), false));
        assert_eq!(normalize_department("Dipol"), ("Dipol".to_string(), false));
    }
}
