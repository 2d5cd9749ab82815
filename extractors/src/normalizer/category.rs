use shared_types::Category;

/// Typos, English terms and common slang mapped onto the canonical vocabulary.
const CATEGORY_ALIASES: &[(&str, Category)] = &[
    // Typos and short forms
    ("mkn", Category::Makan),
    ("minum", Category::Minuman),
    ("transport", Category::Transportasi),
    ("bill", Category::Tagihan),
    ("health", Category::Kesehatan),
    ("salary", Category::Gaji),
    // English
    ("food", Category::Makan),
    ("drink", Category::Minuman),
    ("shopping", Category::Belanja),
    ("entertainment", Category::Hiburan),
    ("education", Category::Pendidikan),
    ("saving", Category::Tabungan),
    ("savings", Category::Tabungan),
    ("investment", Category::Investasi),
    // Everyday wording
    ("jajan", Category::Makan),
    ("bensin", Category::Transportasi),
    ("ojol", Category::Transportasi),
    ("parkir", Category::Transportasi),
    ("wifi", Category::Tagihan),
    ("listrik", Category::Tagihan),
    ("air", Category::Tagihan),
    ("pulsa", Category::Tagihan),
    ("game", Category::Hiburan),
    ("nonton", Category::Hiburan),
    ("obat", Category::Kesehatan),
    ("dokter", Category::Kesehatan),
    ("sekolah", Category::Pendidikan),
    ("kursus", Category::Pendidikan),
    ("gaji bulanan", Category::Gaji),
    ("transfer uang", Category::Transfer),
    ("nabung", Category::Tabungan),
    ("invest", Category::Investasi),
    ("saham", Category::Investasi),
    ("reksadana", Category::Investasi),
    ("crypto", Category::Investasi),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryNormalization {
    pub normalized: Category,
    pub was_corrected: bool,
}

/// Maps free-text model output onto the canonical category vocabulary.
///
/// Total: every input, including empty text, yields a canonical category.
pub fn normalize_category(text: &str) -> CategoryNormalization {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return CategoryNormalization {
            normalized: Category::Lainnya,
            was_corrected: true,
        };
    }

    if let Ok(category) = needle.parse::<Category>() {
        return CategoryNormalization {
            normalized: category,
            was_corrected: false,
        };
    }

    let normalized = CATEGORY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == needle)
        .map(|(_, category)| *category)
        .unwrap_or(Category::Lainnya);

    CategoryNormalization {
        normalized,
        was_corrected: true,
    }
}
