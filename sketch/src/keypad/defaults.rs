//! Keypad par défaut, chargé à la création d'une base vide

use super::model::Category;
use crate::SketchError;

type DefaultCategory = (&'static str, bool, &'static str, &'static [&'static str]);

pub static DEFAULT_KEYPAD: &[DefaultCategory] = &[
    ("BMAD", false, "#FFC0CB", &["Discolour", "BMAD_L", "BMAD_M", "BMAD_H", "Stags", "Other"]),
    (
        "EUCS",
        false,
        "#00FF00",
        &["Creiis_", "Discolour_", "Defol_", "KLD_", "MLD_", "BMAD_", "QSB_", "WinterBB_"],
    ),
    ("DEAD", false, "#FF9595", &["D-tr_", "D-to_", "D-ti_", "D-tr-to-ti_"]),
    ("NEEDLES", false, "#FFFFA4", &["Dothi_", "Essi_", "Yelo_", "Brown_"]),
    ("NUT-DEF", false, "#FFA4E1", &["B-def_", "Mg-K-def_", "Nut-def_", "N-def"]),
    ("WEEDS", false, "#7AB47A", &["Weeds_"]),
    ("POSSUM", false, "#FFA500", &["Poss_"]),
    ("SPH", false, "#D3D3D3", &["SPH_"]),
    ("INCIDENCE", false, "#FFFFE0", &["1-5%", "5-15%", "15-30%", "30-45%", "45-75%", ">75%"]),
    ("CLIMATE", false, "#D5D5D5", &["Frost_", "Fire_", "Snow_", "Wind_", "L_", "Hail_"]),
    ("SEVERITY", false, "#ADD8E6", &["Low", "Moderate", "High", "Extreme"]),
    (
        "GROUND",
        false,
        "#FFFFFF",
        &["_Sirex", "_Drought", "_Root-H2O", "_Cyc", "_Essi", "_Herb", "_Etops", "_Yel-Tops"],
    ),
    (
        "Defoliating pests",
        false,
        "#FFA07A",
        &[
            "Trace (0-10%)",
            "Trace low",
            "Low (10-20%)",
            "Low Medium",
            "Medium (20-40%)",
            "Medium High",
            "High (40-50%)",
            "Severe (>50%)",
        ],
    ),
    (
        "Ips and Diplodia",
        false,
        "#90EE90",
        &[
            "Trace (<1- 2%)",
            "Low (3 - 5%)",
            "Medium (5 - 10%)",
            "High (11 - 15%)",
            "Severe (>15%)",
        ],
    ),
    ("Sirex", false, "#87CEFA", &["Low (<1%)", "Medium (1-3%)", "Severe (>3%)"]),
];

/// Catégories par défaut, dans l'ordre d'affichage
///
/// Échoue sur la première entrée invalide de la table.
pub fn default_categories() -> Result<Vec<Category>, SketchError> {
    DEFAULT_KEYPAD.iter().map(|&entry| Category::try_from(entry)).collect()
}
