//! # Gazetteer
//! Static table of Algeria's 58 wilayas (provinces): official code, canonical
//! name, aliases (French/English spellings, transliterations, Arabic script)
//! and the coordinates used to pin incidents on the map.
//!
//! Pure data. Iteration order is the official code order, which is also the
//! tie-break order used by the location resolver.

use serde::Serialize;

/// Region name reported when no wilaya could be resolved.
pub const UNKNOWN_REGION: &str = "Unknown";

/// One administrative region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub code: u8,
    pub canonical_name: &'static str,
    /// Alternative spellings and translations, canonical name excluded.
    pub aliases: &'static [&'static str],
    pub latitude: f64,
    pub longitude: f64,
}

impl Region {
    /// Canonical name followed by every alias, in table order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.canonical_name).chain(self.aliases.iter().copied())
    }
}

const fn region(
    code: u8,
    canonical_name: &'static str,
    aliases: &'static [&'static str],
    latitude: f64,
    longitude: f64,
) -> Region {
    Region {
        code,
        canonical_name,
        aliases,
        latitude,
        longitude,
    }
}

pub static WILAYAS: [Region; 58] = [
    region(1, "Adrar", &["أدرار"], 27.9744, -0.2841),
    region(2, "Chlef", &["El Asnam", "الشلف"], 36.1652, 1.3369),
    region(3, "Laghouat", &["الأغواط"], 33.8008, 2.8644),
    region(4, "Oum El Bouaghi", &["Oum el Bouaghi", "أم البواقي"], 35.8753, 7.1135),
    region(5, "Batna", &["باتنة"], 35.5559, 6.1741),
    region(6, "Béjaïa", &["Bejaia", "Bgayet", "بجاية"], 36.7525, 5.0626),
    region(7, "Biskra", &["بسكرة"], 34.8481, 5.7244),
    region(8, "Béchar", &["Bechar", "بشار"], 31.6177, -2.2286),
    region(9, "Blida", &["البليدة"], 36.4203, 2.8277),
    region(10, "Bouira", &["البويرة"], 36.3736, 3.9030),
    region(11, "Tamanrasset", &["Tamanghasset", "تمنراست"], 22.7851, 5.5281),
    region(12, "Tébessa", &["Tebessa", "تبسة"], 35.4040, 8.1244),
    region(13, "Tlemcen", &["تلمسان"], 34.8786, -1.3150),
    region(14, "Tiaret", &["تيارت"], 35.3711, 1.3170),
    region(15, "Tizi Ouzou", &["Tizi-Ouzou", "تيزي وزو"], 36.7118, 4.0435),
    region(16, "Algiers", &["Alger", "Dzayer", "الجزائر"], 36.7538, 3.0588),
    region(17, "Djelfa", &["الجلفة"], 34.6814, 3.2631),
    region(18, "Jijel", &["جيجل"], 36.8190, 5.7667),
    region(19, "Sétif", &["Setif", "سطيف"], 36.1914, 5.4072),
    region(20, "Saïda", &["Saida", "سعيدة"], 34.8302, 0.1514),
    region(21, "Skikda", &["سكيكدة"], 36.8760, 6.9095),
    region(22, "Sidi Bel Abbès", &["Sidi Bel Abbes", "سيدي بلعباس"], 35.1977, -0.6388),
    region(23, "Annaba", &["عنابة"], 36.9000, 7.7667),
    region(24, "Guelma", &["قالمة"], 36.4612, 7.4286),
    region(25, "Constantine", &["قسنطينة"], 36.3650, 6.6147),
    region(26, "Médéa", &["Medea", "المدية"], 36.2639, 2.7531),
    region(27, "Mostaganem", &["مستغانم"], 35.9315, 0.0890),
    region(28, "M'Sila", &["Msila", "المسيلة"], 35.7056, 4.5414),
    region(29, "Mascara", &["معسكر"], 35.3968, 0.1407),
    region(30, "Ouargla", &["ورقلة"], 31.9539, 5.3249),
    region(31, "Oran", &["Wahran", "وهران"], 35.6969, -0.6331),
    region(32, "El Bayadh", &["البيض"], 33.6809, 1.0176),
    region(33, "Illizi", &["إليزي"], 26.5044, 8.4667),
    region(34, "Bordj Bou Arréridj", &["Bordj Bou Arreridj", "BBA", "برج بوعريريج"], 36.0731, 4.7689),
    region(35, "Boumerdès", &["Boumerdes", "بومرداس"], 36.7667, 3.4167),
    region(36, "El Tarf", &["الطارف"], 36.7672, 8.3137),
    region(37, "Tindouf", &["تندوف"], 27.6710, -8.1676),
    region(38, "Tissemsilt", &["تيسمسيلت"], 35.6075, 1.8108),
    region(39, "El Oued", &["الوادي"], 33.3564, 6.8531),
    region(40, "Khenchela", &["خنشلة"], 35.4361, 7.1433),
    region(41, "Souk Ahras", &["سوق أهراس"], 36.2864, 7.9511),
    region(42, "Tipaza", &["تيبازة"], 36.5944, 2.4475),
    region(43, "Mila", &["ميلة"], 36.4503, 6.2647),
    region(44, "Aïn Defla", &["Ain Defla", "عين الدفلى"], 36.2639, 1.9675),
    region(45, "Naâma", &["Naama", "النعامة"], 33.2667, -0.3000),
    region(46, "Aïn Témouchent", &["Ain Temouchent", "عين تموشنت"], 35.2981, -1.0411),
    region(47, "Ghardaïa", &["Ghardaia", "غرداية"], 32.4839, 3.6736),
    region(48, "Relizane", &["غليزان"], 35.7364, 0.5564),
    region(49, "Timimoun", &["تيميمون"], 29.2631, 0.2406),
    region(50, "Bordj Badji Mokhtar", &["برج باجي مختار"], 21.3167, 0.9167),
    region(51, "Ouled Djellal", &["أولاد جلال"], 34.4167, 5.0833),
    region(52, "Béni Abbès", &["Beni Abbes", "بني عباس"], 30.1167, -2.1667),
    region(53, "In Salah", &["عين صالح"], 27.2167, 2.4667),
    region(54, "In Guezzam", &["عين قزام"], 19.5667, 5.7667),
    region(55, "Touggourt", &["تقرت"], 33.1167, 6.0667),
    region(56, "Djanet", &["جانت"], 24.5500, 9.4833),
    region(57, "El M'Ghair", &["El Mghair", "المغير"], 33.9500, 5.9167),
    region(58, "El Meniaa", &["المنيعة"], 30.5833, 2.8833),
];

/// Fallback coordinates (Algiers city centre) for incidents without a resolved region.
pub const DEFAULT_LATITUDE: f64 = 36.7538;
pub const DEFAULT_LONGITUDE: f64 = 3.0588;

/// All regions in code order.
pub fn regions() -> &'static [Region] {
    &WILAYAS
}

/// Case-insensitive lookup by canonical name or alias.
pub fn find(name: &str) -> Option<&'static Region> {
    let needle = name.trim().to_lowercase();
    WILAYAS
        .iter()
        .find(|r| r.names().any(|n| n.to_lowercase() == needle))
}

/// Lookup by official code.
pub fn by_code(code: u8) -> Option<&'static Region> {
    WILAYAS.iter().find(|r| r.code == code)
}
