//! Genus lookup table: botanical genus → German display name.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Genus {
    pub name: &'static str,
    pub display_name: &'static str,
}

const fn g(name: &'static str, display_name: &'static str) -> Genus {
    Genus { name, display_name }
}

// Must stay sorted by name (binary search).
static GENERA: &[Genus] = &[
    g("Abies", "Tanne"),
    g("Acer", "Ahorn"),
    g("Aesculus", "Rosskastanie"),
    g("Ailanthus", "Götterbaum"),
    g("Alnus", "Erle"),
    g("Amelanchier", "Felsenbirne"),
    g("Betula", "Birke"),
    g("Carpinus", "Hainbuche"),
    g("Castanea", "Edelkastanie"),
    g("Catalpa", "Trompetenbaum"),
    g("Celtis", "Zürgelbaum"),
    g("Cercidiphyllum", "Kuchenbaum"),
    g("Chamaecyparis", "Scheinzypresse"),
    g("Cornus", "Hartriegel"),
    g("Corylus", "Hasel"),
    g("Cotoneaster", "Zwergmispel"),
    g("Crataegus", "Weißdorn"),
    g("Elaeagnus", "Ölweide"),
    g("Fagus", "Buche"),
    g("Fraxinus", "Esche"),
    g("Ginkgo", "Ginkgo"),
    g("Gleditsia", "Gleditschie"),
    g("Gymnocladus", "Geweihbaum"),
    g("Ilex", "Stechpalme"),
    g("Juglans", "Walnuss"),
    g("Juniperus", "Wacholder"),
    g("Koelreuteria", "Blasenbaum"),
    g("Laburnum", "Goldregen"),
    g("Larix", "Lärche"),
    g("Liquidambar", "Amberbaum"),
    g("Liriodendron", "Tulpenbaum"),
    g("Magnolia", "Magnolie"),
    g("Malus", "Apfel"),
    g("Metasequoia", "Urweltmammutbaum"),
    g("Morus", "Maulbeere"),
    g("Ostrya", "Hopfenbuche"),
    g("Parrotia", "Parrotie"),
    g("Paulownia", "Blauglockenbaum"),
    g("Picea", "Fichte"),
    g("Pinus", "Kiefer"),
    g("Platanus", "Platane"),
    g("Populus", "Pappel"),
    g("Prunus", "Kirsche"),
    g("Pseudotsuga", "Douglasie"),
    g("Pterocarya", "Flügelnuss"),
    g("Pyrus", "Birne"),
    g("Quercus", "Eiche"),
    g("Rhus", "Sumach"),
    g("Robinia", "Robinie"),
    g("Salix", "Weide"),
    g("Sambucus", "Holunder"),
    g("Sophora", "Schnurbaum"),
    g("Sorbus", "Mehlbeere"),
    g("Styphnolobium", "Schnurbaum"),
    g("Syringa", "Flieder"),
    g("Taxodium", "Sumpfzypresse"),
    g("Taxus", "Eibe"),
    g("Thuja", "Lebensbaum"),
    g("Tilia", "Linde"),
    g("Tsuga", "Hemlocktanne"),
    g("Ulmus", "Ulme"),
    g("Zelkova", "Zelkove"),
];

/// Look up a genus by its botanical name (case-sensitive).
pub fn lookup(name: &str) -> Option<&'static Genus> {
    GENERA
        .binary_search_by(|probe| probe.name.cmp(name))
        .ok()
        .map(|idx| &GENERA[idx])
}
