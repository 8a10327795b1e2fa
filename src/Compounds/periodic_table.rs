//! Standard atomic weights (IUPAC, abridged to five significant figures).
//! For elements without stable isotopes the mass number of the longest-lived isotope is used.

/// element symbol and its standard atomic weight, g/mol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub name: &'static str,
    pub atomic_mass: f64,
}

/// all 118 elements in order of atomic number
pub const ELEMENTS: &[Element] = &[
    Element { name: "H", atomic_mass: 1.008 },
    Element { name: "He", atomic_mass: 4.0026 },
    Element { name: "Li", atomic_mass: 6.94 },
    Element { name: "Be", atomic_mass: 9.0122 },
    Element { name: "B", atomic_mass: 10.81 },
    Element { name: "C", atomic_mass: 12.011 },
    Element { name: "N", atomic_mass: 14.007 },
    Element { name: "O", atomic_mass: 15.999 },
    Element { name: "F", atomic_mass: 18.998 },
    Element { name: "Ne", atomic_mass: 20.18 },
    Element { name: "Na", atomic_mass: 22.99 },
    Element { name: "Mg", atomic_mass: 24.305 },
    Element { name: "Al", atomic_mass: 26.982 },
    Element { name: "Si", atomic_mass: 28.085 },
    Element { name: "P", atomic_mass: 30.974 },
    Element { name: "S", atomic_mass: 32.06 },
    Element { name: "Cl", atomic_mass: 35.45 },
    Element { name: "Ar", atomic_mass: 39.948 },
    Element { name: "K", atomic_mass: 39.098 },
    Element { name: "Ca", atomic_mass: 40.078 },
    Element { name: "Sc", atomic_mass: 44.956 },
    Element { name: "Ti", atomic_mass: 47.867 },
    Element { name: "V", atomic_mass: 50.942 },
    Element { name: "Cr", atomic_mass: 51.996 },
    Element { name: "Mn", atomic_mass: 54.938 },
    Element { name: "Fe", atomic_mass: 55.845 },
    Element { name: "Co", atomic_mass: 58.933 },
    Element { name: "Ni", atomic_mass: 58.693 },
    Element { name: "Cu", atomic_mass: 63.546 },
    Element { name: "Zn", atomic_mass: 65.38 },
    Element { name: "Ga", atomic_mass: 69.723 },
    Element { name: "Ge", atomic_mass: 72.63 },
    Element { name: "As", atomic_mass: 74.922 },
    Element { name: "Se", atomic_mass: 78.971 },
    Element { name: "Br", atomic_mass: 79.904 },
    Element { name: "Kr", atomic_mass: 83.798 },
    Element { name: "Rb", atomic_mass: 85.468 },
    Element { name: "Sr", atomic_mass: 87.62 },
    Element { name: "Y", atomic_mass: 88.906 },
    Element { name: "Zr", atomic_mass: 91.224 },
    Element { name: "Nb", atomic_mass: 92.906 },
    Element { name: "Mo", atomic_mass: 95.95 },
    Element { name: "Tc", atomic_mass: 98.0 },
    Element { name: "Ru", atomic_mass: 101.07 },
    Element { name: "Rh", atomic_mass: 102.91 },
    Element { name: "Pd", atomic_mass: 106.42 },
    Element { name: "Ag", atomic_mass: 107.87 },
    Element { name: "Cd", atomic_mass: 112.41 },
    Element { name: "In", atomic_mass: 114.82 },
    Element { name: "Sn", atomic_mass: 118.71 },
    Element { name: "Sb", atomic_mass: 121.76 },
    Element { name: "Te", atomic_mass: 127.6 },
    Element { name: "I", atomic_mass: 126.9 },
    Element { name: "Xe", atomic_mass: 131.29 },
    Element { name: "Cs", atomic_mass: 132.91 },
    Element { name: "Ba", atomic_mass: 137.33 },
    Element { name: "La", atomic_mass: 138.91 },
    Element { name: "Ce", atomic_mass: 140.12 },
    Element { name: "Pr", atomic_mass: 140.91 },
    Element { name: "Nd", atomic_mass: 144.24 },
    Element { name: "Pm", atomic_mass: 145.0 },
    Element { name: "Sm", atomic_mass: 150.36 },
    Element { name: "Eu", atomic_mass: 151.96 },
    Element { name: "Gd", atomic_mass: 157.25 },
    Element { name: "Tb", atomic_mass: 158.93 },
    Element { name: "Dy", atomic_mass: 162.5 },
    Element { name: "Ho", atomic_mass: 164.93 },
    Element { name: "Er", atomic_mass: 167.26 },
    Element { name: "Tm", atomic_mass: 168.93 },
    Element { name: "Yb", atomic_mass: 173.05 },
    Element { name: "Lu", atomic_mass: 174.97 },
    Element { name: "Hf", atomic_mass: 178.49 },
    Element { name: "Ta", atomic_mass: 180.95 },
    Element { name: "W", atomic_mass: 183.84 },
    Element { name: "Re", atomic_mass: 186.21 },
    Element { name: "Os", atomic_mass: 190.23 },
    Element { name: "Ir", atomic_mass: 192.22 },
    Element { name: "Pt", atomic_mass: 195.08 },
    Element { name: "Au", atomic_mass: 196.97 },
    Element { name: "Hg", atomic_mass: 200.59 },
    Element { name: "Tl", atomic_mass: 204.38 },
    Element { name: "Pb", atomic_mass: 207.2 },
    Element { name: "Bi", atomic_mass: 208.98 },
    Element { name: "Po", atomic_mass: 209.0 },
    Element { name: "At", atomic_mass: 210.0 },
    Element { name: "Rn", atomic_mass: 222.0 },
    Element { name: "Fr", atomic_mass: 223.0 },
    Element { name: "Ra", atomic_mass: 226.0 },
    Element { name: "Ac", atomic_mass: 227.0 },
    Element { name: "Th", atomic_mass: 232.04 },
    Element { name: "Pa", atomic_mass: 231.04 },
    Element { name: "U", atomic_mass: 238.03 },
    Element { name: "Np", atomic_mass: 237.0 },
    Element { name: "Pu", atomic_mass: 244.0 },
    Element { name: "Am", atomic_mass: 243.0 },
    Element { name: "Cm", atomic_mass: 247.0 },
    Element { name: "Bk", atomic_mass: 247.0 },
    Element { name: "Cf", atomic_mass: 251.0 },
    Element { name: "Es", atomic_mass: 252.0 },
    Element { name: "Fm", atomic_mass: 257.0 },
    Element { name: "Md", atomic_mass: 258.0 },
    Element { name: "No", atomic_mass: 259.0 },
    Element { name: "Lr", atomic_mass: 266.0 },
    Element { name: "Rf", atomic_mass: 267.0 },
    Element { name: "Db", atomic_mass: 268.0 },
    Element { name: "Sg", atomic_mass: 269.0 },
    Element { name: "Bh", atomic_mass: 270.0 },
    Element { name: "Hs", atomic_mass: 269.0 },
    Element { name: "Mt", atomic_mass: 278.0 },
    Element { name: "Ds", atomic_mass: 281.0 },
    Element { name: "Rg", atomic_mass: 282.0 },
    Element { name: "Cn", atomic_mass: 285.0 },
    Element { name: "Nh", atomic_mass: 286.0 },
    Element { name: "Fl", atomic_mass: 289.0 },
    Element { name: "Mc", atomic_mass: 290.0 },
    Element { name: "Lv", atomic_mass: 293.0 },
    Element { name: "Ts", atomic_mass: 294.0 },
    Element { name: "Og", atomic_mass: 294.0 },
];

/// looks an element up by its symbol (case sensitive)
pub fn find_element(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|element| element.name == symbol)
}

/// atomic number of an element, 1-based
pub fn atomic_number(symbol: &str) -> Option<usize> {
    ELEMENTS
        .iter()
        .position(|element| element.name == symbol)
        .map(|i| i + 1)
}
