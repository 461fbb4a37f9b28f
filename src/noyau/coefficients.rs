// src/noyau/coefficients.rs
//
// Tables de coefficients rationnels c_1..c_21 (une par x supporté) :
//   S(x) = Σ c_i ω_i, ω_i = i-ème élément de la base de poids 6.
//
// Les tables sont figées (numérateur, dénominateur) et exposées en BigRational.
// Point d'entrée : un f64 reconnu à 1e-10 près parmi {1/2, 1/4, −1/2}.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use super::base::TAILLE_BASE;
use super::erreur::{Erreur, Resultat};
use super::precision::Precision;
use super::reel::Reel;

/// Tolérance de reconnaissance des x supportés.
pub const TOLERANCE_X: f64 = 1e-10;

pub const AVAILABLE_X_VALUES: [(&str, f64); 3] = [("1/2", 0.5), ("1/4", 0.25), ("-1/2", -0.5)];

#[rustfmt::skip]
const TABLE_DEMI: [(i64, i64); TAILLE_BASE] = [
    (15683, 14280), (-5743, 14280), (-1593, 4760), (-34213, 14280), (-653, 357),
    (107, 7140), (933, 595), (-4129, 14280), (-5221, 4760), (457, 595),
    (457, 595), (-1868, 1785), (291, 476), (-911, 408), (167, 7140),
    (-619, 408), (-3869, 3570), (15359, 14280), (1007, 2856), (-7613, 7140),
    (-141, 2380),
];

#[rustfmt::skip]
const TABLE_QUART: [(i64, i64); TAILLE_BASE] = [
    (6037, 23939), (540, 23939), (-9470, 23939), (16159, 23939), (-24385, 23939),
    (18371, 23939), (20947, 23939), (1027, 23939), (-8180, 23939), (-39717, 23939),
    (565, 23939), (13069, 23939), (-6410, 23939), (22392, 23939), (-55113, 23939),
    (9961, 23939), (3040, 23939), (391, 647), (-29476, 23939), (-31660, 23939),
    (-6389, 23939),
];

#[rustfmt::skip]
const TABLE_MOINS_DEMI: [(i64, i64); TAILLE_BASE] = [
    (2879, 58060), (139667, 116120), (-44803, 116120), (-20309, 29030), (5495, 23224),
    (-31603, 58060), (-112611, 116120), (5441, 29030), (9087, 116120), (-8581, 116120),
    (46081, 116120), (-26413, 58060), (-61269, 116120), (57493, 58060), (-14287, 11612),
    (-47941, 116120), (-9771, 29030), (4109, 58060), (-83559, 58060), (-6695, 23224),
    (-181073, 116120),
];

/* ------------------------ Points supportés ------------------------ */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointSupporte {
    Demi,
    Quart,
    MoinsDemi,
}

impl PointSupporte {
    pub const TOUS: [PointSupporte; 3] = [Self::Demi, Self::Quart, Self::MoinsDemi];

    pub fn valeur(self) -> f64 {
        match self {
            Self::Demi => 0.5,
            Self::Quart => 0.25,
            Self::MoinsDemi => -0.5,
        }
    }

    pub fn exact(self) -> BigRational {
        let (n, d) = match self {
            Self::Demi => (1, 2),
            Self::Quart => (1, 4),
            Self::MoinsDemi => (-1, 2),
        };
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    pub fn etiquette(self) -> &'static str {
        match self {
            Self::Demi => "1/2",
            Self::Quart => "1/4",
            Self::MoinsDemi => "-1/2",
        }
    }

    /// x reconnu à `TOLERANCE_X` près, sinon erreur listant les valeurs disponibles.
    pub fn depuis_x(x: f64) -> Resultat<Self> {
        Self::TOUS
            .into_iter()
            .find(|p| (p.valeur() - x).abs() < TOLERANCE_X)
            .ok_or_else(|| Erreur::ValeurXNonSupportee {
                x,
                disponibles: AVAILABLE_X_VALUES
                    .iter()
                    .map(|(e, _)| *e)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn table(self) -> &'static [(i64, i64); TAILLE_BASE] {
        match self {
            Self::Demi => &TABLE_DEMI,
            Self::Quart => &TABLE_QUART,
            Self::MoinsDemi => &TABLE_MOINS_DEMI,
        }
    }
}

impl fmt::Display for PointSupporte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.etiquette())
    }
}

/* ------------------------ Table ------------------------ */

#[derive(Clone, Debug, PartialEq)]
pub struct Coefficients {
    point: PointSupporte,
    valeurs: Vec<BigRational>,
}

static TABLES: OnceLock<[Coefficients; 3]> = OnceLock::new();

fn construire(point: PointSupporte) -> Coefficients {
    let valeurs = point
        .table()
        .iter()
        .map(|&(n, d)| BigRational::new(BigInt::from(n), BigInt::from(d)))
        .collect();
    Coefficients { point, valeurs }
}

/// Table du point (construite une seule fois, partagée en lecture).
pub fn coefficients_de(point: PointSupporte) -> &'static Coefficients {
    let tables = TABLES.get_or_init(|| PointSupporte::TOUS.map(construire));
    match point {
        PointSupporte::Demi => &tables[0],
        PointSupporte::Quart => &tables[1],
        PointSupporte::MoinsDemi => &tables[2],
    }
}

/// Les 21 coefficients pour x ∈ {1/2, 1/4, −1/2}.
pub fn get_coefficients(x: f64) -> Resultat<&'static Coefficients> {
    Ok(coefficients_de(PointSupporte::depuis_x(x)?))
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MotifsCoefficients {
    /// dénominateur → nombre d'occurrences
    pub denominateurs: BTreeMap<String, usize>,
    pub denominateur_frequent: (String, usize),
    pub positifs: usize,
    pub negatifs: usize,
    pub nuls: usize,
    pub module_min: f64,
    pub module_max: f64,
    pub module_moyen: f64,
    pub module_ecart_type: f64,
    /// (i, j) avec i < j et c_i = c_j (indices 0-based)
    pub paires_repetees: Vec<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BornesCoefficients {
    pub numerateur_max: String,
    pub numerateur_min: String,
    pub numerateur_moyen: f64,
    pub denominateur_max: String,
    pub denominateur_min: String,
    pub denominateur_moyen: f64,
}

impl Coefficients {
    pub fn point(&self) -> PointSupporte {
        self.point
    }

    pub fn valeurs(&self) -> &[BigRational] {
        &self.valeurs
    }

    pub fn len(&self) -> usize {
        self.valeurs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valeurs.is_empty()
    }

    pub fn en_reels(&self, ctx: Precision) -> Vec<Reel> {
        let bits = ctx.bits();
        self.valeurs
            .iter()
            .map(|c| Reel::depuis_rationnel(c, bits))
            .collect()
    }

    /// (a_0, a_1..a_21) entiers : a_0 = ppcm des dénominateurs, a_i = −a_0 c_i,
    /// de sorte que a_0 S + Σ a_i ω_i = 0.
    pub fn relation_entiere(&self) -> Vec<BigInt> {
        let a0 = self
            .valeurs
            .iter()
            .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
        let mut rel = Vec::with_capacity(self.valeurs.len() + 1);
        rel.push(a0.clone());
        for c in &self.valeurs {
            rel.push(-(c.numer() * (&a0 / c.denom())));
        }
        rel
    }

    pub fn analyser_motifs(&self) -> MotifsCoefficients {
        let mut denominateurs: BTreeMap<String, usize> = BTreeMap::new();
        // ordre d'apparition pour départager les ex æquo
        let mut ordre: Vec<String> = Vec::new();
        for c in &self.valeurs {
            let d = c.denom().to_string();
            if !denominateurs.contains_key(&d) {
                ordre.push(d.clone());
            }
            *denominateurs.entry(d).or_insert(0) += 1;
        }
        let mut frequent = (String::new(), 0usize);
        for d in &ordre {
            let n = denominateurs[d];
            if n > frequent.1 {
                frequent = (d.clone(), n);
            }
        }

        let positifs = self.valeurs.iter().filter(|c| c.is_positive()).count();
        let negatifs = self.valeurs.iter().filter(|c| c.is_negative()).count();
        let nuls = self.valeurs.len() - positifs - negatifs;

        let modules: Vec<f64> = self
            .valeurs
            .iter()
            .map(|c| c.abs().to_f64().unwrap_or(f64::NAN))
            .collect();
        let (moyen, ecart) = moyenne_ecart(&modules);

        let mut paires_repetees = Vec::new();
        for i in 0..self.valeurs.len() {
            for j in i + 1..self.valeurs.len() {
                if self.valeurs[i] == self.valeurs[j] {
                    paires_repetees.push((i, j));
                }
            }
        }

        MotifsCoefficients {
            denominateurs,
            denominateur_frequent: frequent,
            positifs,
            negatifs,
            nuls,
            module_min: modules.iter().copied().fold(f64::INFINITY, f64::min),
            module_max: modules.iter().copied().fold(0.0, f64::max),
            module_moyen: moyen,
            module_ecart_type: ecart,
            paires_repetees,
        }
    }

    pub fn bornes(&self) -> BornesCoefficients {
        let nums: Vec<BigInt> = self.valeurs.iter().map(|c| c.numer().abs()).collect();
        let dens: Vec<BigInt> = self.valeurs.iter().map(|c| c.denom().clone()).collect();
        let texte = |v: Option<&BigInt>| v.map(|b| b.to_string()).unwrap_or_default();
        let moy = |v: &[BigInt]| {
            let f: Vec<f64> = v.iter().map(|b| b.to_f64().unwrap_or(f64::NAN)).collect();
            moyenne_ecart(&f).0
        };
        BornesCoefficients {
            numerateur_max: texte(nums.iter().max()),
            numerateur_min: texte(nums.iter().min()),
            numerateur_moyen: moy(&nums),
            denominateur_max: texte(dens.iter().max()),
            denominateur_min: texte(dens.iter().min()),
            denominateur_moyen: moy(&dens),
        }
    }
}

fn moyenne_ecart(v: &[f64]) -> (f64, f64) {
    if v.is_empty() {
        return (0.0, 0.0);
    }
    let n = v.len() as f64;
    let m = v.iter().sum::<f64>() / n;
    let var = v.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n;
    (m, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(n: i64, d: i64) -> BigRational {
        BigRational::new(n.into(), d.into())
    }

    #[test]
    fn tables_figees() {
        let c = get_coefficients(0.5).unwrap();
        assert_eq!(c.len(), 21);
        assert_eq!(c.valeurs()[0], q(15683, 14280));
        assert_eq!(c.valeurs()[20], q(-141, 2380));

        let c = get_coefficients(0.25).unwrap();
        assert_eq!(c.valeurs()[17], q(391, 647));
        assert_eq!(c.valeurs()[14], q(-55113, 23939));

        let c = get_coefficients(-0.5).unwrap();
        assert_eq!(c.valeurs()[1], q(139667, 116120));
        assert_eq!(c.valeurs()[20], q(-181073, 116120));
    }

    #[test]
    fn reconnaissance_tolerante() {
        assert_eq!(
            get_coefficients(0.5 + 1e-12).unwrap().point(),
            PointSupporte::Demi
        );
        assert_eq!(
            get_coefficients(-0.5).unwrap().point(),
            PointSupporte::MoinsDemi
        );
        match get_coefficients(0.3) {
            Err(Erreur::ValeurXNonSupportee { x, disponibles }) => {
                assert_eq!(x, 0.3);
                assert_eq!(disponibles, "1/2, 1/4, -1/2");
            }
            autre => panic!("attendu ValeurXNonSupportee, obtenu {autre:?}"),
        }
        assert!(get_coefficients(0.5 + 1e-9).is_err());
    }

    #[test]
    fn memes_tables_a_chaque_appel() {
        let a = get_coefficients(0.25).unwrap();
        let b = get_coefficients(0.25).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn relation_entiere_coherente() {
        for p in PointSupporte::TOUS {
            let c = coefficients_de(p);
            let rel = c.relation_entiere();
            assert_eq!(rel.len(), 22);
            let a0 = &rel[0];
            assert!(a0.is_positive());
            for (i, ci) in c.valeurs().iter().enumerate() {
                assert_eq!(
                    BigRational::new(-rel[i + 1].clone(), a0.clone()),
                    *ci,
                    "{p} c_{}",
                    i + 1
                );
            }
        }
        assert_eq!(coefficients_de(PointSupporte::Quart).relation_entiere()[0], BigInt::from(23939));
        assert_eq!(coefficients_de(PointSupporte::Demi).relation_entiere()[0], BigInt::from(14280));
        assert_eq!(coefficients_de(PointSupporte::MoinsDemi).relation_entiere()[0], BigInt::from(116120));
    }

    #[test]
    fn motifs_demi() {
        let m = coefficients_de(PointSupporte::Demi).analyser_motifs();
        assert_eq!(m.positifs + m.negatifs + m.nuls, 21);
        assert_eq!(m.nuls, 0);
        // c_10 = c_11 = 457/595
        assert!(m.paires_repetees.contains(&(9, 10)));
        assert_eq!(m.denominateur_frequent, ("14280".to_string(), 5));
        assert!(m.module_min > 0.0 && m.module_max < 2.5);
    }

    #[test]
    fn motifs_quart() {
        let m = coefficients_de(PointSupporte::Quart).analyser_motifs();
        assert_eq!(m.denominateur_frequent, ("23939".to_string(), 20));
        assert_eq!(m.denominateurs.len(), 2);
        let b = coefficients_de(PointSupporte::Quart).bornes();
        assert_eq!(b.numerateur_max, "55113");
        assert_eq!(b.denominateur_min, "647");
    }

    #[test]
    fn point_exact() {
        assert_eq!(PointSupporte::MoinsDemi.exact(), q(-1, 2));
        assert_eq!(PointSupporte::Quart.to_string(), "1/4");
    }
}
