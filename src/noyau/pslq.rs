//! Recherche de relation entière (PSLQ de Ferguson–Bailey), en virgule fixe.
//!
//! Données : x_0..x_{n−1} réels. Résultat : a ∈ Zⁿ non nul, max|a_i| < max_coeff,
//! avec |Σ a_i x_i| sous la tolérance 2^-(fraction · P · log2 10).
//!
//! Issues possibles (aucune n'est une erreur) :
//! - relation trouvée (signe normalisé : premier coefficient non nul positif)
//! - borne inférieure de la norme ≥ max_coeff : aucune relation assez petite
//! - précision épuisée (rotation dégénérée)
//! - itérations épuisées
//! - une des valeurs est nulle ou négligeable

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

use super::erreur::{Erreur, Resultat};
use super::precision::Precision;
use super::reel::Reel;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BornesRecherche {
    pub max_coeff: u64,
    pub max_iterations: usize,
    /// tolérance = 10^-(fraction · P)
    pub fraction_tolerance: f64,
}

impl Default for BornesRecherche {
    fn default() -> Self {
        Self {
            max_coeff: 1_000_000,
            max_iterations: 30_000,
            fraction_tolerance: 0.75,
        }
    }
}

impl BornesRecherche {
    pub fn validate(&self) -> Resultat<()> {
        if self.max_coeff < 2 {
            return Err(Erreur::Config("max_coeff doit être ≥ 2".into()));
        }
        if self.max_iterations == 0 {
            return Err(Erreur::Config("max_iterations doit être ≥ 1".into()));
        }
        if !(self.fraction_tolerance > 0.0 && self.fraction_tolerance < 1.0) {
            return Err(Erreur::Config(format!(
                "fraction_tolerance hors de ]0, 1[ : {}",
                self.fraction_tolerance
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum IssueRecherche {
    Trouvee {
        relation: Vec<BigInt>,
        iterations: usize,
    },
    NormeDepassee {
        iterations: usize,
    },
    PrecisionEpuisee {
        iterations: usize,
    },
    IterationsEpuisees,
    ValeurNegligeable,
}

impl IssueRecherche {
    pub fn relation(self) -> Option<Vec<BigInt>> {
        match self {
            Self::Trouvee { relation, .. } => Some(relation),
            _ => None,
        }
    }

    pub fn resume(&self) -> String {
        match self {
            Self::Trouvee { iterations, .. } => format!("relation trouvée en {iterations} itérations"),
            Self::NormeDepassee { iterations } => {
                format!("borne de norme dépassée après {iterations} itérations")
            }
            Self::PrecisionEpuisee { iterations } => {
                format!("précision épuisée après {iterations} itérations")
            }
            Self::IterationsEpuisees => "itérations épuisées".to_string(),
            Self::ValeurNegligeable => "une valeur est nulle ou négligeable".to_string(),
        }
    }
}

/* ------------------------ État de l'algorithme ------------------------ */

struct Pslq {
    n: usize,
    y: Vec<Reel>,
    /// n × (n−1)
    h: Vec<Vec<Reel>>,
    /// n × n, les relations candidates sont ses colonnes
    b: Vec<Vec<BigInt>>,
}

fn racine(v: &Reel) -> Reel {
    v.racine().unwrap_or_else(|| Reel::zero(v.bits()))
}

impl Pslq {
    fn initialiser(x: &[Reel], bits: u32) -> Option<Self> {
        let n = x.len();

        // s_k = √(Σ_{j≥k} x_j²)
        let mut s = vec![Reel::zero(bits); n];
        let mut acc = Reel::zero(bits);
        for k in (0..n).rev() {
            acc += &x[k].carre();
            s[k] = racine(&acc);
        }
        let t = s[0].clone();
        let y = x
            .iter()
            .map(|v| v.divise(&t))
            .collect::<Option<Vec<_>>>()?;
        let s = s
            .iter()
            .map(|v| v.divise(&t))
            .collect::<Option<Vec<_>>>()?;

        let mut h = vec![vec![Reel::zero(bits); n - 1]; n];
        for i in 0..n {
            if i < n - 1 && !s[i].est_nul() {
                h[i][i] = s[i + 1].divise(&s[i])?;
            }
            for j in 0..i {
                let sjj1 = &s[j] * &s[j + 1];
                if let Some(v) = (-(&y[i] * &y[j])).divise(&sjj1) {
                    h[i][j] = v;
                }
            }
        }

        let mut b = vec![vec![BigInt::zero(); n]; n];
        for (i, ligne) in b.iter_mut().enumerate() {
            ligne[i] = BigInt::one();
        }

        let mut etat = Self { n, y, h, b };
        for i in 1..n {
            for j in (0..i).rev() {
                etat.reduire(i, j);
            }
        }
        Some(etat)
    }

    /// Réduction de la ligne i par la ligne j (H[j][j] ≠ 0) ; false si H[j][j] = 0.
    fn reduire(&mut self, i: usize, j: usize) -> bool {
        let Some(q) = self.h[i][j].divise(&self.h[j][j]) else {
            return false;
        };
        let t = q.arrondi_entier();
        if t.is_zero() {
            return true;
        }
        let dy = self.y[i].mul_entier(&t);
        self.y[j] += &dy;
        for k in 0..=j {
            let d = self.h[j][k].mul_entier(&t);
            self.h[i][k] -= &d;
        }
        for k in 0..self.n {
            let d = &self.b[k][i] * &t;
            self.b[k][j] += d;
        }
        true
    }

    fn echanger(&mut self, m: usize) {
        self.y.swap(m, m + 1);
        self.h.swap(m, m + 1);
        for ligne in self.b.iter_mut() {
            ligne.swap(m, m + 1);
        }
    }

    /// Rotation qui rétablit la forme triangulaire après l'échange ; false si dégénérée.
    fn tourner(&mut self, m: usize) -> bool {
        let a = &self.h[m][m];
        let c = &self.h[m][m + 1];
        let t0 = racine(&(a.carre() + c.carre()));
        let (Some(t1), Some(t2)) = (a.divise(&t0), c.divise(&t0)) else {
            return false;
        };
        for i in m..self.n {
            let t3 = self.h[i][m].clone();
            let t4 = self.h[i][m + 1].clone();
            self.h[i][m] = &t1 * &t3 + &t2 * &t4;
            self.h[i][m + 1] = &t1 * &t4 - &t2 * &t3;
        }
        true
    }

    fn colonne(&self, i: usize) -> Vec<BigInt> {
        self.b.iter().map(|ligne| ligne[i].clone()).collect()
    }

    fn max_h(&self) -> Reel {
        let bits = self.y[0].bits();
        self.h
            .iter()
            .flatten()
            .map(Reel::abs)
            .max_by(|a, b| a.compare(b))
            .unwrap_or_else(|| Reel::zero(bits))
    }
}

/// Premier coefficient non nul positif.
pub fn normaliser_signe(mut relation: Vec<BigInt>) -> Vec<BigInt> {
    if relation
        .iter()
        .find(|a| !a.is_zero())
        .is_some_and(|a| a.is_negative())
    {
        for a in relation.iter_mut() {
            *a = -&*a;
        }
    }
    relation
}

/// PSLQ complet, avec l'issue détaillée.
pub fn rechercher_relation(
    valeurs: &[Reel],
    ctx: Precision,
    bornes: &BornesRecherche,
) -> Resultat<IssueRecherche> {
    let n = valeurs.len();
    if n < 2 {
        return Err(Erreur::Dimension(format!(
            "PSLQ demande au moins 2 valeurs ({n} reçue(s))"
        )));
    }
    bornes.validate()?;

    let bits = ctx.bits();
    let x: Vec<Reel> = valeurs.iter().map(|v| v.a_bits(bits)).collect();

    let tol_bits = (bornes.fraction_tolerance
        * ctx.chiffres() as f64
        * std::f64::consts::LOG2_10) as u32;
    let tol = Reel::depuis_mantisse(BigInt::one() << bits.saturating_sub(tol_bits), bits);
    let max_coeff = BigInt::from(bornes.max_coeff);

    let seuil_min = tol.div_entier(&BigInt::from(100));
    if x.iter().any(|v| v.est_nul() || v.abs_inferieur(&seuil_min)) {
        return Ok(IssueRecherche::ValeurNegligeable);
    }

    let Some(mut etat) = Pslq::initialiser(&x, bits) else {
        return Ok(IssueRecherche::ValeurNegligeable);
    };

    // γ^(i+1), γ = √(4/3)
    let gamma = racine(&Reel::depuis_ratio(4, 3, bits));
    let mut puissances = Vec::with_capacity(n - 1);
    let mut g = gamma.clone();
    for _ in 0..n - 1 {
        puissances.push(g.clone());
        g = &g * &gamma;
    }
    let un = Reel::un(bits);
    let borne_norme = BigInt::from(100) * &max_coeff;

    for iteration in 1..=bornes.max_iterations {
        // 1. ligne à échanger
        let mut m = 0;
        let mut sz_max: Option<Reel> = None;
        for (i, gi) in puissances.iter().enumerate() {
            let sz = gi * &etat.h[i][i].abs();
            if sz_max
                .as_ref()
                .map_or(true, |s| sz.compare(s) == Ordering::Greater)
            {
                m = i;
                sz_max = Some(sz);
            }
        }

        // 2. échange
        etat.echanger(m);

        // 3. rotation (sauf pour l'avant-dernière ligne)
        if m + 2 < n && !etat.tourner(m) {
            debug!(iteration, "PSLQ : précision épuisée");
            return Ok(IssueRecherche::PrecisionEpuisee {
                iterations: iteration,
            });
        }

        // 4. réduction
        for i in m + 1..n {
            for j in (0..=(i - 1).min(m + 1)).rev() {
                if !etat.reduire(i, j) {
                    break;
                }
            }
        }

        // 5. relation ?
        for i in 0..n {
            if etat.y[i].abs_inferieur(&tol) {
                let rel = etat.colonne(i);
                if rel.iter().all(|a| a.abs() < max_coeff) && rel.iter().any(|a| !a.is_zero()) {
                    debug!(iteration, "PSLQ : relation trouvée");
                    return Ok(IssueRecherche::Trouvee {
                        relation: normaliser_signe(rel),
                        iterations: iteration,
                    });
                }
            }
        }

        // 6. borne inférieure de la norme : 1 / max|H|
        let r = etat.max_h();
        if r.est_nul() || r.mul_entier(&borne_norme).compare(&un) != Ordering::Greater {
            debug!(iteration, "PSLQ : borne de norme atteinte");
            return Ok(IssueRecherche::NormeDepassee {
                iterations: iteration,
            });
        }
    }

    Ok(IssueRecherche::IterationsEpuisees)
}

/// Relation entière ou None.
pub fn pslq(
    valeurs: &[Reel],
    ctx: Precision,
    bornes: &BornesRecherche,
) -> Resultat<Option<Vec<BigInt>>> {
    Ok(rechercher_relation(valeurs, ctx, bornes)?.relation())
}
