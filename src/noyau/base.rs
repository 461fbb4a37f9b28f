//! Base de poids 6 (21 constantes).
//!
//! Chaque élément est décrit par une liste de facteurs (constante, exposant) ;
//! le poids d'un élément est la somme des poids de ses facteurs, avec
//! ζ(s), Li_s, Cl_s → s, et π, log 2 → 1. Tous les éléments pèsent 6,
//! sauf la constante 1 (poids 0).
//!
//! Les sous-constantes (ζ(3), Cl₂(π/3), …) sont calculées une seule fois par
//! appel, puis combinées.

use std::collections::HashMap;
use tracing::debug;

use super::constantes::{ln2, pi, zeta};
use super::erreur::Resultat;
use super::polylog::{clausen_pi_sur_3, polylog};
use super::precision::{avec_precision, Precision};
use super::reel::Reel;

pub const TAILLE_BASE: usize = 21;

/// Poids commun de la base.
pub const POIDS_BASE: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constante {
    Zeta(u32),
    Pi,
    Ln2,
    /// Li_ordre(1/inverse)
    Li { ordre: u32, inverse: u32 },
    /// Cl_s(π/3)
    Clausen(u32),
}

impl Constante {
    pub fn poids(self) -> u32 {
        match self {
            Self::Zeta(s) | Self::Clausen(s) => s,
            Self::Li { ordre, .. } => ordre,
            Self::Pi | Self::Ln2 => 1,
        }
    }

    fn calculer(self, ctx: Precision) -> Resultat<Reel> {
        match self {
            Self::Zeta(s) => zeta(s, ctx),
            Self::Pi => Ok(pi(ctx)),
            Self::Ln2 => Ok(ln2(ctx)),
            Self::Li { ordre, inverse } => {
                polylog(ordre, &Reel::depuis_ratio(1, inverse, ctx.bits()))
            }
            Self::Clausen(s) => clausen_pi_sur_3(s, ctx),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ElementBase {
    pub etiquette: &'static str,
    pub facteurs: &'static [(Constante, u32)],
}

impl ElementBase {
    pub fn poids(&self) -> u32 {
        self.facteurs.iter().map(|(c, e)| c.poids() * e).sum()
    }
}

use Constante::{Clausen, Li, Ln2, Pi, Zeta};

const LI6_2: Constante = Li { ordre: 6, inverse: 2 };
const LI6_4: Constante = Li { ordre: 6, inverse: 4 };
const LI5_2: Constante = Li { ordre: 5, inverse: 2 };
const LI5_4: Constante = Li { ordre: 5, inverse: 4 };
const LI4_2: Constante = Li { ordre: 4, inverse: 2 };
const LI4_4: Constante = Li { ordre: 4, inverse: 4 };

/// Ordre figé : il indexe les tables de coefficients.
pub const ELEMENTS_BASE: [ElementBase; TAILLE_BASE] = [
    ElementBase { etiquette: "ζ(6)", facteurs: &[(Zeta(6), 1)] },
    ElementBase { etiquette: "ζ(3)²", facteurs: &[(Zeta(3), 2)] },
    ElementBase { etiquette: "ζ(5)log2", facteurs: &[(Zeta(5), 1), (Ln2, 1)] },
    ElementBase { etiquette: "ζ(3)log³2", facteurs: &[(Zeta(3), 1), (Ln2, 3)] },
    ElementBase { etiquette: "π⁴log²2", facteurs: &[(Pi, 4), (Ln2, 2)] },
    ElementBase { etiquette: "π²log⁴2", facteurs: &[(Pi, 2), (Ln2, 4)] },
    ElementBase { etiquette: "log⁶2", facteurs: &[(Ln2, 6)] },
    ElementBase { etiquette: "Li₆(1/2)", facteurs: &[(LI6_2, 1)] },
    ElementBase { etiquette: "Li₆(1/4)", facteurs: &[(LI6_4, 1)] },
    ElementBase { etiquette: "Li₅(1/2)log2", facteurs: &[(LI5_2, 1), (Ln2, 1)] },
    ElementBase { etiquette: "Li₅(1/4)log2", facteurs: &[(LI5_4, 1), (Ln2, 1)] },
    ElementBase { etiquette: "Li₄(1/2)log²2", facteurs: &[(LI4_2, 1), (Ln2, 2)] },
    ElementBase { etiquette: "Li₄(1/4)log²2", facteurs: &[(LI4_4, 1), (Ln2, 2)] },
    ElementBase { etiquette: "π²Li₄(1/2)", facteurs: &[(Pi, 2), (LI4_2, 1)] },
    ElementBase { etiquette: "π²Li₄(1/4)", facteurs: &[(Pi, 2), (LI4_4, 1)] },
    ElementBase { etiquette: "Cl₆(π/3)", facteurs: &[(Clausen(6), 1)] },
    ElementBase { etiquette: "π²Cl₄(π/3)", facteurs: &[(Pi, 2), (Clausen(4), 1)] },
    ElementBase { etiquette: "π⁴Cl₂(π/3)", facteurs: &[(Pi, 4), (Clausen(2), 1)] },
    ElementBase { etiquette: "π²Cl₂(π/3)²", facteurs: &[(Pi, 2), (Clausen(2), 2)] },
    ElementBase { etiquette: "Cl₂(π/3)³", facteurs: &[(Clausen(2), 3)] },
    ElementBase { etiquette: "1", facteurs: &[] },
];

/// Règle de poids : 6 partout, 0 pour la constante finale.
pub fn verifier_poids() -> bool {
    ELEMENTS_BASE.iter().enumerate().all(|(i, e)| {
        let attendu = if i == TAILLE_BASE - 1 { 0 } else { POIDS_BASE };
        e.poids() == attendu
    })
}

pub fn etiquettes() -> [&'static str; TAILLE_BASE] {
    ELEMENTS_BASE.map(|e| e.etiquette)
}

/* ------------------------ Valeurs ------------------------ */

#[derive(Clone, Debug, PartialEq)]
pub struct Base {
    precision: Precision,
    valeurs: Vec<Reel>,
}

impl Base {
    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn valeurs(&self) -> &[Reel] {
        &self.valeurs
    }

    pub fn len(&self) -> usize {
        self.valeurs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valeurs.is_empty()
    }

    pub fn poids(&self) -> [u32; TAILLE_BASE] {
        ELEMENTS_BASE.map(|e| e.poids())
    }

    /// (étiquette, valeur) dans l'ordre de la base.
    pub fn comme_table(&self) -> Vec<(&'static str, &Reel)> {
        ELEMENTS_BASE
            .iter()
            .map(|e| e.etiquette)
            .zip(self.valeurs.iter())
            .collect()
    }
}

/// Les 21 valeurs ω_i à la précision donnée.
pub fn construire_base(ctx: Precision) -> Resultat<Base> {
    let bits = ctx.bits();
    let mut cache: HashMap<Constante, Reel> = HashMap::new();
    let mut valeurs = Vec::with_capacity(TAILLE_BASE);

    for e in &ELEMENTS_BASE {
        let mut v = Reel::un(bits);
        for (c, exposant) in e.facteurs {
            let x = match cache.get(c) {
                Some(x) => x.clone(),
                None => {
                    let x = c.calculer(ctx)?;
                    cache.insert(*c, x.clone());
                    x
                }
            };
            v = &v * &x.puissance(*exposant);
        }
        valeurs.push(v);
    }

    debug!(
        chiffres = ctx.chiffres(),
        sous_constantes = cache.len(),
        "base de poids 6 calculée"
    );
    Ok(Base {
        precision: ctx,
        valeurs,
    })
}

/// Base à P chiffres (P = précision ambiante si None).
pub fn compute_basis(precision: Option<u32>) -> Resultat<Base> {
    avec_precision(precision, construire_base)
}
