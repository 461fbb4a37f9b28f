// src/noyau/harmonique.rs
//
// Nombres harmoniques H_n = 1 + 1/2 + … + 1/n (H_0 = 0).
// - exact (rationnel) pour les petits n
// - incrémental en virgule fixe pour la série

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};

use super::erreur::Resultat;
use super::precision::avec_precision;
use super::reel::Reel;

pub fn harmonique_exact(n: u64) -> BigRational {
    (1..=n).fold(BigRational::zero(), |acc, k| {
        acc + BigRational::new(BigInt::one(), BigInt::from(k))
    })
}

/// H_n mis à jour terme à terme : `avancer` passe de H_{n−1} à H_n.
#[derive(Clone, Debug)]
pub struct Harmonique {
    n: u64,
    valeur: Reel,
}

impl Harmonique {
    pub fn new(bits: u32) -> Self {
        Self {
            n: 0,
            valeur: Reel::zero(bits),
        }
    }

    pub fn indice(&self) -> u64 {
        self.n
    }

    pub fn valeur(&self) -> &Reel {
        &self.valeur
    }

    pub fn avancer(&mut self) {
        self.n += 1;
        let inv = Reel::depuis_ratio(1, self.n, self.valeur.bits());
        self.valeur += &inv;
    }
}

/// H_n à la précision demandée (ou ambiante).
pub fn harmonic(n: u64, precision: Option<u32>) -> Resultat<Reel> {
    avec_precision(precision, |ctx| {
        let mut h = Harmonique::new(ctx.bits());
        while h.indice() < n {
            h.avancer();
        }
        Ok(h.valeur)
    })
}

/// [H_1, …, H_n].
pub fn harmonic_sequence(n_max: u64, precision: Option<u32>) -> Resultat<Vec<Reel>> {
    avec_precision(precision, |ctx| {
        let mut h = Harmonique::new(ctx.bits());
        let mut v = Vec::with_capacity(n_max as usize);
        for _ in 0..n_max {
            h.avancer();
            v.push(h.valeur().clone());
        }
        Ok(v)
    })
}
