// src/noyau/polylog.rs
//
// Polylogarithme Li_s(z), |z| < 1, et fonction de Clausen Cl_s(θ), 0 < θ < 2π.
//
// Clausen : développement en série de Taylor autour de 0
//   s pair  : Cl_s(θ) = Σ_{k impair} (−1)^((k−1)/2) ζ(s−k) θ^k / k!
//   s impair: Cl_s(θ) = Σ_{k pair}   (−1)^(k/2)     ζ(s−k) θ^k / k!
// avec le terme k = s−1 (où ζ(s−k) = ζ(1) est un pôle) remplacé par
//   ± θ^(s−1)/(s−1)! · (H_{s−1} − log θ).
// Pour s−k ≤ −1, ζ(s−k) est rationnel exact (nombres tangents) : aucun
// sous-dépassement de θ^k/k!. Convergence géométrique en (θ/2π)².

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

use super::constantes::{ln, nombres_tangents, pi_bits, zeta_bits, zeta_negatif_impair};
use super::erreur::{Erreur, Resultat};
use super::harmonique::harmonique_exact;
use super::precision::Precision;
use super::reel::Reel;

/* ------------------------ Li_s ------------------------ */

/// Li_s(z) = Σ_{n≥1} z^n / n^s, |z| < 1.
pub fn polylog(s: u32, z: &Reel) -> Resultat<Reel> {
    let bits = z.bits();
    if !z.abs_inferieur(&Reel::un(bits)) {
        return Err(Erreur::Domaine(format!(
            "Li_{s}(z) demande |z| < 1 (z = {})",
            z.en_scientifique(8)
        )));
    }

    let mut somme = Reel::zero(bits);
    let mut p = z.clone();
    let mut n: u64 = 1;
    loop {
        let terme = p.div_entier(&BigInt::from(n).pow(s));
        if terme.est_nul() {
            break;
        }
        somme += &terme;
        p = &p * z;
        n += 1;
    }
    Ok(somme)
}

/// Li_s(q) pour un argument rationnel.
pub fn polylog_rationnel(s: u32, q: &BigRational, ctx: Precision) -> Resultat<Reel> {
    polylog(s, &Reel::depuis_rationnel(q, ctx.bits()))
}

/* ------------------------ Clausen ------------------------ */

/// Cl_s(θ) pour s ≥ 1 et 0 < θ < 2π.
pub fn clausen(s: u32, theta: &Reel) -> Resultat<Reel> {
    let bits = theta.bits();
    if s == 0 {
        return Err(Erreur::Domaine("Cl_0 non défini ici (s ≥ 1)".into()));
    }
    let deux_pi = pi_bits(bits).mul_entier(&BigInt::from(2));
    if theta.est_negatif() || theta.est_nul() || theta.compare(&deux_pi).is_ge() {
        return Err(Erreur::Domaine(format!(
            "Cl_{s}(θ) demande 0 < θ < 2π (θ = {})",
            theta.en_scientifique(8)
        )));
    }

    let pair = s % 2 == 0;
    let theta2 = theta.carre();
    let log_theta = ln(theta)?;
    let special = (s - 1) as u64;

    let mut tangents = nombres_tangents(16);

    let mut k: u64 = if pair { 1 } else { 0 };
    let mut pw = if pair { theta.clone() } else { Reel::un(bits) };
    let mut fact = BigInt::one(); // k!

    let mut somme = Reel::zero(bits);
    loop {
        let negatif = if pair {
            ((k - 1) / 2) % 2 == 1
        } else {
            (k / 2) % 2 == 1
        };

        let terme = if k == special {
            let h = Reel::depuis_rationnel(&harmonique_exact(special), bits);
            (&pw * &(&h - &log_theta)).div_entier(&fact)
        } else if k < special {
            // s − k ≥ 3, impair
            let z = zeta_bits(s - k as u32, bits)?;
            (&pw * &z).div_entier(&fact)
        } else {
            // s − k = 1 − 2j
            let j = ((k + 1 - s as u64) / 2) as usize;
            if j >= tangents.len() {
                tangents = nombres_tangents(2 * j + 16);
            }
            let r = zeta_negatif_impair(j, &tangents);
            pw.mul_entier(r.numer()).div_entier(&(r.denom() * &fact))
        };

        if negatif {
            somme -= &terme;
        } else {
            somme += &terme;
        }

        if k > special + 4 && terme.est_nul() {
            break;
        }

        pw = &pw * &theta2;
        fact *= BigInt::from((k + 1) * (k + 2));
        k += 2;
    }
    Ok(somme)
}

/// Cl_s(π/3), la seule valeur dont la base a besoin.
pub fn clausen_pi_sur_3(s: u32, ctx: Precision) -> Resultat<Reel> {
    let bits = ctx.bits();
    clausen(s, &pi_bits(bits).div_entier(&BigInt::from(3)))
}
