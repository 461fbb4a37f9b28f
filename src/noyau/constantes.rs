// src/noyau/constantes.rs
//
// Constantes classiques en virgule fixe : π, log 2, log, ζ(s).
//
// - π : Machin, 16·atan(1/5) − 4·atan(1/239), avec cache par grille
// - log 2 = 2·atanh(1/3) (même série que atan, sans alternance)
// - ζ pair : nombres tangents (exact) × π^s
// - ζ impair : accélération de Borwein (série alternée de η)
// - ζ(1 − 2j) : rationnel exact, pour Clausen

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Zero};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use super::erreur::{Erreur, Resultat};
use super::precision::Precision;
use super::reel::Reel;

/// log2(3 + √8) : gain en bits par terme de la série de Borwein.
const GAIN_BORWEIN: f64 = 2.543_106_606_327_965;

/// Bits de garde pour les séries internes.
const EXTRA: u32 = 10;

/* ------------------------ Séries atan / atanh ------------------------ */

/// atan(1/q) (ou atanh(1/q) si `alterne` est faux) en entier scalé par 2^bits,
/// série z − z^3/3 + z^5/5 − …
fn serie_inverse(q: u64, bits: u32, alterne: bool) -> BigInt {
    let q = BigInt::from(q);
    let q2 = &q * &q;
    let un = BigInt::one() << bits;

    let mut k: u64 = 0;
    let mut sign_pos = true;

    // q^(2k+1)
    let mut q_pow = q.clone();
    let mut sum = BigInt::zero();

    loop {
        let d = &q_pow * BigInt::from(2 * k + 1);
        let term = &un / &d;
        if term.is_zero() {
            break;
        }

        if sign_pos || !alterne {
            sum += &term;
        } else {
            sum -= &term;
        }

        q_pow *= &q2;
        sign_pos = !sign_pos;
        k += 1;
    }

    sum
}

/// atan(1/q), q ≥ 2.
pub fn atan_inverse(q: u64, ctx: Precision) -> Reel {
    let bits = ctx.bits();
    let v = serie_inverse(q.max(2), bits + EXTRA, true);
    Reel::depuis_mantisse(v >> EXTRA, bits)
}

/* ------------------------ π (Machin) + cache ------------------------ */

fn pi_compute(bits: u32) -> BigInt {
    let b = bits + EXTRA;
    let a = serie_inverse(5, b, true);
    let c = serie_inverse(239, b, true);
    let pi = BigInt::from(16) * a - BigInt::from(4) * c;
    pi >> EXTRA
}

static PI_CACHE: OnceLock<Mutex<HashMap<u32, BigInt>>> = OnceLock::new();

pub(crate) fn pi_bits(bits: u32) -> Reel {
    let m = PI_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    // un cache empoisonné reste cohérent : on reprend la table telle quelle
    let mut guard = m.lock().unwrap_or_else(|e| e.into_inner());

    if let Some(v) = guard.get(&bits) {
        return Reel::depuis_mantisse(v.clone(), bits);
    }

    let v = pi_compute(bits);
    guard.insert(bits, v.clone());
    Reel::depuis_mantisse(v, bits)
}

pub fn pi(ctx: Precision) -> Reel {
    pi_bits(ctx.bits())
}

/* ------------------------ log ------------------------ */

pub(crate) fn ln2_bits(bits: u32) -> Reel {
    let b = bits + EXTRA;
    let v = serie_inverse(3, b, false) << 1u32;
    Reel::depuis_mantisse(v >> EXTRA, bits)
}

pub fn ln2(ctx: Precision) -> Reel {
    ln2_bits(ctx.bits())
}

/// atanh(w) pour |w| ≤ 1/5 (série directe).
fn atanh_petit(w: &Reel) -> Reel {
    let w2 = w.carre();
    let mut p = w.clone();
    let mut somme = Reel::zero(w.bits());
    let mut k: u64 = 0;
    loop {
        let terme = p.div_entier(&BigInt::from(2 * k + 1));
        if terme.est_nul() {
            break;
        }
        somme += &terme;
        p = &p * &w2;
        k += 1;
    }
    somme
}

/// log(y), y > 0 : y = z·2^e avec z ∈ [3/4, 3/2), puis 2·atanh((z−1)/(z+1)) + e·log 2.
pub fn ln(y: &Reel) -> Resultat<Reel> {
    if y.est_negatif() || y.est_nul() {
        return Err(Erreur::Domaine(format!(
            "log d'un nombre ≤ 0 ({})",
            y.en_scientifique(6)
        )));
    }
    let bits = y.bits();
    let m = y.mantisse();

    // m ∈ [2^(nb-1), 2^nb) ⇒ y ∈ [2^(nb-1-bits), 2^(nb-bits))
    let mut e = m.bits() as i64 - 1 - bits as i64;
    let mut z = if e >= 0 {
        Reel::depuis_mantisse(m >> (e as u64), bits)
    } else {
        Reel::depuis_mantisse(m << ((-e) as u64), bits)
    };
    let trois_demis = Reel::depuis_ratio(3, 2, bits);
    if z.compare(&trois_demis).is_ge() {
        z = z.div_entier(&BigInt::from(2));
        e += 1;
    }

    let un = Reel::un(bits);
    let w = (&z - &un)
        .divise(&(&z + &un))
        .ok_or_else(|| Erreur::Domaine("log : réduction dégénérée".into()))?;
    let mut r = atanh_petit(&w).mul_entier(&BigInt::from(2));
    if e != 0 {
        r += &ln2_bits(bits).mul_entier(&BigInt::from(e));
    }
    Ok(r)
}

/* ------------------------ Nombres tangents ------------------------ */

/// T_1..T_n (index 0 inutilisé, vaut 0) : tan x = Σ T_k x^(2k−1)/(2k−1)!.
/// Récurrence entière de Brent–Harvey.
pub fn nombres_tangents(n: usize) -> Vec<BigInt> {
    let mut t = vec![BigInt::zero(); n + 1];
    if n == 0 {
        return t;
    }
    t[1] = BigInt::one();
    for k in 2..=n {
        t[k] = &t[k - 1] * BigInt::from(k - 1);
    }
    for k in 2..=n {
        for j in k..=n {
            t[j] = &t[j - 1] * BigInt::from(j - k) + &t[j] * BigInt::from(j - k + 2);
        }
    }
    t
}

pub(crate) fn factorielle(n: u64) -> BigInt {
    (2..=n).fold(BigInt::one(), |acc, k| acc * BigInt::from(k))
}

/// ζ(1 − 2j) = (−1)^j T_j / (4^j (4^j − 1)), exact.
pub fn zeta_negatif_impair(j: usize, tangents: &[BigInt]) -> BigRational {
    let q = BigInt::one() << (2 * j);
    let mut r = BigRational::new(tangents[j].clone(), &q * (&q - BigInt::one()));
    if j % 2 == 1 {
        r = -r;
    }
    r
}

/* ------------------------ ζ(s), s ≥ 2 ------------------------ */

/// ζ(2j) = T_j π^(2j) / (2 (2j−1)! (4^j − 1)).
fn zeta_pair(s: u32, bits: u32) -> Reel {
    let j = (s / 2) as usize;
    let t = nombres_tangents(j);
    let q = BigInt::one() << (2 * j);
    let den = BigInt::from(2) * factorielle(s as u64 - 1) * (q - BigInt::one());
    let b = bits + EXTRA;
    let v = pi_bits(b).puissance(s).mul_entier(&t[j]).div_entier(&den);
    v.a_bits(bits)
}

/// Coefficients d_0..d_n de Borwein (entiers) :
/// d_k = n Σ_{i≤k} (n+i−1)! 4^i / ((n−i)! (2i)!).
fn coefficients_borwein(n: u64) -> Vec<BigInt> {
    let mut d = Vec::with_capacity(n as usize + 1);
    let mut t = BigInt::one();
    let mut acc = BigInt::zero();
    for i in 0..=n {
        if i > 0 {
            // quotient exact
            t = t * BigInt::from(2 * (n + i - 1) * (n - i + 1)) / BigInt::from(i * (2 * i - 1));
        }
        acc += &t;
        d.push(acc.clone());
    }
    d
}

/// ζ(s) = −2^(s−1) Σ_{k<n} (−1)^k (d_k − d_n)/(k+1)^s / ((2^(s−1) − 1) d_n).
fn zeta_borwein(s: u32, bits: u32) -> Reel {
    let b = bits + EXTRA;
    let n = (b as f64 / GAIN_BORWEIN).ceil() as u64 + 2;
    let d = coefficients_borwein(n);
    let dn = &d[n as usize];

    let mut somme = BigInt::zero();
    for k in 0..n {
        let t = ((&d[k as usize] - dn) << b) / BigInt::from(k + 1).pow(s);
        if k % 2 == 0 {
            somme += t;
        } else {
            somme -= t;
        }
    }

    let num = -(somme << (s - 1));
    let den = ((BigInt::one() << (s - 1)) - BigInt::one()) * dn;
    Reel::depuis_mantisse(num / den, b).a_bits(bits)
}

pub(crate) fn zeta_bits(s: u32, bits: u32) -> Resultat<Reel> {
    if s < 2 {
        return Err(Erreur::Domaine(format!("ζ({s}) : pôle ou hors domaine")));
    }
    Ok(if s % 2 == 0 {
        zeta_pair(s, bits)
    } else {
        zeta_borwein(s, bits)
    })
}

/// ζ(s) pour s ≥ 2.
pub fn zeta(s: u32, ctx: Precision) -> Resultat<Reel> {
    zeta_bits(s, ctx.bits())
}
