// src/noyau/format.rs

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use serde::Serializer;
use std::fmt::Display;
use std::time::Duration;

use super::reel::Reel;

/* ------------------------ Helpers rationnels ------------------------ */

pub fn format_rat_pretty(r: &BigRational) -> String {
    let n = r.numer();
    let d = r.denom();
    if d.is_one() {
        format!("{n}")
    } else {
        format!("{n}/{d}")
    }
}

/// |c|·ω sans signe ; le coefficient 1 disparaît, la constante 1 aussi.
fn format_produit(c: &BigRational, etiquette: &str) -> String {
    let a = c.abs();
    match (a.is_one(), etiquette == "1") {
        (_, true) => format_rat_pretty(&a),
        (true, false) => etiquette.to_string(),
        (false, false) => format!("{}·{etiquette}", format_rat_pretty(&a)),
    }
}

/// Σ c_i ω_i, termes nuls omis : "15683/14280·ζ(6) − 5743/14280·ζ(3)² + …".
pub fn format_combinaison(coeffs: &[BigRational], etiquettes: &[&str]) -> String {
    let mut s = String::new();
    for (c, e) in coeffs.iter().zip(etiquettes) {
        if c.is_zero() {
            continue;
        }
        let p = format_produit(c, e);
        match (s.is_empty(), c.is_negative()) {
            (true, true) => s.push_str(&format!("−{p}")),
            (true, false) => s.push_str(&p),
            (false, true) => s.push_str(&format!(" − {p}")),
            (false, false) => s.push_str(&format!(" + {p}")),
        }
    }
    if s.is_empty() {
        "0".to_string()
    } else {
        s
    }
}

/// Relation entière a_0·S + Σ a_i ω_i = 0.
pub fn format_relation(relation: &[BigInt], etiquettes: &[&str]) -> String {
    let Some((a0, reste)) = relation.split_first() else {
        return "0 = 0".to_string();
    };
    let mut coeffs = vec![BigRational::from_integer(a0.clone())];
    coeffs.extend(reste.iter().map(|a| BigRational::from_integer(a.clone())));
    let mut noms = vec!["S"];
    noms.extend_from_slice(etiquettes);
    format!("{} = 0", format_combinaison(&coeffs, &noms))
}

/* ------------------------ Réels ------------------------ */

/// Résidu en notation scientifique (3 chiffres significatifs), "0" s'il est nul.
pub fn format_residu(r: &Reel) -> String {
    if r.est_nul() {
        "0".to_string()
    } else {
        r.abs().en_scientifique(3)
    }
}

/// Valeur tronquée à `chiffres` décimales.
pub fn format_valeur(r: &Reel, chiffres: u32) -> String {
    r.en_decimal(chiffres as usize)
}

/* ------------------------ Durées ------------------------ */

pub fn format_duree(d: Duration) -> String {
    let s = d.as_secs_f64();
    if s >= 1.0 {
        format!("{s:.2} s")
    } else if s >= 1e-3 {
        format!("{:.2} ms", s * 1e3)
    } else {
        format!("{:.0} µs", s * 1e6)
    }
}

/* ------------------------ serde : grands entiers en texte ------------------------ */

pub(crate) fn serialiser_texte<S: Serializer, T: Display>(v: &T, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(v)
}

pub(crate) fn serialiser_textes<S: Serializer, T: Display>(
    v: &Option<Vec<T>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match v {
        Some(v) => s.collect_seq(v.iter().map(|x| x.to_string())),
        None => s.serialize_none(),
    }
}
