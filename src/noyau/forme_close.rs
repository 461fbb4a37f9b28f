// src/noyau/forme_close.rs
//
// Forme close : S(x) = Σ c_i ω_i.
//
// - produit_scalaire : deux vecteurs de réels de même longueur (21)
// - evaluer_avec_base : base déjà calculée + table exacte, en entiers
//   (Σ a_i ω_i / a_0 avec la relation entière de la table : une seule troncature)
// - la base est indépendante de x : un lot de x ne la calcule qu'une fois

use num_bigint::BigInt;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::base::{construire_base, Base, TAILLE_BASE};
use super::coefficients::{coefficients_de, Coefficients, PointSupporte};
use super::erreur::{Erreur, Resultat};
use super::precision::{avec_precision, Precision};
use super::reel::Reel;
use super::serie::{evaluer_serie, relative_error, ParametresSerie};

/// Σ b_i c_i ; les deux vecteurs doivent avoir 21 composantes sur la même grille.
pub fn produit_scalaire(base: &[Reel], coeffs: &[Reel]) -> Resultat<Reel> {
    if base.len() != TAILLE_BASE || coeffs.len() != TAILLE_BASE {
        return Err(Erreur::Dimension(format!(
            "base {} / coefficients {} (attendu {TAILLE_BASE})",
            base.len(),
            coeffs.len()
        )));
    }
    let bits = base[0].bits();
    if base.iter().chain(coeffs).any(|v| v.bits() != bits) {
        return Err(Erreur::Dimension(
            "base et coefficients calculés à des précisions différentes".into(),
        ));
    }
    let mut acc = Reel::zero(bits);
    for (b, c) in base.iter().zip(coeffs) {
        acc += &(b * c);
    }
    Ok(acc)
}

/// Σ c_i ω_i, en passant par la relation entière (a_0, a_1..a_21).
pub fn evaluer_avec_base(base: &Base, coeffs: &Coefficients) -> Resultat<Reel> {
    if base.len() != coeffs.len() {
        return Err(Erreur::Dimension(format!(
            "base {} / coefficients {}",
            base.len(),
            coeffs.len()
        )));
    }
    let rel = coeffs.relation_entiere();
    Ok(combinaison_entiere(base.valeurs(), &rel[1..], &rel[0]))
}

/// −Σ a_i ω_i / a_0.
pub(crate) fn combinaison_entiere(valeurs: &[Reel], a: &[BigInt], a0: &BigInt) -> Reel {
    let bits = valeurs.first().map(Reel::bits).unwrap_or(0);
    let mut acc = Reel::zero(bits);
    for (v, ai) in valeurs.iter().zip(a) {
        acc -= &v.mul_entier(ai);
    }
    acc.div_entier(a0)
}

/// S(x) par la forme close à P chiffres.
pub fn evaluate_closed_form(x: f64, precision: Option<u32>) -> Resultat<Reel> {
    let point = PointSupporte::depuis_x(x)?;
    avec_precision(precision, |ctx| {
        let base = construire_base(ctx)?;
        evaluer_avec_base(&base, coefficients_de(point))
    })
}

/// Même calcul pour plusieurs x, base calculée une seule fois.
pub fn batch_evaluate_closed_form(xs: &[f64], precision: Option<u32>) -> Resultat<Vec<Reel>> {
    // x non supporté : on échoue avant le calcul de la base
    let points = xs
        .iter()
        .map(|&x| PointSupporte::depuis_x(x))
        .collect::<Resultat<Vec<_>>>()?;
    avec_precision(precision, |ctx| {
        let base = construire_base(ctx)?;
        points
            .iter()
            .map(|p| evaluer_avec_base(&base, coefficients_de(*p)))
            .collect()
    })
}

/* ------------------------ Comparaison série / forme close ------------------------ */

#[derive(Clone, Debug, Serialize)]
pub struct Comparaison {
    pub point: PointSupporte,
    pub chiffres: u32,
    pub serie: Reel,
    pub forme_close: Reel,
    pub ecart_absolu: Reel,
    /// None : référence nulle
    pub ecart_relatif: Option<Reel>,
    pub termes_serie: u64,
    pub converge: bool,
    pub duree_serie: Duration,
    pub duree_forme_close: Duration,
}

pub fn compare_with_series(x: f64, precision: Option<u32>) -> Resultat<Comparaison> {
    let point = PointSupporte::depuis_x(x)?;
    let q = point.exact();
    avec_precision(precision, |ctx| {
        let t0 = Instant::now();
        let serie = evaluer_serie(&q, ctx, &ParametresSerie::default())?;
        let duree_serie = t0.elapsed();

        let t1 = Instant::now();
        let base = construire_base(ctx)?;
        let forme = evaluer_avec_base(&base, coefficients_de(point))?;
        let duree_forme_close = t1.elapsed();

        let ecart_absolu = (&serie.valeur - &forme).abs();
        let ecart_relatif = relative_error(&serie.valeur, &forme);
        info!(
            x = %point,
            chiffres = ctx.chiffres(),
            log10_ecart = ecart_absolu.log10_abs(),
            "série / forme close comparées"
        );
        Ok(Comparaison {
            point,
            chiffres: ctx.chiffres(),
            serie: serie.valeur,
            forme_close: forme,
            ecart_absolu,
            ecart_relatif,
            termes_serie: serie.termes,
            converge: serie.converge,
            duree_serie,
            duree_forme_close,
        })
    })
}

/* ------------------------ Chronométrage ------------------------ */

#[derive(Clone, Debug, Serialize)]
pub struct Chronometrage {
    pub point: PointSupporte,
    pub chiffres: u32,
    pub duree_base: Duration,
    pub duree_coefficients: Duration,
    pub duree_produit: Duration,
    pub duree_serie: Duration,
    /// série chronométrée convergée ; sinon `duree_serie` est celle d'un arrêt à N_max
    pub serie_convergee: bool,
    pub valeur: Reel,
    /// N* = T_base / (T_série − T_produit) ; None si la série n'est pas plus lente
    pub croisement: Option<f64>,
}

fn croisement(base: Duration, serie: Duration, produit: Duration) -> Option<f64> {
    let gain = serie.as_secs_f64() - produit.as_secs_f64();
    (gain > 0.0).then(|| base.as_secs_f64() / gain)
}

pub fn timing_breakdown(x: f64, precision: Option<u32>) -> Resultat<Chronometrage> {
    let point = PointSupporte::depuis_x(x)?;
    avec_precision(precision, |ctx: Precision| {
        let t = Instant::now();
        let base = construire_base(ctx)?;
        let duree_base = t.elapsed();

        let t = Instant::now();
        let coeffs = coefficients_de(point).en_reels(ctx);
        let duree_coefficients = t.elapsed();

        let t = Instant::now();
        let valeur = produit_scalaire(base.valeurs(), &coeffs)?;
        let duree_produit = t.elapsed();

        let t = Instant::now();
        let serie = evaluer_serie(&point.exact(), ctx, &ParametresSerie::default())?;
        let duree_serie = t.elapsed();
        if !serie.converge {
            warn!(x = %point, termes = serie.termes, "chronométrage : série non convergée");
        }

        debug!(
            ?duree_base,
            ?duree_coefficients,
            ?duree_produit,
            ?duree_serie,
            "chronométrage"
        );
        Ok(Chronometrage {
            point,
            chiffres: ctx.chiffres(),
            duree_base,
            duree_coefficients,
            duree_produit,
            duree_serie,
            serie_convergee: serie.converge,
            valeur,
            croisement: croisement(duree_base, duree_serie, duree_produit),
        })
    })
}
