// src/noyau/serie.rs
//
// Évaluation directe de S(x) = Σ_{n≥1} H_{n−1} x^n / n^5, |x| < 1.
//
// Contrats :
// - H_{n−1} et x^n sont tenus à jour de façon incrémentale (pas de recalcul)
// - arrêt dès que `fenetre` termes consécutifs vérifient |terme| < T, T = 10^-(P + marge)
// - plafond `max_termes` : on rend la somme partielle avec converge = false
// - x ∉ ]−1, 1[ : erreur avant tout calcul

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Signed;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::erreur::{Erreur, Resultat};
use super::harmonique::Harmonique;
use super::precision::{avec_precision, Precision};
use super::reel::Reel;

/// Intervalle (en termes) entre deux traces de progression.
const PAS_TRACE: u64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParametresSerie {
    pub max_termes: u64,
    pub fenetre: u32,
    pub marge_seuil: u32,
}

impl Default for ParametresSerie {
    fn default() -> Self {
        Self {
            max_termes: 600_000,
            fenetre: 35,
            marge_seuil: 10,
        }
    }
}

impl ParametresSerie {
    pub fn validate(&self) -> Resultat<()> {
        if self.max_termes == 0 {
            return Err(Erreur::Config("max_termes doit être ≥ 1".into()));
        }
        if self.fenetre == 0 {
            return Err(Erreur::Config("fenetre doit être ≥ 1".into()));
        }
        Ok(())
    }

    /// T = 10^-(P + marge).
    pub fn seuil(&self, ctx: Precision) -> Reel {
        Reel::puissance_dix_negative(ctx.chiffres() + self.marge_seuil, ctx.bits())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResultatSerie {
    pub valeur: Reel,
    pub termes: u64,
    pub converge: bool,
}

impl ResultatSerie {
    pub fn exiger_convergence(self) -> Resultat<Reel> {
        if self.converge {
            Ok(self.valeur)
        } else {
            Err(Erreur::NonConvergence {
                termes: self.termes,
            })
        }
    }
}

/* ------------------------ x exact ------------------------ */

/// x (f64) → rationnel exact, en refusant |x| ≥ 1.
pub fn x_exact(x: f64) -> Resultat<BigRational> {
    let q = BigRational::from_float(x).ok_or_else(|| Erreur::EntreeDivergente {
        x: format!("{x}"),
    })?;
    verifier_disque(&q)?;
    Ok(q)
}

fn verifier_disque(x: &BigRational) -> Resultat<()> {
    if x.numer().abs() >= x.denom().abs() {
        return Err(Erreur::EntreeDivergente { x: format!("{x}") });
    }
    Ok(())
}

/* ------------------------ Boucle principale ------------------------ */

struct EtatSerie {
    somme: Reel,
    h: Harmonique,
    puissance: Reel,
    n: u64,
    petits: u32,
}

/// Somme de la série pour x rationnel, seuil explicite.
pub fn evaluer_serie_seuil(
    x: &BigRational,
    ctx: Precision,
    params: &ParametresSerie,
    seuil: &Reel,
) -> Resultat<ResultatSerie> {
    verifier_disque(x)?;
    params.validate()?;

    let bits = ctx.bits();
    let xr = Reel::depuis_rationnel(x, bits);
    let mut etat = EtatSerie {
        somme: Reel::zero(bits),
        h: Harmonique::new(bits),
        puissance: xr.clone(),
        n: 0,
        petits: 0,
    };

    while etat.n < params.max_termes {
        etat.n += 1;
        let n5 = BigInt::from(etat.n).pow(5);
        // H_{n−1} x^n / n^5
        let terme = (etat.h.valeur() * &etat.puissance).div_entier(&n5);
        etat.somme += &terme;
        etat.h.avancer();

        if terme.abs_inferieur(seuil) {
            etat.petits += 1;
            if etat.petits >= params.fenetre {
                debug!(x = %x, termes = etat.n, "série convergée");
                return Ok(ResultatSerie {
                    valeur: etat.somme,
                    termes: etat.n,
                    converge: true,
                });
            }
        } else {
            etat.petits = 0;
        }

        etat.puissance = &etat.puissance * &xr;

        if etat.n % PAS_TRACE == 0 {
            debug!(
                n = etat.n,
                log10_terme = terme.log10_abs(),
                "série : progression"
            );
        }
    }

    warn!(
        x = %x,
        termes = etat.n,
        "série non convergée : somme partielle rendue"
    );
    Ok(ResultatSerie {
        valeur: etat.somme,
        termes: etat.n,
        converge: false,
    })
}

pub fn evaluer_serie(
    x: &BigRational,
    ctx: Precision,
    params: &ParametresSerie,
) -> Resultat<ResultatSerie> {
    let seuil = params.seuil(ctx);
    evaluer_serie_seuil(x, ctx, params, &seuil)
}

/// S(x) à P chiffres (P = précision ambiante si None).
pub fn evaluate_series(x: f64, precision: Option<u32>) -> Resultat<ResultatSerie> {
    let q = x_exact(x)?;
    avec_precision(precision, |ctx| {
        evaluer_serie(&q, ctx, &ParametresSerie::default())
    })
}

/* ------------------------ Estimations ------------------------ */

/// Nombre de termes attendu (heuristique grossière, par tranche de |x|).
pub fn estimate_terms_needed(x: f64, precision: u32) -> Resultat<u64> {
    let a = x.abs();
    if a.is_nan() || a >= 1.0 {
        return Err(Erreur::EntreeDivergente { x: format!("{x}") });
    }
    let p = precision as f64;
    let n = if a <= 0.5 {
        p * 1.5 + 50.0
    } else if a <= 0.75 {
        p * 3.0 + 100.0
    } else {
        p * 10.0 + 500.0
    };
    Ok(n as u64)
}

/// Chiffres de travail pour une exactitude absolue 10^-exposant (marge de 20).
pub fn estimate_precision_needed(exposant: u32) -> u32 {
    exposant + 20
}

/// (convergé, indice du début de la fenêtre) : les `fenetre` derniers termes sont < seuil.
pub fn convergence_check(termes: &[Reel], seuil: &Reel, fenetre: usize) -> (bool, Option<usize>) {
    if fenetre == 0 || termes.len() < fenetre {
        return (false, None);
    }
    let debut = termes.len() - fenetre;
    if termes[debut..].iter().all(|t| t.abs_inferieur(seuil)) {
        (true, Some(debut))
    } else {
        (false, None)
    }
}

/// |calculé − référence| / |référence| ; None pour « infini » (référence nulle, calculé non nul).
pub fn relative_error(calcule: &Reel, reference: &Reel) -> Option<Reel> {
    let ecart = (calcule - reference).abs();
    if reference.est_nul() {
        return if calcule.est_nul() { Some(ecart) } else { None };
    }
    ecart.divise(&reference.abs())
}

/* ------------------------ Analyse de convergence ------------------------ */

/// Seuils 10^-k suivis par l'analyse.
pub const EXPOSANTS_SUIVIS: [u32; 5] = [20, 40, 60, 80, 100];

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyseConvergence {
    pub log10_termes: Vec<f64>,
    pub sommes_partielles: Vec<f64>,
    pub valeur_finale: Reel,
    pub log10_dernier_terme: f64,
    /// (k, premier n avec |terme_n| < 10^-k)
    pub franchissements: Vec<(u32, Option<u64>)>,
    pub taux_moyen: f64,
    pub taux_ecart_type: f64,
}

/// Déroule exactement `n_termes` termes et résume la décroissance.
pub fn analyze_convergence(
    x: f64,
    precision: Option<u32>,
    n_termes: u64,
) -> Resultat<AnalyseConvergence> {
    let q = x_exact(x)?;
    if n_termes == 0 {
        return Err(Erreur::Config("analyse : au moins un terme".into()));
    }
    avec_precision(precision, |ctx| {
        let bits = ctx.bits();
        let xr = Reel::depuis_rationnel(&q, bits);
        let mut somme = Reel::zero(bits);
        let mut h = Harmonique::new(bits);
        let mut p = xr.clone();

        let mut log10_termes = Vec::with_capacity(n_termes as usize);
        let mut sommes = Vec::with_capacity(n_termes as usize);
        let mut franchissements: Vec<(u32, Option<u64>)> =
            EXPOSANTS_SUIVIS.iter().map(|k| (*k, None)).collect();

        for n in 1..=n_termes {
            let terme = (h.valeur() * &p).div_entier(&BigInt::from(n).pow(5));
            somme += &terme;
            h.avancer();
            p = &p * &xr;

            let l = terme.log10_abs();
            for (k, premier) in franchissements.iter_mut() {
                if premier.is_none() && l < -(*k as f64) {
                    *premier = Some(n);
                }
            }
            log10_termes.push(l);
            sommes.push(somme.to_f64());
        }

        let (taux_moyen, taux_ecart_type) = statistiques_taux(&log10_termes);
        Ok(AnalyseConvergence {
            log10_dernier_terme: *log10_termes.last().unwrap_or(&f64::NEG_INFINITY),
            log10_termes,
            sommes_partielles: sommes,
            valeur_finale: somme,
            franchissements,
            taux_moyen,
            taux_ecart_type,
        })
    })
}

// moyenne / écart-type des différences log10 successives (termes nuls ignorés)
fn statistiques_taux(log10_termes: &[f64]) -> (f64, f64) {
    let diffs: Vec<f64> = log10_termes
        .windows(2)
        .filter(|w| w[0].is_finite() && w[1].is_finite())
        .map(|w| w[1] - w[0])
        .collect();
    if diffs.is_empty() {
        return (0.0, 0.0);
    }
    let n = diffs.len() as f64;
    let moyenne = diffs.iter().sum::<f64>() / n;
    let variance = diffs.iter().map(|d| (d - moyenne).powi(2)).sum::<f64>() / n;
    (moyenne, variance.sqrt())
}

impl AnalyseConvergence {
    pub fn premier_franchissement(&self, k: u32) -> Option<u64> {
        self.franchissements
            .iter()
            .find(|(e, _)| *e == k)
            .and_then(|(_, n)| *n)
    }
}
