//! Certification de S(x) = Σ c_i ω_i.
//!
//! Protocole (une instance par appel, rien de partagé) :
//!
//! 1. série à P chiffres ; non-convergence → arrêt, verdict `NonConvergence`
//! 2. base à P chiffres
//! 3. relation entière sur [S, ω_1..ω_21] : celle de la table (défaut), ou
//!    redécouverte par PSLQ
//! 4. a_0 = 0 → `RelationDegeneree` ; sinon c_i = −a_i/a_0, résidu |S − Σ c_i ω_i|,
//!    acceptée ssi résidu < seuil
//!
//! Les issues dégradées sont des verdicts ; `exiger_acceptation` les convertit
//! en `Erreur` quand l'appelant veut un succès.

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::base::construire_base;
use super::coefficients::{coefficients_de, PointSupporte};
use super::erreur::{Erreur, Resultat};
use super::format::{format_residu, serialiser_texte, serialiser_textes};
use super::forme_close::combinaison_entiere;
use super::precision::{avec_precision, Precision};
use super::pslq::{rechercher_relation, BornesRecherche};
use super::reel::{pow10, Reel};
use super::serie::{evaluer_serie, ParametresSerie};

/// Seuil de résidu par défaut : 10^-96.
pub const EXPOSANT_SEUIL_DEFAUT: u32 = 96;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SourceRelation {
    /// Relation entière tirée de la table embarquée.
    #[default]
    Table,
    /// Relation redécouverte par PSLQ.
    Recherche(BornesRecherche),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Etape {
    SerieCalculee,
    BaseCalculee,
    RelationCherchee,
    RelationAcceptee,
    RelationRejetee,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Verdict {
    Acceptee,
    NonConvergence { termes: u64 },
    RelationIntrouvable { motif: String },
    RelationDegeneree,
    ResiduExcessif,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ParametresVerification {
    pub serie: ParametresSerie,
    pub source: SourceRelation,
    pub seuil: BigRational,
}

/// 10^-e, exact.
pub fn seuil_puissance_dix(e: u32) -> BigRational {
    BigRational::new(BigInt::from(1), pow10(e))
}

impl Default for ParametresVerification {
    fn default() -> Self {
        Self {
            serie: ParametresSerie::default(),
            source: SourceRelation::Table,
            seuil: seuil_puissance_dix(EXPOSANT_SEUIL_DEFAUT),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RapportVerification {
    pub point: PointSupporte,
    pub chiffres: u32,
    pub termes_serie: u64,
    pub etapes: Vec<Etape>,
    pub valeur_serie: Reel,
    #[serde(serialize_with = "serialiser_textes")]
    pub relation: Option<Vec<BigInt>>,
    #[serde(serialize_with = "serialiser_textes")]
    pub coefficients: Option<Vec<BigRational>>,
    pub residu: Option<Reel>,
    #[serde(serialize_with = "serialiser_texte")]
    pub seuil: BigRational,
    pub verdict: Verdict,
    /// Recherche PSLQ seulement : coefficients identiques à la table ?
    pub concorde_table: Option<bool>,
}

impl RapportVerification {
    pub fn acceptee(&self) -> bool {
        self.verdict == Verdict::Acceptee
    }

    pub fn log10_residu(&self) -> Option<f64> {
        self.residu.as_ref().map(Reel::log10_abs)
    }

    pub fn exiger_acceptation(&self) -> Resultat<()> {
        match &self.verdict {
            Verdict::Acceptee => Ok(()),
            Verdict::NonConvergence { termes } => Err(Erreur::NonConvergence { termes: *termes }),
            Verdict::RelationIntrouvable { motif } => {
                Err(Erreur::RelationIntrouvable(motif.clone()))
            }
            Verdict::RelationDegeneree => Err(Erreur::RelationDegeneree),
            Verdict::ResiduExcessif => Err(Erreur::ResiduExcessif {
                residu: self.residu.as_ref().map(format_residu).unwrap_or_default(),
                seuil: self.seuil.to_string(),
            }),
        }
    }
}

/* ------------------------ Protocole ------------------------ */

pub fn verifier_identite(
    point: PointSupporte,
    ctx: Precision,
    params: &ParametresVerification,
) -> Resultat<RapportVerification> {
    if !params.seuil.is_positive() {
        return Err(Erreur::Config(format!(
            "seuil de résidu non positif : {}",
            params.seuil
        )));
    }

    // 1.
    let serie = evaluer_serie(&point.exact(), ctx, &params.serie)?;
    let mut rapport = RapportVerification {
        point,
        chiffres: ctx.chiffres(),
        termes_serie: serie.termes,
        etapes: Vec::new(),
        valeur_serie: serie.valeur,
        relation: None,
        coefficients: None,
        residu: None,
        seuil: params.seuil.clone(),
        verdict: Verdict::Acceptee,
        concorde_table: None,
    };
    if !serie.converge {
        warn!(x = %point, termes = serie.termes, "vérification interrompue : série non convergée");
        rapport.verdict = Verdict::NonConvergence {
            termes: serie.termes,
        };
        return Ok(rapport);
    }
    rapport.etapes.push(Etape::SerieCalculee);

    // 2.
    let base = construire_base(ctx)?;
    rapport.etapes.push(Etape::BaseCalculee);

    // 3.
    let table = coefficients_de(point);
    rapport.etapes.push(Etape::RelationCherchee);
    let (relation, comparer_a) = match &params.source {
        SourceRelation::Table => (table.relation_entiere(), None),
        SourceRelation::Recherche(bornes) => {
            let mut vecteur = Vec::with_capacity(base.len() + 1);
            vecteur.push(rapport.valeur_serie.clone());
            vecteur.extend(base.valeurs().iter().cloned());
            let issue = rechercher_relation(&vecteur, ctx, bornes)?;
            let motif = issue.resume();
            debug!(x = %point, issue = %motif, "PSLQ terminé");
            match issue.relation() {
                Some(r) => (r, Some(table.valeurs())),
                None => {
                    rapport.etapes.push(Etape::RelationRejetee);
                    rapport.verdict = Verdict::RelationIntrouvable { motif };
                    return Ok(rapport);
                }
            }
        }
    };

    // 4.
    Ok(conclure(rapport, relation, base.valeurs(), comparer_a))
}

/// Étape 4 : relation [a_0, a_1..a_21] → verdict.
///
/// `table` : coefficients de référence quand la relation vient d'une recherche.
fn conclure(
    mut rapport: RapportVerification,
    relation: Vec<BigInt>,
    base: &[Reel],
    table: Option<&[BigRational]>,
) -> RapportVerification {
    let a0 = relation[0].clone();
    if a0.is_zero() {
        rapport.relation = Some(relation);
        rapport.etapes.push(Etape::RelationRejetee);
        rapport.verdict = Verdict::RelationDegeneree;
        return rapport;
    }

    let coefficients: Vec<BigRational> = relation[1..]
        .iter()
        .map(|a| BigRational::new(-a, a0.clone()))
        .collect();
    rapport.concorde_table = table.map(|t| coefficients.as_slice() == t);

    let forme = combinaison_entiere(base, &relation[1..], &a0);
    let residu = (&rapport.valeur_serie - &forme).abs();
    let acceptee = residu.en_rationnel() < rapport.seuil;

    info!(
        x = %rapport.point,
        chiffres = rapport.chiffres,
        residu = %format_residu(&residu),
        acceptee,
        "identité vérifiée"
    );

    rapport.relation = Some(relation);
    rapport.coefficients = Some(coefficients);
    rapport.residu = Some(residu);
    if acceptee {
        rapport.etapes.push(Etape::RelationAcceptee);
    } else {
        rapport.etapes.push(Etape::RelationRejetee);
        rapport.verdict = Verdict::ResiduExcessif;
    }
    rapport
}

/// f64 → rationnel par son écriture décimale la plus courte (1e-96 → 1/10^96).
fn seuil_decimal(v: f64) -> Option<BigRational> {
    if !(v.is_finite() && v > 0.0) {
        return None;
    }
    let texte = format!("{v:e}");
    let (mantisse, e) = texte.split_once('e')?;
    let e: i64 = e.parse().ok()?;
    let (entier, frac) = mantisse.split_once('.').unwrap_or((mantisse, ""));
    let chiffres: BigInt = format!("{entier}{frac}").parse().ok()?;
    let e = e - frac.len() as i64;
    let q = if e >= 0 {
        BigRational::from_integer(chiffres * pow10(e as u32))
    } else {
        BigRational::new(chiffres, pow10((-e) as u32))
    };
    Some(q)
}

/// Certifie la table pour x à P chiffres, seuil donné (ex. 1e-96).
pub fn verify_identity(
    x: f64,
    precision: Option<u32>,
    seuil: f64,
) -> Resultat<RapportVerification> {
    let point = PointSupporte::depuis_x(x)?;
    let seuil = seuil_decimal(seuil)
        .ok_or_else(|| Erreur::Config(format!("seuil de résidu invalide : {seuil}")))?;
    let params = ParametresVerification {
        seuil,
        ..ParametresVerification::default()
    };
    avec_precision(precision, |ctx| verifier_identite(point, ctx, &params))
}

/// Redécouverte de la relation par PSLQ sur [S, ω_1..ω_21].
pub fn discover_relation(
    x: f64,
    precision: Option<u32>,
    bornes: BornesRecherche,
) -> Resultat<RapportVerification> {
    let point = PointSupporte::depuis_x(x)?;
    let params = ParametresVerification {
        source: SourceRelation::Recherche(bornes),
        ..ParametresVerification::default()
    };
    avec_precision(precision, |ctx| verifier_identite(point, ctx, &params))
}

/* ------------------------ Stabilité en précision ------------------------ */

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PointStabilite {
    pub chiffres: u32,
    /// None : pas de résidu à cette précision (voir `verdict`)
    pub log10_residu: Option<f64>,
    pub termes_serie: u64,
    pub verdict: Verdict,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalyseStabilite {
    pub point: PointSupporte,
    pub points: Vec<PointStabilite>,
    /// pente des moindres carrés de log10(résidu) en fonction de P
    pub pente: Option<f64>,
    pub decroissance_stricte: bool,
    /// décroissance exponentielle (pente < −0.5) : identité exacte
    pub exacte: bool,
}

fn pente_moindres_carres(points: &[(f64, f64)]) -> Option<f64> {
    if points.len() < 2 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n;
    let sxy: f64 = points.iter().map(|(x, y)| (x - mx) * (y - my)).sum();
    let sxx: f64 = points.iter().map(|(x, _)| (x - mx).powi(2)).sum();
    (sxx > 0.0).then(|| sxy / sxx)
}

pub fn analyser_stabilite(
    point: PointSupporte,
    precisions: &[u32],
    params: &ParametresVerification,
) -> Resultat<AnalyseStabilite> {
    let mut points = Vec::with_capacity(precisions.len());
    for &p in precisions {
        let ctx = Precision::new(p)?;
        let rapport = verifier_identite(point, ctx, params)?;
        let log10_residu = rapport.log10_residu().map(|l| {
            if l.is_finite() {
                l
            } else {
                // résidu nul : on retient la résolution de la grille
                -(ctx.bits() as f64) * std::f64::consts::LOG10_2
            }
        });
        match log10_residu {
            Some(l) => debug!(chiffres = p, log10_residu = l, "stabilité : point"),
            None => warn!(chiffres = p, verdict = ?rapport.verdict, "stabilité : point sans résidu"),
        }
        points.push(PointStabilite {
            chiffres: p,
            log10_residu,
            termes_serie: rapport.termes_serie,
            verdict: rapport.verdict,
        });
    }

    // seuls les points munis d'un résidu entrent dans la tendance
    let xy: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|p| p.log10_residu.map(|l| (p.chiffres as f64, l)))
        .collect();
    let pente = pente_moindres_carres(&xy);
    let decroissance_stricte = xy.len() >= 2 && xy.windows(2).all(|w| w[1].1 < w[0].1);
    let exacte = pente.is_some_and(|s| s < -0.5);

    info!(x = %point, ?pente, decroissance_stricte, exacte, "analyse de stabilité");
    Ok(AnalyseStabilite {
        point,
        points,
        pente,
        decroissance_stricte,
        exacte,
    })
}

/// Résidu aux précisions données (croissantes), relation de la table.
pub fn analyze_stability(x: f64, precisions: &[u32]) -> Resultat<AnalyseStabilite> {
    let point = PointSupporte::depuis_x(x)?;
    analyser_stabilite(point, precisions, &ParametresVerification::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(p: u32) -> Precision {
        Precision::new(p).unwrap()
    }

    #[test]
    fn table_acceptee_a_cinquante_chiffres() {
        let params = ParametresVerification {
            seuil: seuil_puissance_dix(35),
            ..ParametresVerification::default()
        };
        let r = verifier_identite(PointSupporte::Demi, ctx(50), &params).unwrap();
        assert!(r.acceptee(), "{:?}", r.verdict);
        assert_eq!(
            r.etapes,
            vec![
                Etape::SerieCalculee,
                Etape::BaseCalculee,
                Etape::RelationCherchee,
                Etape::RelationAcceptee
            ]
        );
        assert_eq!(r.termes_serie, 199);
        let c = r.coefficients.as_ref().unwrap();
        assert_eq!(c.as_slice(), coefficients_de(PointSupporte::Demi).valeurs());
        assert!(r.exiger_acceptation().is_ok());
        assert_eq!(r.concorde_table, None);
    }

    #[test]
    fn residu_excessif_a_basse_precision() {
        // 10^-96 n'est pas atteignable avec 50 chiffres
        let r = verify_identity(0.25, Some(50), 1e-96).unwrap();
        assert_eq!(r.verdict, Verdict::ResiduExcessif);
        assert!(r.log10_residu().unwrap() < -50.0);
        assert!(matches!(
            r.exiger_acceptation(),
            Err(Erreur::ResiduExcessif { .. })
        ));
    }

    #[test]
    fn non_convergence_interrompt() {
        let params = ParametresVerification {
            serie: ParametresSerie {
                max_termes: 20,
                ..ParametresSerie::default()
            },
            ..ParametresVerification::default()
        };
        let r = verifier_identite(PointSupporte::MoinsDemi, ctx(30), &params).unwrap();
        assert_eq!(r.verdict, Verdict::NonConvergence { termes: 20 });
        assert!(r.etapes.is_empty());
        assert!(r.residu.is_none());
        assert_eq!(
            r.exiger_acceptation(),
            Err(Erreur::NonConvergence { termes: 20 })
        );
    }

    #[test]
    fn seuils_invalides() {
        assert!(matches!(
            verify_identity(0.5, Some(20), 0.0),
            Err(Erreur::Config(_))
        ));
        assert!(matches!(
            verify_identity(0.5, Some(20), f64::NAN),
            Err(Erreur::Config(_))
        ));
        assert!(matches!(
            verify_identity(0.3, Some(20), 1e-10),
            Err(Erreur::ValeurXNonSupportee { .. })
        ));
    }

    fn rapport_avant_relation(point: PointSupporte, p: u32) -> RapportVerification {
        let serie = evaluer_serie(&point.exact(), ctx(p), &ParametresSerie::default()).unwrap();
        RapportVerification {
            point,
            chiffres: p,
            termes_serie: serie.termes,
            etapes: vec![
                Etape::SerieCalculee,
                Etape::BaseCalculee,
                Etape::RelationCherchee,
            ],
            valeur_serie: serie.valeur,
            relation: None,
            coefficients: None,
            residu: None,
            seuil: seuil_puissance_dix(20),
            verdict: Verdict::Acceptee,
            concorde_table: None,
        }
    }

    #[test]
    fn relation_sans_a0_degeneree() {
        let base = construire_base(ctx(30)).unwrap();
        let mut relation = vec![BigInt::zero(); base.len() + 1];
        relation[1] = BigInt::from(1);
        let r = conclure(
            rapport_avant_relation(PointSupporte::Demi, 30),
            relation.clone(),
            base.valeurs(),
            None,
        );
        assert_eq!(r.verdict, Verdict::RelationDegeneree);
        assert_eq!(r.etapes.last(), Some(&Etape::RelationRejetee));
        assert_eq!(r.relation, Some(relation));
        assert!(r.coefficients.is_none());
        assert!(r.residu.is_none());
        assert_eq!(r.exiger_acceptation(), Err(Erreur::RelationDegeneree));
    }

    #[test]
    fn relation_de_la_table_conclue() {
        let base = construire_base(ctx(30)).unwrap();
        let table = coefficients_de(PointSupporte::Quart);
        let r = conclure(
            rapport_avant_relation(PointSupporte::Quart, 30),
            table.relation_entiere(),
            base.valeurs(),
            Some(table.valeurs()),
        );
        assert!(r.acceptee(), "{:?}", r.verdict);
        assert_eq!(r.etapes.last(), Some(&Etape::RelationAcceptee));
        assert_eq!(r.concorde_table, Some(true));
    }

    #[test]
    fn recherche_bornee_introuvable() {
        let bornes = BornesRecherche {
            max_iterations: 1,
            ..BornesRecherche::default()
        };
        let r = discover_relation(0.5, Some(60), bornes).unwrap();
        assert_eq!(
            r.verdict,
            Verdict::RelationIntrouvable {
                motif: "itérations épuisées".into()
            }
        );
        assert_eq!(
            r.etapes,
            vec![
                Etape::SerieCalculee,
                Etape::BaseCalculee,
                Etape::RelationCherchee,
                Etape::RelationRejetee
            ]
        );
        assert!(r.relation.is_none());
        assert!(r.concorde_table.is_none());
        // distinct de la relation dégénérée
        assert!(matches!(
            r.exiger_acceptation(),
            Err(Erreur::RelationIntrouvable(_))
        ));
    }

    #[test]
    fn stabilite_sans_residu_rapportee() {
        let params = ParametresVerification {
            source: SourceRelation::Recherche(BornesRecherche {
                max_iterations: 1,
                ..BornesRecherche::default()
            }),
            ..ParametresVerification::default()
        };
        let a = analyser_stabilite(PointSupporte::Demi, &[30, 40], &params).unwrap();
        assert_eq!(a.points.len(), 2);
        for p in &a.points {
            assert_eq!(p.log10_residu, None);
            assert!(matches!(p.verdict, Verdict::RelationIntrouvable { .. }));
        }
        assert_eq!(a.pente, None);
        assert!(!a.decroissance_stricte);
        assert!(!a.exacte);
    }

    #[test]
    fn stabilite_non_convergence_rapportee() {
        let params = ParametresVerification {
            serie: ParametresSerie {
                max_termes: 20,
                ..ParametresSerie::default()
            },
            ..ParametresVerification::default()
        };
        let a = analyser_stabilite(PointSupporte::MoinsDemi, &[30, 45], &params).unwrap();
        assert!(a
            .points
            .iter()
            .all(|p| p.verdict == Verdict::NonConvergence { termes: 20 }));
        assert_eq!(a.pente, None);

        // les préconditions restent des erreurs
        assert!(analyser_stabilite(PointSupporte::Demi, &[0, 30], &params).is_err());
        assert!(analyze_stability(0.3, &[30, 45]).is_err());
    }

    #[test]
    fn stabilite_sous_le_plancher() {
        let a = analyze_stability(0.25, &[20, 30]).unwrap();
        assert!(a.points.iter().all(|p| p.verdict == Verdict::Acceptee
            || p.verdict == Verdict::ResiduExcessif));
        assert!(a.points.iter().all(|p| p.log10_residu.is_some()));
        assert!(a.pente.is_some());
    }

    #[test]
    fn seuils_decimaux_exacts() {
        assert_eq!(seuil_decimal(1e-96), Some(seuil_puissance_dix(96)));
        assert_eq!(
            seuil_decimal(2.5e-3),
            Some(BigRational::new(25.into(), 10_000.into()))
        );
        assert_eq!(seuil_decimal(-1.0), None);
    }

    #[test]
    fn pente() {
        let p = pente_moindres_carres(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((p - 2.0).abs() < 1e-12);
        assert_eq!(pente_moindres_carres(&[(1.0, 1.0)]), None);
    }

    #[test]
    fn rapport_serialisable() {
        let r = verify_identity(-0.5, Some(20), 1e-10).unwrap();
        let j = serde_json::to_value(&r).unwrap();
        assert_eq!(j["point"], "MoinsDemi");
        assert_eq!(j["seuil"], "1/10000000000");
        assert_eq!(j["coefficients"][0], "2879/58060");
        assert!(j["relation"][0].is_string());
    }
}
