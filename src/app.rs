// src/app.rs
//
// s42 — module App (racine)
// -------------------------
// Rôle:
// - Déclarer les sous-modules (etat.rs + vue.rs)
// - Ré-exporter Cli (pour main.rs: use app::Cli;)
// - Exécuter une commande : configuration → calcul (noyau) → rapport (texte ou JSON)
//
// Important:
// - Les issues dégradées (série non convergée, identité rejetée) sont des rapports,
//   pas des erreurs : le code de sortie ne dépend que des vraies erreurs.

pub mod etat;
pub mod vue;

pub use etat::Cli;

use anyhow::Context;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use somme_euler::noyau::base::{construire_base, etiquettes};
use somme_euler::noyau::coefficients::{coefficients_de, PointSupporte};
use somme_euler::noyau::config::ConfigCalcul;
use somme_euler::noyau::forme_close::{
    batch_evaluate_closed_form, compare_with_series, timing_breakdown,
};
use somme_euler::noyau::precision::avec_precision;
use somme_euler::noyau::serie::{evaluer_serie, x_exact};
use somme_euler::noyau::verification::{
    analyser_stabilite, seuil_puissance_dix, verifier_identite, ParametresVerification,
};

use etat::{Commande, DIGITS_DEMO, DIGITS_DEMO_CERTIFICATION};

fn en_json<T: Serialize>(v: &T) -> anyhow::Result<String> {
    serde_json::to_string_pretty(v).context("sérialisation JSON")
}

/// Exécute la commande et rend le rapport à afficher.
pub fn executer(cli: &Cli) -> anyhow::Result<String> {
    let config = cli.configuration()?;
    let p = Some(config.contexte()?.chiffres());
    info!(commande = ?cli.commande, chiffres = config.precision, "s42");

    let sortie = match &cli.commande {
        Commande::Serie { x } => {
            let point = PointSupporte::depuis_x(*x).ok();
            let q = x_exact(*x)?;
            let r = avec_precision(p, |ctx| evaluer_serie(&q, ctx, &config.serie))?;
            if cli.json {
                en_json(&r)?
            } else {
                let nom = point.map(|pt| pt.to_string()).unwrap_or_else(|| x.to_string());
                vue::rapport_serie(&nom, &r, config.precision)
            }
        }

        Commande::FormeClose { x } => {
            let valeurs = batch_evaluate_closed_form(x, p)?;
            if cli.json {
                en_json(&valeurs)?
            } else {
                vue::rapport_formes_closes(x, &valeurs, config.precision)
            }
        }

        Commande::Base => {
            let base = avec_precision(p, construire_base)?;
            if cli.json {
                let table: Vec<_> = base
                    .comme_table()
                    .into_iter()
                    .map(|(e, v)| json!({ "etiquette": e, "valeur": v }))
                    .collect();
                en_json(&table)?
            } else {
                vue::rapport_base(&base)
            }
        }

        Commande::Coefficients { x } => {
            let c = coefficients_de(PointSupporte::depuis_x(*x)?);
            if cli.json {
                let lignes: Vec<_> = c
                    .valeurs()
                    .iter()
                    .zip(etiquettes())
                    .map(|(q, e)| json!({ "etiquette": e, "coefficient": q.to_string() }))
                    .collect();
                en_json(&json!({
                    "x": c.point(),
                    "coefficients": lignes,
                    "motifs": c.analyser_motifs(),
                    "bornes": c.bornes(),
                }))?
            } else {
                vue::rapport_coefficients(c)
            }
        }

        Commande::Comparer { x } => {
            let cmp = compare_with_series(*x, p)?;
            let chrono = timing_breakdown(*x, p)?;
            if cli.json {
                en_json(&json!({ "comparaison": cmp, "chronometrage": chrono }))?
            } else {
                format!(
                    "{}\n{}",
                    vue::rapport_comparaison(&cmp),
                    vue::rapport_chronometrage(&chrono)
                )
            }
        }

        Commande::Verifier { x, .. } | Commande::Decouvrir { x, .. } => {
            let point = PointSupporte::depuis_x(*x)?;
            let params = config.parametres_verification();
            let r = avec_precision(p, |ctx| verifier_identite(point, ctx, &params))?;
            if cli.json {
                en_json(&r)?
            } else {
                vue::rapport_verification(&r)
            }
        }

        Commande::Stabilite { x, .. } => {
            let point = PointSupporte::depuis_x(*x)?;
            let params = config.parametres_verification();
            let a = analyser_stabilite(point, &config.precisions_stabilite, &params)?;
            if cli.json {
                en_json(&a)?
            } else {
                vue::rapport_stabilite(&a)
            }
        }

        Commande::Demo => demo(&config, cli.json)?,
    };
    Ok(sortie)
}

/// x = 1/2 : série et forme close à 50 chiffres, puis certification à 200 (seuil 10^-96).
fn demo(config: &ConfigCalcul, json: bool) -> anyhow::Result<String> {
    let point = PointSupporte::Demi;
    let cmp = compare_with_series(point.valeur(), Some(DIGITS_DEMO))?;
    let params = ParametresVerification {
        serie: config.serie.clone(),
        seuil: seuil_puissance_dix(config.exposant_seuil_residu),
        ..ParametresVerification::default()
    };
    let r = avec_precision(Some(DIGITS_DEMO_CERTIFICATION), |ctx| {
        verifier_identite(point, ctx, &params)
    })?;
    if json {
        return en_json(&json!({ "comparaison": cmp, "certification": r }));
    }
    Ok(format!(
        "{}\n{}\n\n{}\n{}",
        vue::titre(point, DIGITS_DEMO),
        vue::rapport_comparaison(&cmp),
        vue::titre(point, DIGITS_DEMO_CERTIFICATION),
        vue::rapport_verification(&r)
    ))
}
