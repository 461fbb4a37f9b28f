// src/app/vue.rs
//
// Vue (rapports texte)
// --------------------
// Objectifs :
// - une fonction par rapport, sans calcul (les valeurs arrivent déjà faites)
// - valeurs tronquées à la précision demandée (jamais arrondies vers le haut)
// - résidus en notation scientifique, durées lisibles

use std::fmt::Write as _;

use somme_euler::noyau::base::{etiquettes, Base};
use somme_euler::noyau::coefficients::{Coefficients, PointSupporte};
use somme_euler::noyau::format::{
    format_combinaison, format_duree, format_rat_pretty, format_relation, format_residu,
    format_valeur,
};
use somme_euler::noyau::forme_close::{Chronometrage, Comparaison};
use somme_euler::noyau::reel::Reel;
use somme_euler::noyau::serie::ResultatSerie;
use somme_euler::noyau::verification::{AnalyseStabilite, RapportVerification, Verdict};

fn oui_non(b: bool) -> &'static str {
    if b {
        "oui"
    } else {
        "non"
    }
}

pub fn rapport_serie(point: &str, r: &ResultatSerie, chiffres: u32) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "S({point}) = {}", format_valeur(&r.valeur, chiffres));
    let _ = writeln!(s, "termes    : {}", r.termes);
    let _ = write!(s, "convergée : {}", oui_non(r.converge));
    s
}

pub fn rapport_formes_closes(xs: &[f64], valeurs: &[Reel], chiffres: u32) -> String {
    xs.iter()
        .zip(valeurs)
        .map(|(x, v)| format!("S({x}) = {}", format_valeur(v, chiffres)))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn rapport_base(base: &Base) -> String {
    let chiffres = base.precision().chiffres();
    let mut s = format!("Base de poids 6 ({chiffres} chiffres)\n");
    for (i, ((etiquette, valeur), poids)) in base.comme_table().into_iter().zip(base.poids()).enumerate() {
        let _ = writeln!(
            s,
            "ω_{:<2} {etiquette:<14} (poids {poids}) = {}",
            i + 1,
            format_valeur(valeur, chiffres)
        );
    }
    s.pop();
    s
}

pub fn rapport_coefficients(c: &Coefficients) -> String {
    let noms = etiquettes();
    let mut s = format!("Coefficients pour x = {}\n", c.point());
    for (i, (q, e)) in c.valeurs().iter().zip(noms).enumerate() {
        let _ = writeln!(s, "c_{:<2} {e:<14} {}", i + 1, format_rat_pretty(q));
    }

    let m = c.analyser_motifs();
    let _ = writeln!(
        s,
        "signes : {} positifs, {} négatifs, {} nuls",
        m.positifs, m.negatifs, m.nuls
    );
    let _ = writeln!(
        s,
        "dénominateur le plus fréquent : {} ({} fois)",
        m.denominateur_frequent.0, m.denominateur_frequent.1
    );
    let _ = writeln!(
        s,
        "|c_i| : min {:.4}, max {:.4}, moyenne {:.4}, écart-type {:.4}",
        m.module_min, m.module_max, m.module_moyen, m.module_ecart_type
    );
    let b = c.bornes();
    let _ = writeln!(
        s,
        "numérateurs ≤ {}, dénominateurs ≤ {}",
        b.numerateur_max, b.denominateur_max
    );
    let _ = write!(
        s,
        "S({}) = {}",
        c.point(),
        format_combinaison(c.valeurs(), &noms)
    );
    s
}

pub fn rapport_comparaison(c: &Comparaison) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "x = {}, {} chiffres", c.point, c.chiffres);
    let _ = writeln!(s, "série       = {}", format_valeur(&c.serie, c.chiffres));
    let _ = writeln!(s, "forme close = {}", format_valeur(&c.forme_close, c.chiffres));
    let _ = writeln!(s, "écart absolu  : {}", format_residu(&c.ecart_absolu));
    let relatif = c
        .ecart_relatif
        .as_ref()
        .map(format_residu)
        .unwrap_or_else(|| "∞".to_string());
    let _ = writeln!(s, "écart relatif : {relatif}");
    let _ = writeln!(
        s,
        "série : {} termes (convergée : {}), {}",
        c.termes_serie,
        oui_non(c.converge),
        format_duree(c.duree_serie)
    );
    let _ = write!(s, "forme close : {}", format_duree(c.duree_forme_close));
    s
}

pub fn rapport_chronometrage(c: &Chronometrage) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "base         : {}", format_duree(c.duree_base));
    let _ = writeln!(s, "coefficients : {}", format_duree(c.duree_coefficients));
    let _ = writeln!(s, "produit      : {}", format_duree(c.duree_produit));
    let _ = writeln!(
        s,
        "série        : {}{}",
        format_duree(c.duree_serie),
        if c.serie_convergee { "" } else { " (non convergée)" }
    );
    let croisement = match c.croisement {
        Some(n) => format!("{n:.1} évaluations"),
        None => "jamais (la série est plus rapide)".to_string(),
    };
    let _ = write!(s, "forme close rentable après : {croisement}");
    s
}

fn libelle_verdict(v: &Verdict) -> String {
    match v {
        Verdict::Acceptee => "ACCEPTÉE".to_string(),
        Verdict::NonConvergence { termes } => format!("REJETÉE (série non convergée, {termes} termes)"),
        Verdict::RelationIntrouvable { motif } => format!("REJETÉE (aucune relation : {motif})"),
        Verdict::RelationDegeneree => "REJETÉE (relation dégénérée, a_0 = 0)".to_string(),
        Verdict::ResiduExcessif => "REJETÉE (résidu au-dessus du seuil)".to_string(),
    }
}

pub fn rapport_verification(r: &RapportVerification) -> String {
    let mut s = String::new();
    let _ = writeln!(s, "x = {}, {} chiffres", r.point, r.chiffres);
    let _ = writeln!(s, "série : {} termes", r.termes_serie);
    let etapes: Vec<String> = r.etapes.iter().map(|e| format!("{e:?}")).collect();
    let _ = writeln!(s, "étapes : {}", etapes.join(" → "));
    if let Some(rel) = &r.relation {
        let _ = writeln!(s, "relation : {}", format_relation(rel, &etiquettes()));
    }
    if let Some(residu) = &r.residu {
        let _ = writeln!(s, "résidu : {}", format_residu(residu));
    }
    let _ = writeln!(s, "seuil  : {}", format_rat_pretty(&r.seuil));
    if let Some(c) = r.concorde_table {
        let _ = writeln!(s, "identique à la table : {}", oui_non(c));
    }
    let _ = write!(s, "verdict : {}", libelle_verdict(&r.verdict));
    s
}

pub fn rapport_stabilite(a: &AnalyseStabilite) -> String {
    let mut s = format!("Stabilité du résidu pour x = {}\n", a.point);
    for p in &a.points {
        match p.log10_residu {
            Some(l) => {
                let _ = writeln!(
                    s,
                    "P = {:>4} : log10(résidu) = {l:>8.2} ({} termes)",
                    p.chiffres, p.termes_serie
                );
            }
            None => {
                let _ = writeln!(
                    s,
                    "P = {:>4} : sans résidu, {}",
                    p.chiffres,
                    libelle_verdict(&p.verdict)
                );
            }
        }
    }
    let pente = a
        .pente
        .map(|p| format!("{p:.3}"))
        .unwrap_or_else(|| "—".to_string());
    let _ = writeln!(s, "pente : {pente} par chiffre");
    let _ = writeln!(s, "décroissance stricte : {}", oui_non(a.decroissance_stricte));
    let conclusion = if a.exacte {
        "décroissance exponentielle : identité exacte"
    } else {
        "plateau : identité vérifiée jusqu'au plancher du résidu seulement"
    };
    let _ = write!(s, "{conclusion}");
    s
}

pub fn titre(point: PointSupporte, chiffres: u32) -> String {
    format!("== S({point}) à {chiffres} chiffres ==")
}
